use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use food_orders::config::Config;
use food_orders::lifecycle::OrderPipeline;
use food_orders::model::OrderStatus;
use food_orders::notifier::InMemoryTopic;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const DELAY: Duration = Duration::from_secs(10);

fn start() -> (OrderPipeline, InMemoryTopic) {
    let topic = InMemoryTopic::new(256);
    let pipeline = OrderPipeline::start(&Config::default(), Arc::new(topic.clone()));
    (pipeline, topic)
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Body>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(body).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn post_order(router: &Router, payload: Value) -> (StatusCode, Value) {
    call(
        router,
        Method::POST,
        "/order",
        Some(Body::from(payload.to_string())),
    )
    .await
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(start_paused = true)]
async fn test_chicken_biryani_end_to_end() {
    let (pipeline, topic) = start();
    let mut subscriber = topic.subscribe();
    let router = pipeline.router();

    let (status, body) = post_order(
        &router,
        json!({
            "item": "Chicken Biryani",
            "restaurant": "Paradise",
            "customer_name": "Mobile User"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order placed successfully");
    assert_eq!(body["order"]["status"], "PREPARING");
    assert_eq!(body["order"]["customerName"], "Mobile User");
    let id = body["order"]["orderId"].as_str().unwrap().to_string();

    let (status, body) = call(&router, Method::GET, &format!("/order/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PREPARING");

    tokio::time::sleep(DELAY + Duration::from_secs(1)).await;

    let (status, body) = call(&router, Method::GET, &format!("/order/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OUT_FOR_DELIVERY");
    assert_eq!(body["item"], "Chicken Biryani");

    let notification = subscriber.recv().await.unwrap();
    assert!(notification.body.contains(&id));
    assert!(notification.body.contains("OUT_FOR_DELIVERY"));
    assert_eq!(topic.published().len(), 1);

    drop(router);
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_without_storing() {
    let (pipeline, topic) = start();
    let router = pipeline.router();

    let (status, body) = post_order(&router, json!({"restaurant": "Paradise"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = post_order(&router, json!({"item": "", "restaurant": "Paradise"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &router,
        Method::POST,
        "/order",
        Some(Body::from("{\"item\": \"Dosa\"")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    assert_eq!(pipeline.store.head(), 0);
    assert!(topic.published().is_empty());

    drop(router);
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (pipeline, _topic) = start();
    let router = pipeline.router();

    let (status, body) = call(
        &router,
        Method::GET,
        &format!("/order/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = call(&router, Method::GET, "/order/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));

    drop(router);
    pipeline.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hundred_concurrent_orders_each_transition_once() {
    let (pipeline, topic) = start();
    let router = pipeline.router();

    let mut requests = tokio::task::JoinSet::new();
    for i in 0..100 {
        let router = router.clone();
        requests.spawn(async move {
            let (status, body) = post_order(
                &router,
                json!({"item": format!("Thali #{i}"), "restaurant": "Saravana Bhavan"}),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["order"]["customerName"], "Guest");
            body["order"]["orderId"].as_str().unwrap().to_string()
        });
    }

    let mut ids = HashSet::new();
    while let Some(id) = requests.join_next().await {
        assert!(ids.insert(id.unwrap()), "order ids must be distinct");
    }
    assert_eq!(ids.len(), 100);

    let stats = pipeline.stats().clone();
    wait_until(|| stats.snapshot().transitioned == 100).await;

    for id in &ids {
        let order = pipeline.store.get_order(id.parse().unwrap()).await.unwrap();
        assert_eq!(order.status, OrderStatus::OutForDelivery);
    }

    let notified: HashSet<String> = topic
        .published()
        .iter()
        .map(|n| n.subject.clone())
        .collect();
    assert_eq!(topic.published().len(), 100);
    assert_eq!(notified.len(), 100);
    assert_eq!(stats.snapshot().failed, 0);

    drop(router);
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_checkpoint_file_tracks_handled_events() {
    let dir = std::env::temp_dir().join(format!("food-orders-{}", uuid::Uuid::new_v4()));
    let path = dir.join("orders.checkpoint");
    let config = Config {
        checkpoint_path: Some(path.clone()),
        preparation_delay: Duration::from_millis(20),
        ..Config::default()
    };
    let topic = InMemoryTopic::new(16);
    let pipeline = OrderPipeline::start(&config, Arc::new(topic.clone()));

    let router = pipeline.router();
    let (status, _) = post_order(&router, json!({"item": "Pongal", "restaurant": "Murugan"})).await;
    assert_eq!(status, StatusCode::CREATED);
    drop(router);

    // INSERT then the worker's own UPDATE
    wait_until(|| {
        std::fs::read_to_string(&path)
            .map(|content| content.trim() == "2")
            .unwrap_or(false)
    })
    .await;
    assert_eq!(topic.published().len(), 1);

    pipeline.shutdown().await.unwrap();
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_leftover_checkpoint_file_does_not_stall_new_orders() {
    let dir = std::env::temp_dir().join(format!("food-orders-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("orders.checkpoint");
    // Written by an earlier process; this one starts with an empty store
    std::fs::write(&path, "5\n").unwrap();

    let config = Config {
        checkpoint_path: Some(path.clone()),
        preparation_delay: Duration::from_millis(20),
        ..Config::default()
    };
    let topic = InMemoryTopic::new(16);
    let pipeline = OrderPipeline::start(&config, Arc::new(topic.clone()));

    let router = pipeline.router();
    let (status, body) = post_order(&router, json!({"item": "Upma", "restaurant": "MTR"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["order"]["orderId"].as_str().unwrap().to_string();

    let stats = pipeline.stats().clone();
    wait_until(|| stats.snapshot().transitioned == 1).await;
    let (status, body) = call(&router, Method::GET, &format!("/order/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OUT_FOR_DELIVERY");
    assert_eq!(topic.published().len(), 1);

    wait_until(|| {
        std::fs::read_to_string(&path)
            .map(|content| content.trim() == "2")
            .unwrap_or(false)
    })
    .await;

    drop(router);
    pipeline.shutdown().await.unwrap();
    let _ = std::fs::remove_dir_all(dir);
}
