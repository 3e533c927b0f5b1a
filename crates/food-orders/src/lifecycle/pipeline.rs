use crate::api::{build_router, ApiState};
use crate::checkpoint::{Checkpoint, FileCheckpoint, MemoryCheckpoint};
use crate::config::Config;
use crate::ingress::OrderIngress;
use crate::notifier::{NotificationDispatcher, Publisher};
use crate::store::{self, OrderStore};
use crate::worker::{TransitionWorker, WorkerHandle, WorkerStats};
use axum::Router;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running order pipeline: store actor, transition worker and the handles to reach them.
///
/// # Example
///
/// ```rust
/// use food_orders::config::Config;
/// use food_orders::lifecycle::OrderPipeline;
/// use food_orders::model::OrderRequest;
/// use food_orders::notifier::InMemoryTopic;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let topic = InMemoryTopic::new(16);
///     let pipeline = OrderPipeline::start(&Config::default(), Arc::new(topic));
///
///     let order = pipeline
///         .ingress
///         .create_order(OrderRequest {
///             item: Some("Chicken Biryani".into()),
///             restaurant: Some("Paradise".into()),
///             customer_name: None,
///         })
///         .await
///         .unwrap();
///     assert_eq!(order.customer_name, "Guest");
///
///     pipeline.shutdown().await.unwrap();
/// }
/// ```
pub struct OrderPipeline {
    /// Order creation entry point
    pub ingress: OrderIngress,

    /// Direct access to the orders table
    pub store: OrderStore,

    worker: WorkerHandle,
    store_handle: JoinHandle<()>,
}

impl OrderPipeline {
    /// Spawns the store actor and the transition worker.
    ///
    /// The worker loads its checkpoint from `FEED_CHECKPOINT_PATH` when configured and from
    /// memory otherwise, then starts consuming the feed.
    pub fn start(config: &Config, publisher: Arc<dyn Publisher>) -> Self {
        let (store_actor, store) = store::new(&config.orders_table);
        let store_handle = tokio::spawn(store_actor.run());

        let checkpoint: Arc<dyn Checkpoint> = match &config.checkpoint_path {
            Some(path) => Arc::new(FileCheckpoint::new(path)),
            None => Arc::new(MemoryCheckpoint::new()),
        };
        let dispatcher = NotificationDispatcher::new(
            publisher,
            config.order_topic.clone(),
            config.notify_retry(),
        );
        let worker = TransitionWorker::new(
            store.clone(),
            dispatcher,
            checkpoint,
            config.worker_settings(),
        )
        .spawn();

        info!(
            table = %config.orders_table,
            topic = %config.order_topic,
            delay_ms = config.preparation_delay.as_millis() as u64,
            "Order pipeline started"
        );

        Self {
            ingress: OrderIngress::new(store.clone()),
            store,
            worker,
            store_handle,
        }
    }

    /// The HTTP application serving this pipeline.
    pub fn router(&self) -> Router {
        build_router(ApiState {
            ingress: self.ingress.clone(),
            store: self.store.clone(),
        })
    }

    pub fn stats(&self) -> &WorkerStats {
        self.worker.stats()
    }

    /// Stops the worker, then the store.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the store actor shut down cleanly
    /// - `Err(String)` if its task failed or panicked
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down order pipeline...");

        self.worker.stop().await;

        drop(self.ingress);
        drop(self.store);

        if let Err(e) = self.store_handle.await {
            error!(error = %e, "Store actor task failed");
            return Err(format!("Store actor task failed: {e}"));
        }

        info!("Order pipeline shutdown complete.");
        Ok(())
    }
}
