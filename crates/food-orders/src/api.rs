//! HTTP ingress for web and mobile clients.
//!
//! | Method | Path | Success | Errors |
//! |--------|------|---------|--------|
//! | `POST` | `/order` | `201` `{message, order}` | `400` bad payload, `503` store unavailable |
//! | `GET` | `/order/{orderId}` | `200` order | `404` unknown id |
//! | `GET` | `/health` | `200` `ok` | – |

use crate::error::OrderError;
use crate::ingress::OrderIngress;
use crate::model::{Order, OrderId, OrderRequest};
use crate::store::OrderStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, warn};

/// Shared handles for the handlers.
#[derive(Clone)]
pub struct ApiState {
    pub ingress: OrderIngress,
    pub store: OrderStore,
}

/// Builds the router with every endpoint.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/order", post(create_order))
        .route("/order/:order_id", get(get_order))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub message: String,
    pub order: Order,
}

async fn health() -> &'static str {
    "ok"
}

async fn create_order(
    State(state): State<ApiState>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreated>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let order = state.ingress.create_order(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            message: "Order placed successfully".to_string(),
            order,
        }),
    ))
}

async fn get_order(
    State(state): State<ApiState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    // A string that is not a UUID names no order
    let id: OrderId = order_id
        .parse()
        .map_err(|_| ApiError::from(OrderError::NotFound(order_id.clone())))?;
    let order = state.store.get_order(id).await?;
    Ok(Json(order))
}

/// Error response: a status code plus `{"error": …, "code": …}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            code: "BAD_REQUEST",
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        let (status, code) = match &e {
            OrderError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            OrderError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            OrderError::DuplicateKey(_) => (StatusCode::CONFLICT, "CONFLICT"),
            OrderError::TransientStore(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            OrderError::PreconditionFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
        };
        Self {
            status,
            message: e.to_string(),
            code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = %self.status,
                code = self.code,
                error = %self.message,
                "Request failed"
            );
        } else {
            warn!(
                status = %self.status,
                code = self.code,
                error = %self.message,
                "Request rejected"
            );
        }
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}
