//! # Order Ingress
//!
//! Turns a client payload into a persisted [`Order`].

use crate::error::OrderError;
use crate::model::{Order, OrderId, OrderRequest, DEFAULT_CUSTOMER_NAME};
use crate::store::OrderStore;
use tracing::{info, instrument, warn};

/// Validates order requests and writes the initial record.
#[derive(Clone)]
pub struct OrderIngress {
    store: OrderStore,
}

impl OrderIngress {
    pub fn new(store: OrderStore) -> Self {
        Self { store }
    }

    /// Creates an order in `PREPARING` with a fresh id and returns the stored record.
    ///
    /// `item` and `restaurant` must be present and non-blank. A missing or blank customer
    /// name is recorded as [`DEFAULT_CUSTOMER_NAME`]. Surrounding whitespace is trimmed.
    #[instrument(skip(self, request))]
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order, OrderError> {
        let item = required("item", request.item)?;
        let restaurant = required("restaurant", request.restaurant)?;
        let customer_name = request
            .customer_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string());

        let order = Order::new(OrderId::new(), item, restaurant, customer_name);
        let sequence = self.store.insert(order.clone()).await?;
        info!(order_id = %order.order_id, seq = sequence, "Order placed");
        Ok(order)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, OrderError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            warn!(field, "Rejected order request");
            Err(OrderError::Validation(format!("'{field}' is required")))
        }
    }
}
