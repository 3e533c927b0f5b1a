/// Represents a food order tracked through its delivery lifecycle.
///
/// # Actor Store
/// [`Order`] implements [`StoredEntity`](actor_store::StoredEntity) (see [`crate::store`]),
/// so it is persisted by a [`StoreActor`](actor_store::StoreActor). The only update the store
/// accepts is a [`StatusTransition`], and only when the stored status matches its `expected`.
///
/// # Wire format
/// Orders serialize with camelCase keys and a SCREAMING_SNAKE_CASE status:
///
/// ```json
/// {"orderId": "…", "item": "Chicken Biryani", "restaurant": "Paradise",
///  "customerName": "Mobile User", "status": "PREPARING", "createdAt": "…"}
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Name recorded when a request carries no customer name.
pub const DEFAULT_CUSTOMER_NAME: &str = "Guest";

/// Type-safe identifier for Orders. Random (UUID v4), assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status. `Preparing` is the initial state; `OutForDelivery` is terminal here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Preparing,
    OutForDelivery,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::OutForDelivery => write!(f, "OUT_FOR_DELIVERY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub item: String,
    pub restaurant: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in the `Preparing` state, stamped with the current time.
    pub fn new(
        order_id: OrderId,
        item: impl Into<String>,
        restaurant: impl Into<String>,
        customer_name: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            item: item.into(),
            restaurant: restaurant.into(),
            customer_name: customer_name.into(),
            status: OrderStatus::Preparing,
            created_at: Utc::now(),
        }
    }
}

/// Order-creation payload as submitted by a client.
///
/// Every field is optional at the parsing stage so that a missing field becomes a
/// validation error with a useful message rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRequest {
    pub item: Option<String>,
    pub restaurant: Option<String>,
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
}

/// Compare-and-swap on an order's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub expected: OrderStatus,
    pub new: OrderStatus,
}

impl StatusTransition {
    /// The single transition of the lifecycle: `PREPARING → OUT_FOR_DELIVERY`.
    pub const DISPATCH: StatusTransition = StatusTransition {
        expected: OrderStatus::Preparing,
        new: OrderStatus::OutForDelivery,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_serializes_camel_case() {
        let id = OrderId::new();
        let order = Order::new(id, "Chicken Biryani", "Paradise", "Mobile User");
        let value = serde_json::to_value(&order).unwrap();

        assert_eq!(value["orderId"], json!(id.to_string()));
        assert_eq!(value["customerName"], json!("Mobile User"));
        assert_eq!(value["status"], json!("PREPARING"));
        assert!(value["createdAt"].is_string());
    }

    #[test]
    fn test_status_display_matches_wire_format() {
        for status in [OrderStatus::Preparing, OrderStatus::OutForDelivery] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, json!(status.to_string()));
        }
    }

    #[test]
    fn test_order_id_parses_back() {
        let id = OrderId::new();
        assert_eq!(id.to_string().parse::<OrderId>().unwrap(), id);
        assert!("not-a-uuid".parse::<OrderId>().is_err());
    }

    #[test]
    fn test_request_tolerates_missing_fields() {
        let request: OrderRequest = serde_json::from_value(json!({"item": "Dosa"})).unwrap();
        assert_eq!(request.item.as_deref(), Some("Dosa"));
        assert!(request.restaurant.is_none());
        assert!(request.customer_name.is_none());
    }
}
