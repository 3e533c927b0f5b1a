//! # Order Store
//!
//! Persistence of [`Order`] records in a [`StoreActor`], plus the [`OrderStore`] client that
//! gives the rest of the pipeline the four operations it needs: `insert`, `get`,
//! `conditional_update` and `subscribe`.

use crate::error::OrderError;
use crate::model::{Order, OrderId, OrderStatus, StatusTransition};
use actor_store::{EntityClient, Feed, FrameworkError, StoreActor, StoreClient, StoredEntity};
use async_trait::async_trait;
use tracing::{debug, instrument};

impl StoredEntity for Order {
    type Id = OrderId;
    type Update = StatusTransition;

    fn id(&self) -> &OrderId {
        &self.order_id
    }

    fn precondition_holds(&self, update: &StatusTransition) -> bool {
        self.status == update.expected
    }

    fn apply(&mut self, update: StatusTransition) {
        self.status = update.new;
    }
}

/// Creates a new Order store actor and its client.
pub fn new(table: &str) -> (StoreActor<Order>, OrderStore) {
    let (actor, generic_client) = StoreActor::new(table, 256);
    (actor, OrderStore::new(generic_client))
}

/// Client for the orders table.
#[derive(Clone)]
pub struct OrderStore {
    inner: StoreClient<Order>,
}

impl OrderStore {
    pub fn new(inner: StoreClient<Order>) -> Self {
        Self { inner }
    }

    /// Persists a new order. Fails with [`OrderError::DuplicateKey`] if the id is taken.
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn insert(&self, order: Order) -> Result<u64, OrderError> {
        debug!("Sending insert");
        self.inner.insert(order).await.map_err(OrderError::from)
    }

    /// Returns the current record or [`OrderError::NotFound`].
    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Moves `id` from `expected` to `new` atomically. A missing record or a record in any
    /// other status yields [`OrderError::PreconditionFailed`].
    #[instrument(skip(self))]
    pub async fn conditional_update(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<Order, OrderError> {
        debug!("Sending conditional update");
        self.inner
            .update_if(id, StatusTransition { expected, new })
            .await
            .map_err(|e| match e {
                FrameworkError::NotFound(id) => OrderError::PreconditionFailed(id),
                other => OrderError::from(other),
            })
    }

    /// Sequence of the latest write to the table (0 before the first one).
    pub fn head(&self) -> u64 {
        self.inner.head()
    }

    /// Opens the orders change feed after `checkpoint`.
    pub fn feed(&self, checkpoint: u64, batch_size: usize) -> Feed<Order> {
        self.subscribe(checkpoint, batch_size)
    }
}

#[async_trait]
impl EntityClient<Order> for OrderStore {
    type Error = OrderError;

    fn inner(&self) -> &StoreClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        OrderError::from(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_store::mock::MockClient;
    use actor_store::ChangeKind;

    fn biryani() -> Order {
        Order::new(OrderId::new(), "Chicken Biryani", "Paradise", "Mobile User")
    }

    #[tokio::test]
    async fn test_insert_then_dispatch_once() {
        let (actor, store) = new("orders");
        tokio::spawn(actor.run());

        let order = biryani();
        let id = order.order_id;
        store.insert(order).await.unwrap();

        let moved = store
            .conditional_update(id, OrderStatus::Preparing, OrderStatus::OutForDelivery)
            .await
            .unwrap();
        assert_eq!(moved.status, OrderStatus::OutForDelivery);

        let again = store
            .conditional_update(id, OrderStatus::Preparing, OrderStatus::OutForDelivery)
            .await;
        assert!(matches!(again, Err(OrderError::PreconditionFailed(_))));
        assert_eq!(
            store.get_order(id).await.unwrap().status,
            OrderStatus::OutForDelivery
        );
    }

    #[tokio::test]
    async fn test_get_unknown_order_is_not_found() {
        let (actor, store) = new("orders");
        tokio::spawn(actor.run());

        let id = OrderId::new();
        assert_eq!(
            store.get_order(id).await,
            Err(OrderError::NotFound(id.to_string()))
        );
    }

    #[tokio::test]
    async fn test_conditional_update_on_missing_order() {
        let (actor, store) = new("orders");
        tokio::spawn(actor.run());

        let result = store
            .conditional_update(
                OrderId::new(),
                OrderStatus::Preparing,
                OrderStatus::OutForDelivery,
            )
            .await;
        assert!(matches!(result, Err(OrderError::PreconditionFailed(_))));
    }

    #[tokio::test]
    async fn test_feed_sees_insert_then_update() {
        let (actor, store) = new("orders");
        tokio::spawn(actor.run());

        let order = biryani();
        let id = order.order_id;
        store.insert(order).await.unwrap();
        store
            .conditional_update(id, OrderStatus::Preparing, OrderStatus::OutForDelivery)
            .await
            .unwrap();

        let events = store.feed(0, 10).next_batch().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ChangeKind::Insert);
        assert_eq!(events[0].new_image.status, OrderStatus::Preparing);
        assert_eq!(events[1].kind, ChangeKind::Update);
        assert_eq!(events[1].new_image.order_id, id);
    }

    #[tokio::test]
    async fn test_store_outage_maps_to_transient_error() {
        let mut mock = MockClient::<Order>::new();
        let id = OrderId::new();
        mock.expect_update_if(id)
            .return_err(FrameworkError::Unavailable("throttled".into()));

        let store = OrderStore::new(mock.client());
        let result = store
            .conditional_update(id, OrderStatus::Preparing, OrderStatus::OutForDelivery)
            .await;

        assert!(result.unwrap_err().is_transient());
        mock.verify();
    }
}
