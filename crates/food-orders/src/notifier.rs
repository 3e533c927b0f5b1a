//! # Notification Dispatcher
//!
//! Tells external subscribers that an order has changed status. Publishing is decoupled from
//! the store: by the time [`NotificationDispatcher::notify`] runs, the transition is already
//! committed, and nothing that happens here can undo it.
//!
//! The transport is abstracted behind [`Publisher`]:
//! - [`InMemoryTopic`] fans out to in-process `broadcast` subscribers and keeps a record of
//!   every message (used by tests and by anyone embedding the pipeline).
//! - [`LogPublisher`] writes messages to the log; the binary's default.

use crate::error::NotificationError;
use crate::model::Order;
use crate::retry::{retry, RetryPolicy};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

/// A message published to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    pub subject: String,
    pub body: String,
}

/// Publish-to-topic primitive.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Topic kept in process: every published message is broadcast and recorded.
#[derive(Clone)]
pub struct InMemoryTopic {
    sender: broadcast::Sender<Notification>,
    published: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryTopic {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers a new subscriber. Only messages published afterwards are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Every message published so far, in publish order.
    pub fn published(&self) -> Vec<Notification> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Publisher for InMemoryTopic {
    async fn publish(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification.clone());
        // No live subscriber is fine; the message is still recorded
        let _ = self.sender.send(notification.clone());
        Ok(())
    }
}

/// Publisher that only logs.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            topic = %notification.topic,
            subject = %notification.subject,
            body = %notification.body,
            "Notification published"
        );
        Ok(())
    }
}

/// Builds and publishes the "status changed" message for an order.
#[derive(Clone)]
pub struct NotificationDispatcher {
    publisher: Arc<dyn Publisher>,
    topic: String,
    retry_policy: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            retry_policy,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The message announcing `order`'s current status.
    pub fn message_for(&self, order: &Order) -> Notification {
        Notification {
            topic: self.topic.clone(),
            subject: format!("Order {} update", order.order_id),
            body: format!(
                "Your order {} ({} from {}) is now {}.",
                order.order_id, order.item, order.restaurant, order.status
            ),
        }
    }

    /// Publishes the status message, retrying on failure with this dispatcher's own policy.
    ///
    /// Delivery is at-least-once: a publish that failed after the transport accepted the
    /// message may be retried and delivered twice.
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn notify(&self, order: &Order) -> Result<(), NotificationError> {
        let notification = self.message_for(order);
        let result = retry("publish", &self.retry_policy, |_| true, || {
            self.publisher.publish(&notification)
        })
        .await;

        if let Err(e) = &result {
            error!(topic = %self.topic, error = %e, "Notification dropped after retries");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderId, OrderStatus};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` publishes, then delegates to an in-memory topic.
    struct FlakyPublisher {
        failures: u32,
        calls: AtomicU32,
        topic: InMemoryTopic,
    }

    #[async_trait]
    impl Publisher for FlakyPublisher {
        async fn publish(&self, notification: &Notification) -> Result<(), NotificationError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(NotificationError::Publish {
                    topic: notification.topic.clone(),
                    reason: "connection reset".into(),
                });
            }
            self.topic.publish(notification).await
        }
    }

    fn shipped_order() -> Order {
        let mut order = Order::new(OrderId::new(), "Masala Dosa", "Udupi", "Guest");
        order.status = OrderStatus::OutForDelivery;
        order
    }

    fn quick_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(attempts)
            .with_initial_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_message_references_order_and_status() {
        let dispatcher =
            NotificationDispatcher::new(Arc::new(LogPublisher), "order-updates", quick_retry(1));
        let order = shipped_order();
        let message = dispatcher.message_for(&order);

        assert_eq!(message.topic, "order-updates");
        assert!(message.subject.contains(&order.order_id.to_string()));
        assert!(message.body.contains(&order.order_id.to_string()));
        assert!(message.body.contains("OUT_FOR_DELIVERY"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_notification() {
        let topic = InMemoryTopic::new(16);
        let mut subscriber = topic.subscribe();
        let dispatcher =
            NotificationDispatcher::new(Arc::new(topic.clone()), "order-updates", quick_retry(1));

        let order = shipped_order();
        dispatcher.notify(&order).await.unwrap();

        let received = subscriber.recv().await.unwrap();
        assert!(received.body.contains(&order.order_id.to_string()));
        assert_eq!(topic.published().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_is_retried_independently() {
        let topic = InMemoryTopic::new(16);
        let publisher = Arc::new(FlakyPublisher {
            failures: 2,
            calls: AtomicU32::new(0),
            topic: topic.clone(),
        });
        let dispatcher = NotificationDispatcher::new(publisher.clone(), "t", quick_retry(3));

        dispatcher.notify(&shipped_order()).await.unwrap();
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(topic.published().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_publish_returns_error() {
        let topic = InMemoryTopic::new(16);
        let publisher = Arc::new(FlakyPublisher {
            failures: 10,
            calls: AtomicU32::new(0),
            topic: topic.clone(),
        });
        let dispatcher = NotificationDispatcher::new(publisher, "t", quick_retry(2));

        let result = dispatcher.notify(&shipped_order()).await;
        assert!(matches!(result, Err(NotificationError::Publish { .. })));
        assert!(topic.published().is_empty());
    }
}
