//! Error types for the order pipeline.

use actor_store::FrameworkError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The client payload is missing a required field.
    #[error("Order validation error: {0}")]
    Validation(String),

    /// No order exists under the requested id.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// An order already exists under a freshly generated id.
    #[error("Duplicate order id: {0}")]
    DuplicateKey(String),

    /// A conditional update found the order in an unexpected state (or missing).
    #[error("Order precondition failed: {0}")]
    PreconditionFailed(String),

    /// The store could not be reached or refused the request for now.
    #[error("Order store unavailable: {0}")]
    TransientStore(String),
}

impl OrderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderError::TransientStore(_))
    }
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::DuplicateKey(id) => OrderError::DuplicateKey(id),
            FrameworkError::PreconditionFailed(id) => OrderError::PreconditionFailed(id),
            other => OrderError::TransientStore(other.to_string()),
        }
    }
}

/// Errors raised while publishing a notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Publish to topic {topic} failed: {reason}")]
    Publish { topic: String, reason: String },
}
