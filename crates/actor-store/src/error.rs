//! # Store Errors
//!
//! This module defines the error type shared by the store actor, its clients and the
//! change feed. Domain crates map these into their own error enums.

/// Errors that can occur within the store itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameworkError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    /// The store could not serve the request right now; the caller may retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl FrameworkError {
    /// Returns `true` for failures that may succeed if the same request is sent again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FrameworkError::ActorClosed
                | FrameworkError::ActorDropped
                | FrameworkError::Unavailable(_)
        )
    }
}
