//! # Store Messages
//!
//! This module defines the request type sent from a [`StoreClient`](crate::StoreClient)
//! to the [`StoreActor`](crate::StoreActor).

use crate::entity::StoredEntity;
use crate::error::FrameworkError;
use crate::feed::ChangeEvent;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// - **Insert**: Persists a new record under its own id. Answers with the feed sequence
///   number assigned to the write.
/// - **Get**: Point read of the current record.
/// - **UpdateIf**: Conditional write. Applied only if the entity's precondition holds.
/// - **ReadFeed**: Reads change events strictly after a cursor.
#[derive(Debug)]
pub enum StoreRequest<T: StoredEntity> {
    Insert {
        item: T,
        respond_to: Response<u64>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    UpdateIf {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    ReadFeed {
        after: u64,
        limit: usize,
        respond_to: Response<Vec<ChangeEvent<T>>>,
    },
}
