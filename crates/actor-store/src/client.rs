//! # Store Client
//!
//! This module defines the cloneable handle used to talk to a [`StoreActor`](crate::StoreActor).

use crate::entity::StoredEntity;
use crate::error::FrameworkError;
use crate::feed::{ChangeEvent, Feed};
use crate::message::StoreRequest;
use tokio::sync::{mpsc, oneshot, watch};

/// A type-safe client for interacting with a `StoreActor`.
///
/// The client forwards requests over a Tokio mpsc channel and receives answers on oneshot
/// channels. It also carries a `watch` receiver for the head of the change log, which is
/// what lets a [`Feed`] wait for new events without polling.
///
/// * **Cloneable** – holds only channel handles, so cloning is inexpensive.
/// * **Async API** – all methods resolve to `Result<…, FrameworkError>`.
#[derive(Clone)]
pub struct StoreClient<T: StoredEntity> {
    sender: mpsc::Sender<StoreRequest<T>>,
    head: watch::Receiver<u64>,
}

impl<T: StoredEntity> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>, head: watch::Receiver<u64>) -> Self {
        Self { sender, head }
    }

    /// Persists a new record. Returns the feed sequence of the resulting `Insert` event.
    pub async fn insert(&self, item: T) -> Result<u64, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Insert { item, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Get { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Applies `update` only if the entity's precondition holds. Returns the new record.
    pub async fn update_if(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::UpdateIf {
                id,
                update,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Reads up to `limit` change events with a sequence strictly greater than `after`.
    pub async fn read_feed(
        &self,
        after: u64,
        limit: usize,
    ) -> Result<Vec<ChangeEvent<T>>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::ReadFeed {
                after,
                limit,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Sequence number of the latest event written so far (0 when the log is empty).
    pub fn head(&self) -> u64 {
        *self.head.borrow()
    }

    /// Opens a feed that yields every event after `from`.
    pub fn subscribe(&self, from: u64, batch_size: usize) -> Feed<T> {
        Feed::new(self.clone(), self.head.clone(), from, batch_size)
    }
}
