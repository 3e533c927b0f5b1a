//! # EntityClient Trait
//!
//! Provides a common interface for table-specific clients, adding default `get` and
//! `subscribe` methods built on top of a generic `StoreClient`.
use crate::{Feed, FrameworkError, StoreClient, StoredEntity};
use async_trait::async_trait;

/// Trait for table-specific clients to inherit the standard read operations.
///
/// # Example
///
/// ```rust
/// use actor_store::{EntityClient, FrameworkError, StoreClient, StoredEntity};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Tag { id: u32 }
/// impl StoredEntity for Tag {
///     type Id = u32;
///     type Update = ();
///     fn id(&self) -> &u32 { &self.id }
///     fn precondition_holds(&self, _: &()) -> bool { true }
///     fn apply(&mut self, _: ()) {}
/// }
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("tag error: {0}")]
/// struct TagError(String);
///
/// struct TagClient { inner: StoreClient<Tag> }
///
/// #[async_trait]
/// impl EntityClient<Tag> for TagClient {
///     type Error = TagError;
///     fn inner(&self) -> &StoreClient<Tag> { &self.inner }
///     fn map_error(e: FrameworkError) -> TagError { TagError(e.to_string()) }
/// }
///
/// async fn usage(client: TagClient) {
///     // get() and subscribe() are provided automatically
///     let _ = client.get(1).await;
///     let _feed = client.subscribe(0, 16);
/// }
/// ```
#[async_trait]
pub trait EntityClient<T: StoredEntity>: Send + Sync {
    /// The table-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic StoreClient.
    fn inner(&self) -> &StoreClient<T>;

    /// Map store errors to the table-specific error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a record by id.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Open a change feed positioned after `from`.
    fn subscribe(&self, from: u64, batch_size: usize) -> Feed<T> {
        self.inner().subscribe(from, batch_size)
    }
}
