//! # Store Actor
//!
//! This module defines the `StoreActor`, the task that owns every record of one table and
//! the table's change log. It implements the "Server" side of the Actor Model, processing
//! requests sequentially and ensuring exclusive access to its state.

use crate::client::StoreClient;
use crate::entity::StoredEntity;
use crate::error::FrameworkError;
use crate::feed::{ChangeEvent, ChangeKind};
use crate::message::StoreRequest;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The actor that manages one table of records plus its change feed.
///
/// # Architecture Note
/// This struct is the "Server" half of the store. It owns the records, the append-only
/// change log and the receiver end of the request channel.
///
/// **Concurrency Model**:
/// Requests are processed *sequentially* in a loop, so the conditional check and the
/// write of an `UpdateIf` can never interleave with another writer. No `Mutex` is needed:
/// the actor has exclusive ownership of its state within the task.
///
/// **Change Feed**:
/// Every successful `Insert` or `UpdateIf` appends exactly one [`ChangeEvent`] to the log
/// and publishes the new head sequence on a `watch` channel. Subscribers wake up on that
/// signal and read the log from their own cursor, so the feed is replayable from any
/// checkpoint.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `StoreActor::new()` to get the `actor` (server) and `client` (interface).
/// 2.  **Run**: Spawn the actor's run loop in a background task.
/// 3.  **Use**: Clone the client wherever the table is needed.
///
/// ```rust
/// use actor_store::{StoreActor, StoredEntity};
///
/// #[derive(Clone, Debug)] struct Note { id: u32, text: String }
/// #[derive(Debug)] struct Rewrite { from: String, to: String }
///
/// impl StoredEntity for Note {
///     type Id = u32;
///     type Update = Rewrite;
///     fn id(&self) -> &u32 { &self.id }
///     fn precondition_holds(&self, u: &Rewrite) -> bool { self.text == u.from }
///     fn apply(&mut self, u: Rewrite) { self.text = u.to; }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = StoreActor::<Note>::new("notes", 10);
///     tokio::spawn(actor.run());
///
///     client.insert(Note { id: 1, text: "draft".into() }).await.unwrap();
///     let note = client
///         .update_if(1, Rewrite { from: "draft".into(), to: "final".into() })
///         .await
///         .unwrap();
///     assert_eq!(note.text, "final");
/// }
/// ```
pub struct StoreActor<T: StoredEntity> {
    table: String,
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: HashMap<T::Id, T>,
    log: Vec<ChangeEvent<T>>,
    head: watch::Sender<u64>,
}

impl<T: StoredEntity> StoreActor<T> {
    /// Creates a new `StoreActor` and its associated `StoreClient`.
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table, used as a log label.
    /// * `buffer_size` - The capacity of the MPSC channel. If the channel is full,
    ///   calls to the client will wait until there is space.
    pub fn new(table: impl Into<String>, buffer_size: usize) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (head, head_rx) = watch::channel(0);
        let actor = Self {
            table: table.into(),
            receiver,
            records: HashMap::new(),
            log: Vec::new(),
            head,
        };
        let client = StoreClient::new(sender, head_rx);
        (actor, client)
    }

    /// Runs the actor's event loop, processing requests until every client is dropped.
    pub async fn run(mut self) {
        let table = self.table.clone();
        info!(%table, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Insert { item, respond_to } => {
                    let id = item.id().clone();
                    debug!(%table, %id, "Insert");
                    if self.records.contains_key(&id) {
                        warn!(%table, %id, "Duplicate key");
                        let _ = respond_to.send(Err(FrameworkError::DuplicateKey(id.to_string())));
                        continue;
                    }
                    self.records.insert(id.clone(), item.clone());
                    let seq = self.append(ChangeKind::Insert, item, None);
                    info!(%table, %id, seq, size = self.records.len(), "Inserted");
                    let _ = respond_to.send(Ok(seq));
                }
                StoreRequest::Get { id, respond_to } => {
                    let item = self.records.get(&id).cloned();
                    let found = item.is_some();
                    debug!(%table, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                StoreRequest::UpdateIf {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(%table, %id, ?update, "UpdateIf");
                    let Some(item) = self.records.get_mut(&id) else {
                        warn!(%table, %id, "Conditional update on missing record");
                        let _ = respond_to.send(Err(FrameworkError::PreconditionFailed(format!(
                            "{id} does not exist"
                        ))));
                        continue;
                    };
                    if !item.precondition_holds(&update) {
                        debug!(%table, %id, "Precondition failed");
                        let _ = respond_to.send(Err(FrameworkError::PreconditionFailed(
                            id.to_string(),
                        )));
                        continue;
                    }
                    let old_image = item.clone();
                    item.apply(update);
                    let new_image = item.clone();
                    let seq = self.append(ChangeKind::Update, new_image.clone(), Some(old_image));
                    info!(%table, %id, seq, "Updated");
                    let _ = respond_to.send(Ok(new_image));
                }
                StoreRequest::ReadFeed {
                    after,
                    limit,
                    respond_to,
                } => {
                    let events: Vec<_> = self
                        .log
                        .iter()
                        .skip(usize::try_from(after).unwrap_or(usize::MAX))
                        .take(limit)
                        .cloned()
                        .collect();
                    debug!(%table, after, returned = events.len(), "ReadFeed");
                    let _ = respond_to.send(Ok(events));
                }
            }
        }

        info!(%table, size = self.records.len(), events = self.log.len(), "Shutdown");
    }

    /// Appends one event to the log and advances the head. Sequences start at 1.
    fn append(&mut self, kind: ChangeKind, new_image: T, old_image: Option<T>) -> u64 {
        let sequence = self.log.len() as u64 + 1;
        self.log.push(ChangeEvent {
            sequence,
            kind,
            new_image,
            old_image,
        });
        self.head.send_replace(sequence);
        sequence
    }
}
