//! # Change Feed
//!
//! Every write accepted by a [`StoreActor`](crate::StoreActor) is recorded as a
//! [`ChangeEvent`] in an append-only log. A [`Feed`] is a consumer's view of that log:
//! a cursor plus a way to wait for the log to grow.
//!
//! ## Cursors
//!
//! Sequence numbers start at 1 and grow by one per write. A cursor `c` means "I have seen
//! everything up to and including `c`", so a new feed opened at cursor `0` replays the whole
//! log. Consumers persist the cursor as their checkpoint and reopen the feed from it after a
//! restart, which is why delivery is *at-least-once*: anything processed after the last saved
//! checkpoint is delivered again.
//!
//! ## Shutdown
//!
//! A `Feed` holds a [`StoreClient`], so the store stays alive while any feed is open. Drop
//! the feed before waiting for the store actor to finish.

use crate::client::StoreClient;
use crate::entity::StoredEntity;
use crate::error::FrameworkError;
use tokio::sync::watch;
use tracing::trace;

/// The kind of write that produced a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

/// One entry of the change log.
#[derive(Debug, Clone)]
pub struct ChangeEvent<T> {
    pub sequence: u64,
    pub kind: ChangeKind,
    /// The record as it was stored by this write.
    pub new_image: T,
    /// The record before the write. Always `None` for inserts.
    pub old_image: Option<T>,
}

/// A lazy, unbounded, replayable subscription to a store's change log.
pub struct Feed<T: StoredEntity> {
    client: StoreClient<T>,
    head: watch::Receiver<u64>,
    cursor: u64,
    batch_size: usize,
}

impl<T: StoredEntity> Feed<T> {
    pub(crate) fn new(
        client: StoreClient<T>,
        head: watch::Receiver<u64>,
        cursor: u64,
        batch_size: usize,
    ) -> Self {
        Self {
            client,
            head,
            cursor,
            batch_size: batch_size.max(1),
        }
    }

    /// The sequence of the last event handed out by this feed.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Moves the cursor, e.g. back to a checkpoint to replay events.
    pub fn seek(&mut self, cursor: u64) {
        self.cursor = cursor;
    }

    /// Returns the next batch of events after the cursor, waiting if there are none yet.
    ///
    /// Never returns an empty batch. Fails with [`FrameworkError::ActorClosed`] once the
    /// store has shut down and every remaining event has been read.
    pub async fn next_batch(&mut self) -> Result<Vec<ChangeEvent<T>>, FrameworkError> {
        loop {
            let head = *self.head.borrow_and_update();
            if head > self.cursor {
                let events = self.client.read_feed(self.cursor, self.batch_size).await?;
                if let Some(last) = events.last() {
                    trace!(from = self.cursor, to = last.sequence, "Feed batch");
                    self.cursor = last.sequence;
                    return Ok(events);
                }
            }
            self.head
                .changed()
                .await
                .map_err(|_| FrameworkError::ActorClosed)?;
        }
    }
}
