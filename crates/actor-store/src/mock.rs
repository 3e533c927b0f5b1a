//! # Mock Store & Testing Guide
//!
//! `MockClient<T>` hands out a real [`StoreClient<T>`] whose requests are answered by a
//! background task from a queue of scripted expectations instead of by a `StoreActor`.
//! It lets you test code that *uses* a store (ingress, workers, domain clients) against
//! failures that a healthy in-memory actor never produces.
//!
//! ## When to use Mocks vs Real Actors
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | None (scripted answers) | Real records and change log |
//! | **Error Injection** | Easy (`return_err`) | Only logical errors (duplicate key, precondition) |
//! | **Use Case** | Retry / failure handling around the client | The store itself or a full pipeline |
//!
//! ## Injecting a transient failure
//!
//! ```rust
//! use actor_store::mock::MockClient;
//! use actor_store::{FrameworkError, StoredEntity};
//!
//! #[derive(Clone, Debug, PartialEq)] struct Job { id: u32, done: bool }
//! impl StoredEntity for Job {
//!     type Id = u32;
//!     type Update = bool;
//!     fn id(&self) -> &u32 { &self.id }
//!     fn precondition_holds(&self, _: &bool) -> bool { !self.done }
//!     fn apply(&mut self, done: bool) { self.done = done; }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Job>::new();
//!     mock.expect_update_if(7).return_err(FrameworkError::Unavailable("throttled".into()));
//!     mock.expect_update_if(7).return_ok(Job { id: 7, done: true });
//!
//!     let client = mock.client();
//!     assert!(client.update_if(7, true).await.is_err());
//!     assert!(client.update_if(7, true).await.unwrap().done);
//!
//!     mock.verify();
//! }
//! ```
//!
//! ## Driving a feed
//!
//! [`MockClient::set_head`] moves the head sequence seen by feeds opened on the mock client,
//! waking them up; pair it with [`MockClient::expect_read_feed`] to hand them events.

use crate::client::StoreClient;
use crate::entity::StoredEntity;
use crate::error::FrameworkError;
use crate::feed::ChangeEvent;
use crate::message::StoreRequest;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};

/// An expected request to the mock store and the answer to give it.
enum Expectation<T: StoredEntity> {
    Insert {
        response: Result<u64, FrameworkError>,
    },
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    UpdateIf {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    ReadFeed {
        response: Result<Vec<ChangeEvent<T>>, FrameworkError>,
    },
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

fn lock<T: StoredEntity>(queue: &Queue<T>) -> MutexGuard<'_, VecDeque<Expectation<T>>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A mock store with expectation tracking for fluent testing.
///
/// Requests are matched against expectations in FIFO order. A request that does not match
/// the next expectation (wrong kind or wrong id) is counted as a mismatch and its response
/// channel is dropped, so the caller observes [`FrameworkError::ActorDropped`].
pub struct MockClient<T: StoredEntity> {
    client: StoreClient<T>,
    head: watch::Sender<u64>,
    expectations: Queue<T>,
    mismatches: Arc<AtomicUsize>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: StoredEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StoredEntity> MockClient<T> {
    /// Creates a new mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest<T>>(100);
        let (head, head_rx) = watch::channel(0);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(AtomicUsize::new(0));

        let queue = expectations.clone();
        let misses = mismatches.clone();
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();

                match (request, expectation) {
                    (
                        StoreRequest::Insert { respond_to, .. },
                        Some(Expectation::Insert { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        StoreRequest::Get { id, respond_to },
                        Some(Expectation::Get { id: expected, response }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        StoreRequest::UpdateIf { id, respond_to, .. },
                        Some(Expectation::UpdateIf { id: expected, response }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        StoreRequest::ReadFeed { respond_to, .. },
                        Some(Expectation::ReadFeed { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    _ => {
                        misses.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });

        Self {
            client: StoreClient::new(sender, head_rx),
            head,
            expectations,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> StoreClient<T> {
        self.client.clone()
    }

    /// Moves the head sequence observed by feeds opened on this mock.
    pub fn set_head(&self, sequence: u64) {
        self.head.send_replace(sequence);
    }

    /// Expects an `insert` request.
    pub fn expect_insert(&mut self) -> ExpectationBuilder<T, u64> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::Insert {
            response,
        })
    }

    /// Expects a `get` request for `id`.
    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        ExpectationBuilder::new(&self.expectations, move |response| Expectation::Get {
            id,
            response,
        })
    }

    /// Expects an `update_if` request for `id`.
    pub fn expect_update_if(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        ExpectationBuilder::new(&self.expectations, move |response| Expectation::UpdateIf {
            id,
            response,
        })
    }

    /// Expects a `read_feed` request.
    pub fn expect_read_feed(&mut self) -> ExpectationBuilder<T, Vec<ChangeEvent<T>>> {
        ExpectationBuilder::new(&self.expectations, |response| Expectation::ReadFeed {
            response,
        })
    }

    /// Number of expectations not consumed yet.
    pub fn remaining(&self) -> usize {
        lock(&self.expectations).len()
    }

    /// Verifies that all expectations were met and no unexpected request arrived.
    pub fn verify(&self) {
        let remaining = self.remaining();
        let mismatches = self.mismatches.load(Ordering::SeqCst);
        if remaining != 0 || mismatches != 0 {
            panic!(
                "Mock store expectations not met: {remaining} remaining, {mismatches} unexpected requests"
            );
        }
    }
}

/// Builder that queues one expectation once its answer is known.
pub struct ExpectationBuilder<T: StoredEntity, R> {
    expectations: Queue<T>,
    make: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send>,
}

impl<T: StoredEntity, R> ExpectationBuilder<T, R> {
    fn new(
        expectations: &Queue<T>,
        make: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send + 'static,
    ) -> Self {
        Self {
            expectations: expectations.clone(),
            make: Box::new(make),
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        let expectation = (self.make)(Ok(value));
        lock(&self.expectations).push_back(expectation);
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        let expectation = (self.make)(Err(error));
        lock(&self.expectations).push_back(expectation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ChangeKind;

    #[derive(Clone, Debug, PartialEq)]
    struct Ticket {
        id: u32,
        claimed: bool,
    }

    impl StoredEntity for Ticket {
        type Id = u32;
        type Update = ();

        fn id(&self) -> &u32 {
            &self.id
        }

        fn precondition_holds(&self, _: &()) -> bool {
            !self.claimed
        }

        fn apply(&mut self, _: ()) {
            self.claimed = true;
        }
    }

    #[tokio::test]
    async fn test_mock_answers_in_order() {
        let mut mock = MockClient::<Ticket>::new();
        mock.expect_insert().return_ok(1);
        mock.expect_get(1).return_ok(Some(Ticket {
            id: 1,
            claimed: false,
        }));
        mock.expect_update_if(1)
            .return_err(FrameworkError::PreconditionFailed("1".into()));

        let client = mock.client();
        let seq = client
            .insert(Ticket {
                id: 1,
                claimed: false,
            })
            .await
            .unwrap();
        assert_eq!(seq, 1);
        assert!(client.get(1).await.unwrap().is_some());
        assert_eq!(
            client.update_if(1, ()).await,
            Err(FrameworkError::PreconditionFailed("1".into()))
        );

        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_reports_unexpected_requests() {
        let mut mock = MockClient::<Ticket>::new();
        mock.expect_get(2).return_ok(None);

        let client = mock.client();
        let result = client.get(3).await;
        assert_eq!(result, Err(FrameworkError::ActorDropped));
        assert_eq!(mock.remaining(), 0);
        assert_eq!(mock.mismatches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mock_drives_feed() {
        let mut mock = MockClient::<Ticket>::new();
        let event = ChangeEvent {
            sequence: 1,
            kind: ChangeKind::Insert,
            new_image: Ticket {
                id: 9,
                claimed: false,
            },
            old_image: None,
        };
        mock.expect_read_feed().return_ok(vec![event]);

        let mut feed = mock.client().subscribe(0, 10);
        mock.set_head(1);

        let batch = feed.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].new_image.id, 9);
        assert_eq!(feed.cursor(), 1);
        mock.verify();
    }
}
