//! # Actor Store
//!
//! This crate provides a keyed record store run as a Tokio actor, with conditional writes and
//! a replayable change feed. It is the persistence building block for event-driven pipelines:
//! one component writes records, another consumes the store's feed and reacts to each write.
//!
//! ## Why an Actor?
//!
//! - Isolated state (no shared memory, no locks)
//! - Message-passing concurrency
//! - Sequential processing within the actor makes every conditional write atomic
//!
//! A compare-and-swap is only correct if nothing can slip in between the compare and the
//! swap. An actor gets that for free: it handles one request at a time, so the first of two
//! competing writers wins and the second observes a failed precondition.
//!
//! **Further Reading**:
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`StoredEntity`]) - Your record type and its update precondition
//! 2. **Runtime Layer** ([`StoreActor`]) - Request processing, the records and the change log
//! 3. **Interface Layer** ([`StoreClient`], [`Feed`]) - Type-safe requests and feed subscription
//!
//! ## Operations
//!
//! | Operation | Succeeds when | Fails with | Feed event |
//! |-----------|---------------|------------|------------|
//! | `insert` | id is new | `DuplicateKey` | `Insert` |
//! | `get` | always | – | – |
//! | `update_if` | record exists and precondition holds | `PreconditionFailed` | `Update` |
//! | `read_feed` / `Feed::next_batch` | always | `ActorClosed` after shutdown | – |
//!
//! ## Example
//!
//! ```rust
//! use actor_store::{ChangeKind, StoreActor, StoredEntity};
//!
//! #[derive(Clone, Debug)]
//! struct Door { id: u8, open: bool }
//!
//! #[derive(Debug)]
//! struct Toggle { expect_open: bool }
//!
//! impl StoredEntity for Door {
//!     type Id = u8;
//!     type Update = Toggle;
//!     fn id(&self) -> &u8 { &self.id }
//!     fn precondition_holds(&self, t: &Toggle) -> bool { self.open == t.expect_open }
//!     fn apply(&mut self, _: Toggle) { self.open = !self.open; }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = StoreActor::<Door>::new("doors", 10);
//!     tokio::spawn(actor.run());
//!
//!     let mut feed = client.subscribe(0, 10);
//!     client.insert(Door { id: 1, open: false }).await.unwrap();
//!     client.update_if(1, Toggle { expect_open: false }).await.unwrap();
//!
//!     // The same expectation a second time loses the race
//!     assert!(client.update_if(1, Toggle { expect_open: false }).await.is_err());
//!
//!     let events = feed.next_batch().await.unwrap();
//!     assert_eq!(events.len(), 2);
//!     assert_eq!(events[0].kind, ChangeKind::Insert);
//!     assert_eq!(events[1].kind, ChangeKind::Update);
//! }
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module provides a `MockClient` that answers store requests from scripted
//! expectations, so failures such as a temporarily unavailable store can be injected
//! deterministically.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod feed;
pub mod message;
pub mod mock;
pub mod tracing;

// Re-export core types for convenience
pub use actor::StoreActor;
pub use client::StoreClient;
pub use client_trait::EntityClient;
pub use entity::StoredEntity;
pub use error::FrameworkError;
pub use feed::{ChangeEvent, ChangeKind, Feed};
pub use message::{Response, StoreRequest};
