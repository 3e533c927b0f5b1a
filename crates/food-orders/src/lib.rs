//! # Food Orders
//!
//! An event-driven order lifecycle pipeline built on [`actor_store`].
//!
//! A client places an order over HTTP; the order is stored as `PREPARING`; a worker watching
//! the store's change feed waits out the preparation time, moves the order to
//! `OUT_FOR_DELIVERY` with a conditional update and publishes a notification.
//!
//! ## Modules
//!
//! - **[model]**: [`Order`](model::Order) and its status, id and request types
//! - **[store]**: the orders table and its domain client
//! - **[ingress]**: validation and creation of new orders
//! - **[worker]**: the change-feed consumer that performs the status transition
//! - **[notifier]**: publishing status messages to a topic
//! - **[checkpoint]**: where the worker remembers its feed position
//! - **[retry]**: bounded exponential backoff shared by the worker and the notifier
//! - **[api]**: the axum router
//! - **[config]**: environment configuration
//! - **[lifecycle]**: starting and stopping the whole pipeline

pub mod api;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod ingress;
pub mod lifecycle;
pub mod model;
pub mod notifier;
pub mod retry;
pub mod store;
pub mod worker;
