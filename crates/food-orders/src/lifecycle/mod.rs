//! # Pipeline Lifecycle & Orchestration
//!
//! Starting, wiring and stopping the order pipeline.
//!
//! ## Wiring
//!
//! Every component receives its collaborators at construction. Nothing is global:
//!
//! ```text
//! OrderIngress ──insert──▶ StoreActor<Order> ──feed──▶ TransitionWorker
//!                               ▲                          │
//!                               └──conditional update──────┤
//!                                                          ▼
//!                                             NotificationDispatcher ──▶ Publisher
//! ```
//!
//! The store actor and the worker each run in their own Tokio task. The ingress and the
//! HTTP handlers are plain cloneable handles and run on the caller's tasks.
//!
//! ## Graceful Shutdown
//!
//! Order matters, because the worker's feed holds a store client:
//!
//! 1. **Stop the worker** - armed timers are abandoned and the checkpoint stays at the last
//!    safe point, so those orders are replayed on the next start
//! 2. **Drop all clients** - closes the store's request channel
//! 3. **Await the store actor** - it drains queued requests and exits
//!
//! Routers built with [`OrderPipeline::router`] hold store clients as well. Drop them (stop
//! serving) before calling [`OrderPipeline::shutdown`].
//!
//! ## Observability
//!
//! Call [`setup_tracing`](actor_store::tracing::setup_tracing) once at startup. With
//! `RUST_LOG=info` the lifecycle of an order reads:
//!
//! ```text
//! INFO Inserted table="orders" id=3f6c… seq=1 size=1
//! INFO create_order: Order placed order_id=3f6c… seq=1
//! INFO Updated table="orders" id=3f6c… seq=2
//! INFO transition: Order transitioned order_id=3f6c… status=OUT_FOR_DELIVERY
//! INFO transition:notify: Notification published topic="order-status-updates" …
//! ```
//!
//! `RUST_LOG=debug` adds feed scheduling, ignored events and checkpoint saves.

mod pipeline;

pub use pipeline::*;
