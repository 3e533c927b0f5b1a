//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! Log lines use a compact format that hides the crate/module prefix (`with_target(false)`).
//! Every store log line carries a `table` field instead, so lines from different tables stay
//! distinguishable without long module paths.
//!
//! - **Configurable log levels** via the `RUST_LOG` environment variable
//! - **Compact format** shows spans inline (e.g., `create_order:`)
//!
//! ## What Gets Traced
//!
//! - **Store Lifecycle**: startup and shutdown with final record / event counts
//! - **Writes**: `Inserted` and `Updated` at info, with `id` and feed `seq`
//! - **Reads**: `Get` and `ReadFeed` at debug
//! - **Rejections**: duplicate keys at warn, failed preconditions at debug
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run             # writes and lifecycle
//! RUST_LOG=debug cargo run            # every request with its payload
//! RUST_LOG=actor_store=trace cargo run  # feed batches too
//! ```
//!
//! With `RUST_LOG=info` one record inserted and then updated looks like:
//!
//! ```text
//! INFO Store started table="orders"
//! INFO Inserted table="orders" id=6f1c… seq=1 size=1
//! INFO Updated table="orders" id=6f1c… seq=2
//! INFO Shutdown table="orders" size=1 events=2
//! ```
//!
//! The actor logs from its own task, so these lines carry no caller span.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
