//! # Food Orders Service
//!
//! Serves the order API and runs the transition worker in one process.
//!
//! 1. Loads `.env` (if present) and reads [`Config`] from the environment.
//! 2. Starts the [`OrderPipeline`] with a [`LogPublisher`].
//! 3. Serves HTTP until Ctrl-C, then shuts the pipeline down.

use actor_store::tracing::setup_tracing;
use food_orders::config::Config;
use food_orders::lifecycle::OrderPipeline;
use food_orders::notifier::LogPublisher;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    setup_tracing();

    let config = Config::from_env()?;
    info!(?config, "Configuration loaded");

    let pipeline = OrderPipeline::start(&config, Arc::new(LogPublisher));
    let app = pipeline.router();

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pipeline.shutdown().await?;
    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
