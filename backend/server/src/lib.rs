//! Documentation of the Masterchef recipe service.
//!
//!
//!
//! # General Infrastructure
//! - Axum server exposing `/api/v1/recipes`
//! - Redis holds recipe documents and sequence counters
//! - `STORE_BACKEND=memory` swaps Redis for in-process maps on single node runs
//!
//!
//!
//! # Recipes
//!
//! Every recipe carries two identities:
//! - `id`: opaque storage key assigned on insert
//! - `seq`: human-facing number, strictly increasing across every server instance
//!
//! Create requests are validated first, then stamped with the next `seq`, then
//! persisted. A request rejected during validation never consumes a number.
//!
//!
//!
//! # Sequence Numbers
//!
//! One counter per sequence name, bumped with Redis `INCR`.
//!
//! - `INCR` creates a missing counter at 0 before incrementing, so the first number is 1
//! - Redis executes commands one at a time, which is the only coordination we rely on
//! - No caching or batching, every allocation is one round trip
//! - A number handed out to a request that later fails is gone for good
//! - Sequence order is allocation order, not the order records land in storage
//!
//!
//!
//! # Notes
//!
//! ## Failures
//! - Redis down: 500, creation aborted, caller decides whether to retry
//! - Redis answered without a value: 500, never treated as 0
//! - Bad input: 400 with per-field details
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p backend
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_BACKEND=memory RUST_LOG=debug cargo run -p backend
//! ```
//!
//! Hammer a running server with concurrent creates.
//! ```sh
//! cargo run -p tester -- --count 200
//! ```
use std::{future::pending, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
};

use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod counter;
pub mod database;
pub mod error;
pub mod recipe;
pub mod routes;
pub mod sequence;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    routes::router(state).layer(cors)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
