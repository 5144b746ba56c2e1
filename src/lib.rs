//! Documentation of the blog's share-tracking analytics service.
//!
//! Records user share events for content items, deduplicates repeats,
//! aggregates counts across daily/weekly/monthly buckets and serves
//! per-item and site-wide statistics.
//!
//!
//!
//! # General Infrastructure
//! - One stateless axum service in front of Redis
//! - Every piece of shared state lives in Redis; handlers hold no caches
//! - Dedup and counter atomicity come from the store (`SET NX EX`,
//!   `MULTI`/`EXEC`), not from in-process locking
//! - Writes fail hard (an uncounted event is never reported as counted),
//!   reads fail soft (reporting degrades to zeros when Redis is away)
//!
//!
//!
//! # Notes
//!
//! ## Redis
//! Counters are plain string keys incremented atomically; time buckets
//! carry rolling TTLs (7/30/365 days) so history evicts itself; the
//! leaderboard is one sorted set scored by total shares; recent raw events
//! sit in a capped list per content key. See [`keys`] for the full key
//! scheme.
//!
//! ## Dedup window
//! One count per (client, content, platform) per hour. The token is a
//! `SET NX EX 3600` key derived from a hashed client IP. The raw IP is
//! never stored.
use std::time::Duration;

use axum::http::{header::CONTENT_TYPE, Method};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod database;
pub mod error;
pub mod keys;
pub mod models;
pub mod retention;
pub mod routes;
pub mod state;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod utils;

use routes::router;
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = router(state.clone()).layer(cors);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
