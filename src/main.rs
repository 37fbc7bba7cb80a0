// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lichess Stats API Server
//!
//! Imports Lichess games for logged-in users and serves filtered game
//! listings and statistics.

use lichess_stats::{
    config::Config,
    db::Database,
    services::{jobs::start_periodic_sync, InMemoryPkceStore, JobQueue, LichessClient},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Lichess Stats API");

    let db = Database::open(&config.database_url).await?;

    let lichess = LichessClient::new(&config);
    tracing::info!(base_url = %lichess.base_url(), "Lichess client initialized");

    let pkce_store = Arc::new(InMemoryPkceStore::new(Duration::from_secs(
        config.oauth_state_ttl_secs,
    )));

    let jobs = JobQueue::start(db.clone(), lichess.clone());
    if config.sync_interval_minutes > 0 {
        start_periodic_sync(
            jobs.clone(),
            config.sync_interval_minutes,
            config.sync_max_games,
        );
    } else {
        tracing::info!("Periodic game sync disabled");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        lichess,
        pkce_store,
        jobs,
    });

    // Build router
    let app = lichess_stats::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lichess_stats=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
