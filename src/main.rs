// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Courage API Server
//!
//! Serves one AI-generated personal-growth challenge per day, keeping the
//! profile, today's challenge and the history in a local data directory.

use courage::{
    config::Config,
    db::{FileStore, SessionDb},
    services::{GeminiGenerator, SessionService},
    time_utils::SystemClock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Courage API");

    // Open the local record store
    let store = FileStore::open(&config.data_dir).expect("Failed to open data directory");
    let db = SessionDb::new(Arc::new(store));

    let clock = Arc::new(SystemClock);
    let generator = Arc::new(GeminiGenerator::from_config(&config, clock.clone()));
    tracing::info!(model = %config.gemini_model, "Gemini generator initialized");

    let session =
        SessionService::load(db, generator, clock).expect("Failed to load session records");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        session,
    });

    // Build router
    let app = courage::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("courage=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
