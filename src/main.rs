// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! trac-cal API Server
//!
//! Serves nutrition lookups and the user's profile to the tracker app.

use std::sync::Arc;
use trac_cal::{
    config::Config,
    db::{FirestoreDb, LocalStore},
    services::{KeyPool, NutritionService, ProfileStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        api_keys = config.openai_api_keys.len(),
        "Starting trac-cal API"
    );

    // Device-local store shared by the key pool and the profile store
    let local_store = Arc::new(LocalStore::open(config.local_store_path()));
    local_store.ensure_initialized().await;
    tracing::info!(path = %config.local_store_path().display(), "Local store ready");

    let key_pool = Arc::new(
        KeyPool::new(config.openai_api_keys.clone(), local_store.clone())
            .await
            .expect("Failed to initialize API key pool"),
    );

    let nutrition_service = NutritionService::from_config(&config, key_pool)
        .expect("Failed to build nutrition client");
    let profile_store = ProfileStore::new(local_store);

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        profile_store,
        nutrition_service,
    });

    // Build router
    let app = trac_cal::routes::create_router(state);

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
                .add_directive("trac_cal=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
