// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tong-Tracker API Server
//!
//! Serves live smart-bin telemetry from Firestore, credits collections,
//! applies the weekly reset, and plans navigation routes to bins.

use std::sync::Arc;
use tong_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{BinRepository, DirectionsService, ResetService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Tong-Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Bin repository over the store
    let bins = BinRepository::new(db.clone());

    // Directions client for route planning
    let directions = DirectionsService::new(config.directions_api_key.clone());

    // Weekly reset: check at startup, then once a day
    let reset_service = ResetService::new(db.clone());
    tokio::spawn(async move {
        loop {
            let today = chrono::Utc::now().date_naive();
            if let Err(err) = reset_service.run_if_due(today).await {
                tracing::error!(error = %err, "Weekly reset check failed");
            }
            tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60)).await;
        }
    });

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        bins,
        directions,
    });

    // Build router
    let app = tong_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tong_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
