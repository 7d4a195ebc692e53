// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use tong_tracker::config::Config;
use tong_tracker::db::FirestoreDb;
use tong_tracker::routes::create_router;
use tong_tracker::services::{BinRepository, DirectionsService};
use tong_tracker::AppState;

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the JWT signing key for forging sessions.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Vec<u8>) {
    let config = Config::test_default();
    let signing_key = config.jwt_signing_key.clone();

    let db = test_db_offline();
    let bins = BinRepository::new(db.clone());
    let directions = DirectionsService::with_base_url(
        config.directions_api_key.clone(),
        // Unroutable endpoint: tests must never reach the network.
        "http://127.0.0.1:0".to_string(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        bins,
        directions,
    });

    (create_router(state), signing_key)
}
