// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tong-Tracker: monitor networked smart waste bins
//!
//! This crate provides the backend API for the bin-monitoring map client:
//! live bin telemetry, collection accounting with a weekly reset, daily
//! history, a leaderboard, and navigation routes decoded from the
//! directions service's encoded polylines.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod polyline;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{BinRepository, DirectionsService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub bins: BinRepository,
    pub directions: DirectionsService,
}
