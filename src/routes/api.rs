// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated field workers.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::stats::rank_collectors;
use crate::models::{Bin, CollectionReceipt, HistoricalEntry, LeaderboardEntry, Position};
use crate::services::RoutePlan;
use crate::time_utils::{format_date, format_utc_rfc3339, parse_date};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bins", get(get_bins))
        .route("/api/bins/geojson", get(get_bins_geojson))
        .route("/api/bins/{id}", get(get_bin))
        .route("/api/bins/{id}/empty", post(empty_bin))
        .route("/api/bins/{id}/lid", post(toggle_lid))
        .route("/api/bins/{id}/route", get(plan_route))
        .route("/api/days/finish", post(finish_day))
        .route("/api/history", get(get_history))
        .route("/api/stats/leaderboard", get(get_leaderboard))
}

// ─── Bins ────────────────────────────────────────────────────

/// Bin snapshot as served to the map client.
#[derive(Serialize)]
pub struct BinResponse {
    pub id: String,
    pub battery: f64,
    pub distance: f64,
    pub weight: f64,
    pub collected_weight: f64,
    pub closed: bool,
    pub fill_percent: f64,
    pub position: Position,
}

impl From<Bin> for BinResponse {
    fn from(bin: Bin) -> Self {
        let fill_percent = bin.fill_percent();
        Self {
            id: bin.id,
            battery: bin.battery,
            distance: bin.distance,
            weight: bin.weight,
            collected_weight: bin.collected_weight,
            closed: bin.closed,
            fill_percent,
            position: bin.position,
        }
    }
}

/// List all bins with their live snapshots.
async fn get_bins(State(state): State<Arc<AppState>>) -> Result<Json<Vec<BinResponse>>> {
    let bins = state.bins.list_bins().await?;
    Ok(Json(bins.into_iter().map(BinResponse::from).collect()))
}

/// Get one bin's snapshot.
async fn get_bin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BinResponse>> {
    let bin = state
        .bins
        .get_bin(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bin {} not found", id)))?;

    Ok(Json(bin.into()))
}

/// Bin markers as a GeoJSON FeatureCollection for the map surface.
async fn get_bins_geojson(State(state): State<Arc<AppState>>) -> Result<Json<FeatureCollection>> {
    let bins = state.bins.list_bins().await?;

    let features = bins.iter().map(bin_feature).collect();

    Ok(Json(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }))
}

fn bin_feature(bin: &Bin) -> Feature {
    let geometry = Geometry::new(geojson::Value::Point(vec![
        bin.position.longitude,
        bin.position.latitude,
    ]));

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), bin.id.clone().into());
    properties.insert("weight".to_string(), bin.weight.into());
    properties.insert("fill_percent".to_string(), bin.fill_percent().into());
    properties.insert("battery".to_string(), bin.battery.into());
    properties.insert("closed".to_string(), bin.closed.into());

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

// ─── Collection ──────────────────────────────────────────────

/// Scale reading after the worker emptied the bin.
#[derive(Deserialize, Validate)]
pub struct EmptyBinRequest {
    /// Post-collection weight (kg); the bin is rarely emptied to exactly 0
    #[validate(range(min = 0.0))]
    pub final_weight: f64,
}

/// Mark a bin emptied and credit the lifted weight.
async fn empty_bin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<EmptyBinRequest>,
) -> Result<Json<CollectionReceipt>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let receipt = state.bins.empty_bin(&id, payload.final_weight).await?;

    tracing::info!(
        bin_id = %id,
        worker = %user.worker_id,
        weight_lifted = receipt.weight_lifted,
        "Bin emptied"
    );

    Ok(Json(receipt))
}

/// Lid state after a toggle.
#[derive(Serialize)]
pub struct LidResponse {
    pub id: String,
    pub closed: bool,
}

/// Toggle a bin's lid open/closed.
async fn toggle_lid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LidResponse>> {
    let closed = state.bins.toggle_lid(&id).await?;
    Ok(Json(LidResponse { id, closed }))
}

// ─── Route Planning ──────────────────────────────────────────

/// Worker position for route planning.
#[derive(Deserialize, Validate)]
pub struct RouteQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub from_lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub from_lng: f64,
}

/// Plan a navigation route from the worker's position to a bin.
async fn plan_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RoutePlan>> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let bin = state
        .bins
        .get_bin(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bin {} not found", id)))?;

    let from = Position {
        latitude: query.from_lat,
        longitude: query.from_lng,
    };
    let plan = state.directions.plan_route(from, bin.position).await?;

    Ok(Json(plan))
}

// ─── Finish Day & History ────────────────────────────────────

/// Close out the collection day: record today's total collected weight.
///
/// Idempotent per calendar date; a second call returns the entry that was
/// already recorded instead of appending a duplicate.
async fn finish_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoricalEntry>> {
    let now = chrono::Utc::now();
    let today = format_date(now.date_naive());

    if let Some(existing) = state.db.get_history_for_date(&today).await? {
        tracing::debug!(date = %today, "Day already finished, returning existing entry");
        return Ok(Json(existing));
    }

    let total_weight = state.bins.total_collected().await?;
    let entry = HistoricalEntry::new(today.clone(), total_weight, format_utc_rfc3339(now));
    state.db.append_history(&entry).await?;

    tracing::info!(
        date = %today,
        total_weight,
        worker = %user.worker_id,
        "Collection day finished"
    );

    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    /// Cursor for forward pagination (opaque token)
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;

#[derive(Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoricalEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// List daily collection totals, newest first, for the weekly charts.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
    let before_date = query.cursor.as_deref().map(decode_cursor).transpose()?;

    let entries = state
        .db
        .list_history(before_date.as_deref(), per_page)
        .await?;

    let next_cursor = if entries.len() as u32 == per_page {
        entries.last().map(|entry| encode_cursor(&entry.date))
    } else {
        None
    };

    Ok(Json(HistoryResponse {
        entries,
        next_cursor,
    }))
}

/// Cursor is the last seen date, base64-wrapped so clients treat it as opaque.
fn encode_cursor(date: &str) -> String {
    URL_SAFE_NO_PAD.encode(date)
}

fn decode_cursor(raw: &str) -> Result<String> {
    let invalid_cursor = || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

    let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
    let date = String::from_utf8(bytes).map_err(|_| invalid_cursor())?;
    parse_date(&date).ok_or_else(invalid_cursor)?;
    Ok(date)
}

// ─── Leaderboard ─────────────────────────────────────────────

/// Top bins by collected weight this week.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let bins = state.bins.list_bins().await?;
    let top = rank_collectors(bins.into_iter().map(|b| (b.id, b.collected_weight)));
    Ok(Json(top))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = encode_cursor("2024-01-15");
        assert_eq!(decode_cursor(&cursor).unwrap(), "2024-01-15");
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(decode_cursor("!!!not-base64!!!").is_err());
        // Valid base64 but not a date.
        assert!(decode_cursor(&URL_SAFE_NO_PAD.encode("yesterday")).is_err());
    }
}
