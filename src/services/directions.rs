// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Directions API client for navigating a field worker to a bin.
//!
//! Calls the external directions service, pulls the encoded route out of
//! `routes[0].overview_polyline.points`, and decodes it into waypoints the
//! map surface can draw. Upstream data problems (bad status, no routes,
//! undecodable polyline) all surface as [`AppError::DirectionsApi`]: they
//! are a gateway condition, not a client error.

use crate::error::AppError;
use crate::models::Position;
use crate::polyline;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions";

/// Directions API client.
#[derive(Clone)]
pub struct DirectionsService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DirectionsService {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Override the API endpoint (tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Plan a route from the worker's position to a bin.
    pub async fn plan_route(&self, from: Position, to: Position) -> Result<RoutePlan, AppError> {
        let url = format!("{}/json", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("origin", format!("{},{}", from.latitude, from.longitude)),
                ("destination", format!("{},{}", to.latitude, to.longitude)),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AppError::DirectionsApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::DirectionsApi(format!(
                "Directions API returned HTTP {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::DirectionsApi(format!("Invalid directions response: {}", e)))?;

        plan_from_response(body)
    }
}

/// A planned route, ready for the map surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RoutePlan {
    /// Ordered waypoints of the route polyline
    pub waypoints: Vec<Position>,
    /// Total driving distance (meters)
    pub distance_meters: u64,
    /// Total driving duration (seconds)
    pub duration_seconds: u64,
}

// ─── Directions API wire format ──────────────────────────────────

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
    #[serde(default)]
    legs: Vec<RouteLeg>,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct RouteLeg {
    distance: ValueText,
    duration: ValueText,
}

#[derive(Debug, Deserialize)]
struct ValueText {
    value: u64,
}

/// Turn a directions response into a route plan.
fn plan_from_response(response: DirectionsResponse) -> Result<RoutePlan, AppError> {
    if response.status != "OK" {
        return Err(AppError::DirectionsApi(format!(
            "Directions API status: {}",
            response.status
        )));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| AppError::DirectionsApi("Directions API returned no routes".to_string()))?;

    let line = polyline::decode(&route.overview_polyline.points)
        .map_err(|e| AppError::DirectionsApi(format!("Invalid overview polyline: {}", e)))?;

    let waypoints = line
        .coords()
        .map(|c| Position {
            latitude: c.y,
            longitude: c.x,
        })
        .collect();

    Ok(RoutePlan {
        waypoints,
        distance_meters: route.legs.iter().map(|l| l.distance.value).sum(),
        duration_seconds: route.legs.iter().map(|l| l.duration.value).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(status: &str, points: &str) -> DirectionsResponse {
        serde_json::from_str(&format!(
            r#"{{
                "status": "{}",
                "routes": [{{
                    "overview_polyline": {{ "points": "{}" }},
                    "legs": [
                        {{ "distance": {{ "value": 1200 }}, "duration": {{ "value": 300 }} }},
                        {{ "distance": {{ "value": 800 }}, "duration": {{ "value": 140 }} }}
                    ]
                }}]
            }}"#,
            status, points
        ))
        .expect("fixture should parse")
    }

    #[test]
    fn test_plan_decodes_overview_polyline() {
        let response = response_with("OK", "_p~iF~ps|U_ulLnnqC_mqNvxq`@");

        let plan = plan_from_response(response).expect("plan should build");

        assert_eq!(plan.waypoints.len(), 3);
        assert!((plan.waypoints[0].latitude - 38.5).abs() < 1e-9);
        assert!((plan.waypoints[0].longitude - -120.2).abs() < 1e-9);
        assert_eq!(plan.distance_meters, 2000);
        assert_eq!(plan.duration_seconds, 440);
    }

    #[test]
    fn test_non_ok_status_is_an_upstream_error() {
        let response = response_with("ZERO_RESULTS", "");
        assert!(matches!(
            plan_from_response(response),
            Err(AppError::DirectionsApi(_))
        ));
    }

    #[test]
    fn test_empty_routes_is_an_upstream_error() {
        let response: DirectionsResponse =
            serde_json::from_str(r#"{ "status": "OK", "routes": [] }"#).unwrap();
        assert!(matches!(
            plan_from_response(response),
            Err(AppError::DirectionsApi(_))
        ));
    }

    #[test]
    fn test_undecodable_polyline_is_an_upstream_error() {
        let response = response_with("OK", "_p~iF");
        assert!(matches!(
            plan_from_response(response),
            Err(AppError::DirectionsApi(_))
        ));
    }
}
