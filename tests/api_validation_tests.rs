// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests.
//!
//! Invalid input must be rejected with 400 before any store access, so
//! these all run against the offline mock database: a 500 would mean the
//! handler touched the store before validating.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tong_tracker::middleware::auth::create_jwt;
use tower::ServiceExt;

mod common;

fn authed_request(signing_key: &[u8]) -> axum::http::request::Builder {
    let token = create_jwt("worker-1", signing_key).unwrap();
    Request::builder().header(header::AUTHORIZATION, format!("Bearer {}", token))
}

#[tokio::test]
async fn test_empty_bin_rejects_negative_final_weight() {
    let (app, signing_key) = common::create_test_app();

    let response = app
        .oneshot(
            authed_request(&signing_key)
                .method("POST")
                .uri("/api/bins/Tong%20FIK/empty")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"final_weight": -1.5}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_bin_rejects_missing_body_field() {
    let (app, signing_key) = common::create_test_app();

    let response = app
        .oneshot(
            authed_request(&signing_key)
                .method("POST")
                .uri("/api/bins/Tong%20FIK/empty")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Deserialization failure from the Json extractor.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_route_query_rejects_out_of_range_latitude() {
    let (app, signing_key) = common::create_test_app();

    let response = app
        .oneshot(
            authed_request(&signing_key)
                .method("GET")
                .uri("/api/bins/Tong%20FIK/route?from_lat=95.0&from_lng=10.0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_route_query_rejects_out_of_range_longitude() {
    let (app, signing_key) = common::create_test_app();

    let response = app
        .oneshot(
            authed_request(&signing_key)
                .method("GET")
                .uri("/api/bins/Tong%20FIK/route?from_lat=-6.3628&from_lng=197.0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_rejects_malformed_cursor() {
    let (app, signing_key) = common::create_test_app();

    let response = app
        .oneshot(
            authed_request(&signing_key)
                .method("GET")
                .uri("/api/history?cursor=%21%21garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
