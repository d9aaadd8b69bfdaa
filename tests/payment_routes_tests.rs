// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment route precondition tests.
//!
//! The admin-purchase rejection and input validation run before any storage
//! access, so they are fully exercised against the offline mock.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use learnhub::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;

fn authed_request(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn test_app() -> (axum::Router, Vec<u8>) {
    let (app, state) = common::create_test_app();
    (app, state.config.jwt_signing_key.clone())
}

#[tokio::test]
async fn test_checkout_requires_auth() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payment/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"courseId": "c1"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_rejects_missing_course_id() {
    let (app, key) = test_app();
    let token = learnhub::middleware::auth::create_jwt("user-1", Role::User, &key).unwrap();

    let response = app
        .oneshot(authed_request(
            "/api/v1/payment/checkout",
            &token,
            json!({"courseId": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_cannot_checkout() {
    let (app, key) = test_app();
    let token = learnhub::middleware::auth::create_jwt("admin-1", Role::Admin, &key).unwrap();

    let response = app
        .oneshot(authed_request(
            "/api/v1/payment/checkout",
            &token,
            json!({"courseId": "c1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_verify_purchase() {
    let (app, key) = test_app();
    let token = learnhub::middleware::auth::create_jwt("admin-1", Role::Admin, &key).unwrap();

    let response = app
        .oneshot(authed_request(
            "/api/v1/payment/verify",
            &token,
            json!({"courseId": "c1", "reference": "local_abc"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_verify_requires_reference() {
    let (app, key) = test_app();
    let token = learnhub::middleware::auth::create_jwt("user-1", Role::User, &key).unwrap();

    let response = app
        .oneshot(authed_request(
            "/api/v1/payment/verify",
            &token,
            json!({"courseId": "c1", "reference": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
