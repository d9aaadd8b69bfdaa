// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat route validation tests (offline; storage-backed behavior lives in
//! `chat_integration.rs`).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use learnhub::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;

fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn test_app() -> (axum::Router, String) {
    let (app, state) = common::create_test_app();
    let token =
        learnhub::middleware::auth::create_jwt("user-1", Role::User, &state.config.jwt_signing_key)
            .unwrap();
    (app, token)
}

#[tokio::test]
async fn test_chat_routes_require_auth() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/chatroom/create")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"senderId": "a", "receiverId": "b"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_chatroom_requires_both_ids() {
    let (app, token) = test_app();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/chat/chatroom/create",
            &token,
            json!({"senderId": "a", "receiverId": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_chatroom_rejects_self_pair() {
    let (app, token) = test_app();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/chat/chatroom/create",
            &token,
            json!({"senderId": "a", "receiverId": "a"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unread_inc_requires_user_and_chatroom() {
    let (app, token) = test_app();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/chat/unread-counts/inc",
            &token,
            json!({"user": "", "chatroomId": "C123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unread_get_requires_sender_id() {
    let (app, token) = test_app();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/chat/unread-counts/get",
            &token,
            json!({"senderId": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_conversations_require_user_id_param() {
    let (app, token) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/chat/conversations/get")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Missing query string entirely -> extractor rejection (400)
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
