// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod chat;
pub mod courses;
pub mod payments;
pub mod progress;
pub mod users;
pub mod ws;

use crate::middleware::auth::{require_admin, require_auth, require_course_access};
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required). The websocket endpoint is public:
    // connections only become addressable after an addUser event.
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(users::routes())
        .merge(courses::routes())
        .merge(ws::routes());

    // Protected routes (auth required)
    let protected_routes = users::authed_routes()
        .merge(chat::routes())
        .merge(payments::routes())
        .merge(progress::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Course-content routes (auth + entitlement guard)
    let guarded_routes = progress::guarded_routes()
        .merge(courses::content_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_course_access,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admin routes (auth + role check)
    let admin_routes = courses::admin_routes()
        .merge(admin::routes())
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(guarded_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
