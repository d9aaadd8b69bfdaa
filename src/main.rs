// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LearnHub API Server
//!
//! Backend for the learning platform: course catalog, purchase entitlements,
//! lecture progress, and realtime direct messaging with unread counters.

use learnhub::{
    config::Config,
    db::FirestoreDb,
    services::{DeliveryEngine, Mailer, PaymentClient, PresenceRegistry},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting LearnHub API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Presence registry lives for the whole process and is cleared with it;
    // entries are rebuilt as clients reconnect after a restart.
    let presence = Arc::new(PresenceRegistry::new());
    let delivery = DeliveryEngine::new(db.clone(), presence.clone());
    tracing::info!("Presence registry initialized");

    // Collaborator clients
    let payment = PaymentClient::new(config.payment_secret_key.clone());
    let mailer = Mailer::new(config.mail_api_key.clone(), config.mail_from.clone());
    if config.payment_secret_key.is_none() {
        tracing::warn!("PAYMENT_SECRET_KEY not set; running in local-dev payment mode");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        presence,
        delivery,
        payment,
        mailer,
    });

    // Build router
    let app = learnhub::routes::create_router(state);

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
                .add_directive("learnhub=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
