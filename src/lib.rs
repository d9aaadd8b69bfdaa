// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! LearnHub: course catalog, entitlements, lecture progress and realtime
//! direct messaging.
//!
//! This crate provides the backend API: HTTP routes for the catalog,
//! purchases and progress, plus a websocket layer that delivers chat
//! messages to live connections or rolls them into unread counters.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{DeliveryEngine, Mailer, PaymentClient, PresenceRegistry};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub presence: Arc<PresenceRegistry>,
    pub delivery: DeliveryEngine<FirestoreDb>,
    pub payment: PaymentClient,
    pub mailer: Mailer,
}
