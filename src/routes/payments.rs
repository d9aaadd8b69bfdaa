// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment routes: checkout session creation and purchase verification.
//!
//! `verify` is the sole writer of the entitlement ledger and seeds the
//! progress store. It requires the processor's session reference; replays of
//! an already-processed reference succeed without appending a window.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::entitlement::PurchaseOutcome;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payment routes (require authentication; layered in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/payment/checkout", post(checkout))
        .route("/api/v1/payment/verify", post(verify))
}

// ─── Checkout ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest {
    course_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the client to
    pub url: String,
    /// Session reference to pass back to `verify` after payment
    pub reference: String,
}

/// Create a hosted checkout session for one course.
async fn checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    if payload.course_id.is_empty() {
        return Err(AppError::Validation("courseId is required".to_string()));
    }

    // Administrators do not buy courses
    if user.is_admin() {
        return Err(AppError::Forbidden(
            "administrators cannot purchase courses".to_string(),
        ));
    }

    let course = state
        .db
        .get_course(&payload.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} not found", payload.course_id)))?;

    // Reject up front when an active window already exists
    if state
        .db
        .has_active_access(&user.user_id, &course.id, chrono::Utc::now())
        .await?
    {
        return Err(AppError::Conflict(
            "you have already purchased this course".to_string(),
        ));
    }

    let success_url = format!(
        "{}/payment/success?courseId={}",
        state.config.frontend_url, course.id
    );
    let cancel_url = format!("{}/payment/failure", state.config.frontend_url);

    let session = state
        .payment
        .create_checkout_session(&course.title, course.price, &success_url, &cancel_url)
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        course_id = %course.id,
        reference = %session.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        url: session.url,
        reference: session.id,
    }))
}

// ─── Verify ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    course_id: String,
    /// Processor session reference from checkout; verify is idempotent per
    /// reference
    reference: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
}

/// Confirm a payment and record the entitlement.
async fn verify(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    if payload.course_id.is_empty() || payload.reference.is_empty() {
        return Err(AppError::Validation(
            "courseId and reference are both required".to_string(),
        ));
    }

    if user.is_admin() {
        return Err(AppError::Forbidden(
            "administrators cannot purchase courses".to_string(),
        ));
    }

    let course = state
        .db
        .get_course(&payload.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} not found", payload.course_id)))?;

    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user.user_id)))?;

    // Confirm the session with the processor before touching the ledger
    let session = state.payment.retrieve_session(&payload.reference).await?;
    if !session.is_paid() {
        return Err(AppError::Validation(
            "payment has not completed for this reference".to_string(),
        ));
    }

    let outcome = state
        .db
        .record_purchase_atomic(
            &user.user_id,
            &course.id,
            &payload.reference,
            chrono::Utc::now(),
            course.expiry_months,
        )
        .await?;

    match outcome {
        PurchaseOutcome::AlreadyEntitled => Err(AppError::Conflict(
            "you already purchased this course".to_string(),
        )),
        PurchaseOutcome::AlreadyProcessed => Ok(Json(VerifyResponse {
            success: true,
            message: "payment already processed".to_string(),
        })),
        PurchaseOutcome::Recorded => {
            // Seed progress after the ledger commit. A lost seed degrades
            // gracefully: progress entries are created lazily on first write.
            if let Err(e) = state
                .db
                .seed_course_progress(&user.user_id, &course.id)
                .await
            {
                tracing::warn!(
                    error = %e,
                    user_id = %user.user_id,
                    course_id = %course.id,
                    "Failed to seed course progress"
                );
            }

            let course_link = format!("{}/course/{}", state.config.frontend_url, course.id);
            state.mailer.notify_purchase(
                &profile.email,
                &course.title,
                course.expiry_months,
                course.price,
                &course_link,
            );

            Ok(Json(VerifyResponse {
                success: true,
                message: "purchase recorded".to_string(),
            }))
        }
    }
}
