// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User routes: registration, login/logout, profile.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{PublicUser, Role, User};
use crate::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Public user routes (register/login). Auth-required routes live in
/// `authed_routes` and get the middleware layer in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/user/register", post(register))
        .route("/api/v1/user/login", post(login))
}

pub fn authed_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/user/logout", get(logout))
        .route("/api/v1/user/me", get(me))
        .route("/api/v1/user/update", put(update_profile))
}

fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build(("token", token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// ─── Registration ────────────────────────────────────────────

#[derive(Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    /// Avatar URL from the blob-storage collaborator (optional)
    avatar_url: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub role: Role,
    pub user: PublicUser,
}

/// Register a new user and start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let name = payload.name.trim();
    if name.len() < 3 || name.len() > 30 {
        return Err(AppError::Validation(
            "name must be between 3 and 30 characters".to_string(),
        ));
    }
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "an account already exists for this email".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.clone(),
        password_hash,
        role: Role::User,
        avatar_url: payload.avatar_url,
        created_at: crate::time_utils::format_utc_rfc3339(chrono::Utc::now()),
    };

    state.db.upsert_user(&user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    // Post-commit notification; never blocks or fails the request
    state.mailer.notify_registered(&user.email, &user.name);

    let token = create_jwt(&user.id, user.role, &state.config.jwt_signing_key)?;
    Ok((
        jar.add(auth_cookie(token)),
        Json(AuthResponse {
            success: true,
            role: user.role,
            user: PublicUser::from(&user),
        }),
    ))
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    let user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash invalid: {}", e)))?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let token = create_jwt(&user.id, user.role, &state.config.jwt_signing_key)?;
    Ok((
        jar.add(auth_cookie(token)),
        Json(AuthResponse {
            success: true,
            role: user.role,
            user: PublicUser::from(&user),
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let removal = Cookie::build(("token", "")).path("/").build();
    (
        jar.remove(removal),
        Json(LogoutResponse { success: true }),
    )
}

// ─── Profile ─────────────────────────────────────────────────

/// Get the current user's profile.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user.user_id)))?;

    Ok(Json(PublicUser::from(&profile)))
}

/// Allow-listed mutable profile fields. Email, role and credentials cannot
/// be changed through this route.
#[derive(Deserialize, Default)]
struct ProfileUpdate {
    name: Option<String>,
    avatar_url: Option<String>,
}

/// Update the current user's profile from the allow-listed field set.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<PublicUser>> {
    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user.user_id)))?;

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.len() < 3 || name.len() > 30 {
            return Err(AppError::Validation(
                "name must be between 3 and 30 characters".to_string(),
            ));
        }
        profile.name = name;
    }
    if let Some(avatar_url) = update.avatar_url {
        profile.avatar_url = Some(avatar_url);
    }

    state.db.upsert_user(&profile).await?;
    Ok(Json(PublicUser::from(&profile)))
}
