// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course catalog routes.
//!
//! The catalog (list/detail) is public but never exposes lectures; lecture
//! content sits behind the entitlement guard applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::models::course::CourseUpdate;
use crate::models::{Course, Lecture};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Public catalog routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/course", get(list_courses))
        .route("/api/v1/course/{course_id}", get(get_course))
}

/// Admin-only catalog mutations (require_auth + require_admin layered in
/// routes/mod.rs).
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/course", post(create_course))
        .route(
            "/api/v1/course/{course_id}",
            axum::routing::put(update_course).delete(delete_course),
        )
}

/// Lecture-content routes, behind the access-control guard.
pub fn content_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/course/{course_id}/lectures", get(get_lectures))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CourseListResponse {
    pub success: bool,
    pub courses: Vec<Course>,
}

/// List the catalog (lectures stripped).
async fn list_courses(State(state): State<Arc<AppState>>) -> Result<Json<CourseListResponse>> {
    let courses = state
        .db
        .list_courses()
        .await?
        .iter()
        .map(Course::without_lectures)
        .collect();

    Ok(Json(CourseListResponse {
        success: true,
        courses,
    }))
}

/// Course detail (lectures stripped).
async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>> {
    let course = state
        .db
        .get_course(&course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} not found", course_id)))?;

    Ok(Json(course.without_lectures()))
}

// ─── Lecture Content (guarded) ───────────────────────────────

#[derive(Serialize)]
pub struct LecturesResponse {
    pub success: bool,
    pub lectures: Vec<Lecture>,
}

/// Protected lecture content; the access guard has already allowed this
/// request, so a missing course here is a plain 404.
async fn get_lectures(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<LecturesResponse>> {
    let course = state
        .db
        .get_course(&course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} not found", course_id)))?;

    Ok(Json(LecturesResponse {
        success: true,
        lectures: course.lectures,
    }))
}

// ─── Admin Mutations ─────────────────────────────────────────

#[derive(Deserialize)]
struct CreateCourseRequest {
    title: String,
    description: String,
    category: String,
    created_by: String,
    price: u64,
    expiry_months: u32,
    thumbnail_url: Option<String>,
    #[serde(default)]
    lectures: Vec<LectureInput>,
}

#[derive(Deserialize)]
struct LectureInput {
    name: String,
    description: String,
    video_url: String,
}

/// Create a catalog entry.
async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<Json<Course>> {
    if payload.title.trim().len() < 5 {
        return Err(AppError::Validation(
            "title must be at least 5 characters".to_string(),
        ));
    }
    if payload.expiry_months == 0 {
        return Err(AppError::Validation(
            "expiry_months must be at least 1".to_string(),
        ));
    }

    let lectures: Vec<Lecture> = payload
        .lectures
        .into_iter()
        .map(|l| Lecture {
            lecture_id: uuid::Uuid::new_v4().to_string(),
            name: l.name,
            description: l.description,
            video_url: l.video_url,
        })
        .collect();

    let course = Course {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title.trim().to_string(),
        description: payload.description,
        category: payload.category,
        created_by: payload.created_by,
        price: payload.price,
        expiry_months: payload.expiry_months,
        number_of_lectures: lectures.len() as u32,
        thumbnail_url: payload.thumbnail_url,
        lectures,
        created_at: crate::time_utils::format_utc_rfc3339(chrono::Utc::now()),
    };

    state.db.upsert_course(&course).await?;
    tracing::info!(course_id = %course.id, title = %course.title, "Course created");

    Ok(Json(course.without_lectures()))
}

/// Update a course from the allow-listed field set.
async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    Json(update): Json<CourseUpdate>,
) -> Result<Json<Course>> {
    let mut course = state
        .db
        .get_course(&course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} not found", course_id)))?;

    course.apply_update(update);
    state.db.upsert_course(&course).await?;

    Ok(Json(course.without_lectures()))
}

#[derive(Serialize)]
pub struct DeleteCourseResponse {
    pub success: bool,
}

/// Remove a course from the catalog.
async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<DeleteCourseResponse>> {
    if state.db.get_course(&course_id).await?.is_none() {
        return Err(AppError::NotFound(format!("course {} not found", course_id)));
    }

    state.db.delete_course(&course_id).await?;
    tracing::info!(course_id = %course_id, "Course deleted");

    Ok(Json(DeleteCourseResponse { success: true }))
}
