// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! My-course routes: purchased course list and lecture progress.
//!
//! Everything under `/{course_id}` sits behind the access-control guard
//! (admins pass; everyone else needs an active entitlement window).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::progress::CourseProgress;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Purchased-course listing (auth only).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/my-course", get(my_courses))
}

/// Per-course progress routes (auth + access guard; layered in
/// routes/mod.rs).
pub fn guarded_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/v1/my-course/{course_id}",
        get(course_progress)
            .post(add_note)
            .put(set_mark)
            .delete(delete_note),
    )
}

// ─── Course List ─────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyCourseSummary {
    pub course_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyCoursesResponse {
    pub success: bool,
    pub course_list: Vec<MyCourseSummary>,
}

/// Courses the user currently holds an active window for.
async fn my_courses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MyCoursesResponse>> {
    let Some(ledger) = state.db.get_entitlement(&user.user_id).await? else {
        return Ok(Json(MyCoursesResponse {
            success: true,
            course_list: vec![],
        }));
    };

    let mut course_list = Vec::new();
    for course_id in ledger.active_course_ids(chrono::Utc::now()) {
        // Courses deleted from the catalog simply drop out of the listing
        if let Some(course) = state.db.get_course(&course_id).await? {
            course_list.push(MyCourseSummary {
                course_id: course.id,
                title: course.title,
                thumbnail_url: course.thumbnail_url,
            });
        }
    }

    Ok(Json(MyCoursesResponse {
        success: true,
        course_list,
    }))
}

// ─── Lecture Progress ────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressResponse {
    pub success: bool,
    pub course_progress: CourseProgress,
}

/// Progress for one purchased course.
async fn course_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseProgressResponse>> {
    let course_progress = state
        .db
        .get_progress(&user.user_id)
        .await?
        .and_then(|p| p.course(&course_id).cloned())
        .unwrap_or(CourseProgress {
            course_id: course_id.clone(),
            lectures: vec![],
        });

    Ok(Json(CourseProgressResponse {
        success: true,
        course_progress,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LectureQuery {
    lecture_id: String,
}

#[derive(Deserialize)]
struct AddNoteRequest {
    note: String,
}

#[derive(Serialize)]
pub struct ProgressMutationResponse {
    pub success: bool,
    pub message: String,
}

/// Add a note to a lecture (set semantics; entries created on demand).
async fn add_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    Query(query): Query<LectureQuery>,
    Json(payload): Json<AddNoteRequest>,
) -> Result<Json<ProgressMutationResponse>> {
    let note = payload.note.trim();
    if note.is_empty() {
        return Err(AppError::Validation("note text is required".to_string()));
    }
    if note.len() > 200 {
        return Err(AppError::Validation(
            "write note less than 200 characters".to_string(),
        ));
    }

    state
        .db
        .add_note(&user.user_id, &course_id, &query.lecture_id, note)
        .await?;

    Ok(Json(ProgressMutationResponse {
        success: true,
        message: "note added successfully".to_string(),
    }))
}

#[derive(Deserialize)]
struct SetMarkRequest {
    checked: bool,
}

/// Set or clear the lecture checkbox (idempotent).
async fn set_mark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    Query(query): Query<LectureQuery>,
    Json(payload): Json<SetMarkRequest>,
) -> Result<Json<ProgressMutationResponse>> {
    state
        .db
        .set_lecture_mark(&user.user_id, &course_id, &query.lecture_id, payload.checked)
        .await?;

    Ok(Json(ProgressMutationResponse {
        success: true,
        message: format!(
            "lecture {}",
            if payload.checked { "marked" } else { "unmarked" }
        ),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteNoteRequest {
    note_index: usize,
}

/// Delete one note by index; 404 when the lecture or index is absent.
async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    Query(query): Query<LectureQuery>,
    Json(payload): Json<DeleteNoteRequest>,
) -> Result<Json<ProgressMutationResponse>> {
    state
        .db
        .delete_note(
            &user.user_id,
            &course_id,
            &query.lecture_id,
            payload.note_index,
        )
        .await?;

    Ok(Json(ProgressMutationResponse {
        success: true,
        message: "note removed from lecture progress".to_string(),
    }))
}
