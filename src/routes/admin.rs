// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin dashboard routes: sales rollups across users and courses.

use crate::error::Result;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Admin routes (require_auth + require_admin layered in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/admin/dashboard/users", get(sales_by_user))
        .route("/api/v1/admin/dashboard/courses", get(sales_by_course))
}

// ─── Sales by User ───────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPurchaseEntry {
    pub course_id: String,
    pub course_title: String,
    pub purchase_date: String,
    pub expiration_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSales {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub purchased_courses: Vec<UserPurchaseEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesByUserResponse {
    pub success: bool,
    pub total_users: usize,
    pub user_courses: Vec<UserSales>,
}

/// Per-user listing of currently-active purchases.
async fn sales_by_user(State(state): State<Arc<AppState>>) -> Result<Json<SalesByUserResponse>> {
    let users = state.db.list_users().await?;
    let ledgers = state.db.list_entitlements().await?;
    let courses = state.db.list_courses().await?;
    let now = chrono::Utc::now();

    let titles: HashMap<&str, &str> = courses
        .iter()
        .map(|c| (c.id.as_str(), c.title.as_str()))
        .collect();

    let mut user_courses = Vec::new();
    for ledger in &ledgers {
        let Some(user) = users.iter().find(|u| u.id == ledger.user_id) else {
            continue;
        };

        let mut purchased_courses = Vec::new();
        for course in &ledger.purchased_courses {
            let title = titles
                .get(course.course_id.as_str())
                .copied()
                .unwrap_or("(removed)");
            for window in course.windows.iter().filter(|w| w.expiration_date > now) {
                purchased_courses.push(UserPurchaseEntry {
                    course_id: course.course_id.clone(),
                    course_title: title.to_string(),
                    purchase_date: format_utc_rfc3339(window.purchase_date),
                    expiration_date: format_utc_rfc3339(window.expiration_date),
                });
            }
        }

        user_courses.push(UserSales {
            user_id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            purchased_courses,
        });
    }

    Ok(Json(SalesByUserResponse {
        success: true,
        total_users: users.len(),
        user_courses,
    }))
}

// ─── Sales by Course ─────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSales {
    pub course_id: String,
    pub title: String,
    pub category: String,
    pub price: u64,
    /// Number of users holding an active window
    pub active_purchases: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesByCourseResponse {
    pub success: bool,
    pub total_courses: usize,
    pub courses: Vec<CourseSales>,
}

/// Per-course count of active purchases.
async fn sales_by_course(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SalesByCourseResponse>> {
    let courses = state.db.list_courses().await?;
    let ledgers = state.db.list_entitlements().await?;
    let now = chrono::Utc::now();

    let rollup = courses
        .iter()
        .map(|course| {
            let active_purchases = ledgers
                .iter()
                .filter(|ledger| ledger.has_active_access(&course.id, now))
                .count() as u32;

            CourseSales {
                course_id: course.id.clone(),
                title: course.title.clone(),
                category: course.category.clone(),
                price: course.price,
                active_purchases,
            }
        })
        .collect();

    Ok(Json(SalesByCourseResponse {
        success: true,
        total_courses: courses.len(),
        courses: rollup,
    }))
}
