// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course catalog model for storage and API.

use serde::{Deserialize, Serialize};

/// A single lecture inside a course. The video URL is the protected content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    pub lecture_id: String,
    pub name: String,
    pub description: String,
    /// Video URL (blob-storage collaborator output)
    pub video_url: String,
}

/// Course stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course ID (also used as document ID)
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Display name of the instructor
    pub created_by: String,
    /// Single purchase amount (smallest currency unit)
    pub price: u64,
    /// Access duration granted by a purchase, in 30-day months
    pub expiry_months: u32,
    pub number_of_lectures: u32,
    /// Thumbnail URL (blob-storage collaborator output)
    pub thumbnail_url: Option<String>,
    /// Lectures are stripped from public catalog responses
    #[serde(default)]
    pub lectures: Vec<Lecture>,
    pub created_at: String,
}

/// Allow-listed mutable fields for course updates.
///
/// Updates assign only from these; `id`, `lectures` and `created_at` cannot
/// be touched through the update route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub price: Option<u64>,
    pub expiry_months: Option<u32>,
    pub thumbnail_url: Option<String>,
}

impl Course {
    /// Apply an allow-listed update in place.
    pub fn apply_update(&mut self, update: CourseUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(created_by) = update.created_by {
            self.created_by = created_by;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(expiry_months) = update.expiry_months {
            self.expiry_months = expiry_months;
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            self.thumbnail_url = Some(thumbnail_url);
        }
    }

    /// Catalog projection: course metadata without the protected lectures.
    pub fn without_lectures(&self) -> Course {
        Course {
            lectures: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_course() -> Course {
        Course {
            id: "c1".to_string(),
            title: "Rust for Backend Engineers".to_string(),
            description: "Ownership to production".to_string(),
            category: "programming".to_string(),
            created_by: "Ada".to_string(),
            price: 4999,
            expiry_months: 12,
            number_of_lectures: 1,
            thumbnail_url: None,
            lectures: vec![Lecture {
                lecture_id: "l1".to_string(),
                name: "Intro".to_string(),
                description: "Hello".to_string(),
                video_url: "https://cdn.example.com/l1.mp4".to_string(),
            }],
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_apply_update_only_touches_allowed_fields() {
        let mut course = make_course();
        course.apply_update(CourseUpdate {
            title: Some("Rust, Deeply".to_string()),
            price: Some(5999),
            ..Default::default()
        });

        assert_eq!(course.title, "Rust, Deeply");
        assert_eq!(course.price, 5999);
        // untouched fields survive
        assert_eq!(course.category, "programming");
        assert_eq!(course.lectures.len(), 1);
    }

    #[test]
    fn test_without_lectures_strips_content() {
        let course = make_course();
        let public = course.without_lectures();
        assert!(public.lectures.is_empty());
        assert_eq!(public.number_of_lectures, 1);
    }
}
