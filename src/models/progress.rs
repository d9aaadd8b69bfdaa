// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lecture progress: per-user, per-course checkbox and notes state.
//!
//! Course entries are seeded at purchase verification and created lazily on
//! first write if the seed was lost. Lecture entries are always lazy.

use serde::{Deserialize, Serialize};

/// Progress state for one lecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureProgress {
    pub lecture_id: String,
    #[serde(default)]
    pub marked: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Progress for one purchased course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseProgress {
    pub course_id: String,
    #[serde(default)]
    pub lectures: Vec<LectureProgress>,
}

/// Progress document for one user (document ID = user ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub user_id: String,
    #[serde(default)]
    pub courses: Vec<CourseProgress>,
}

/// Failure of a progress mutation.
#[derive(Debug, PartialEq, Eq)]
pub enum ProgressError {
    /// Lecture entry absent or note index out of range
    NoteNotFound,
}

impl Progress {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            courses: Vec::new(),
        }
    }

    /// Ensure a course entry exists (idempotent). Used to seed progress at
    /// purchase verification.
    pub fn ensure_course(&mut self, course_id: &str) -> &mut CourseProgress {
        if let Some(idx) = self.courses.iter().position(|c| c.course_id == course_id) {
            return &mut self.courses[idx];
        }
        self.courses.push(CourseProgress {
            course_id: course_id.to_string(),
            lectures: Vec::new(),
        });
        self.courses.last_mut().expect("just pushed")
    }

    pub fn course(&self, course_id: &str) -> Option<&CourseProgress> {
        self.courses.iter().find(|c| c.course_id == course_id)
    }

    fn ensure_lecture<'a>(course: &'a mut CourseProgress, lecture_id: &str) -> &'a mut LectureProgress {
        if let Some(idx) = course
            .lectures
            .iter()
            .position(|l| l.lecture_id == lecture_id)
        {
            return &mut course.lectures[idx];
        }
        course.lectures.push(LectureProgress {
            lecture_id: lecture_id.to_string(),
            marked: false,
            notes: Vec::new(),
        });
        course.lectures.last_mut().expect("just pushed")
    }

    /// Append a note with set semantics: identical text is not re-added.
    ///
    /// Returns true when the note was added.
    pub fn add_note(&mut self, course_id: &str, lecture_id: &str, note: &str) -> bool {
        let course = self.ensure_course(course_id);
        let lecture = Self::ensure_lecture(course, lecture_id);

        if lecture.notes.iter().any(|n| n == note) {
            return false;
        }
        lecture.notes.push(note.to_string());
        true
    }

    /// Idempotent set of the lecture checkbox.
    pub fn set_mark(&mut self, course_id: &str, lecture_id: &str, marked: bool) {
        let course = self.ensure_course(course_id);
        let lecture = Self::ensure_lecture(course, lecture_id);
        lecture.marked = marked;
    }

    /// Delete a note by index. Bounds are validated before any mutation.
    pub fn delete_note(
        &mut self,
        course_id: &str,
        lecture_id: &str,
        index: usize,
    ) -> Result<(), ProgressError> {
        let lecture = self
            .courses
            .iter_mut()
            .find(|c| c.course_id == course_id)
            .and_then(|c| {
                c.lectures
                    .iter_mut()
                    .find(|l| l.lecture_id == lecture_id)
            })
            .ok_or(ProgressError::NoteNotFound)?;

        if index >= lecture.notes.len() {
            return Err(ProgressError::NoteNotFound);
        }
        lecture.notes.remove(index);
        Ok(())
    }
}
