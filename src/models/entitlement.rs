// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entitlement ledger: per-user purchase windows with time-bounded access.
//!
//! All mutations here are pure; the database layer applies them inside a
//! single document transaction keyed by user id.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A time-bounded grant of access to one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseWindow {
    pub purchase_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
}

/// All purchase windows a user holds for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasedCourse {
    pub course_id: String,
    pub windows: Vec<PurchaseWindow>,
}

/// Ledger document for one user (document ID = user ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub user_id: String,
    #[serde(default)]
    pub purchased_courses: Vec<PurchasedCourse>,
    /// Processed payment references, for verify idempotency
    #[serde(default)]
    pub processed_references: HashSet<String>,
}

/// Outcome of recording a purchase in the ledger.
#[derive(Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// A new window was appended (first purchase or renewal after expiry)
    Recorded,
    /// The payment reference was already processed; nothing changed
    AlreadyProcessed,
    /// The user holds an active window for this course
    AlreadyEntitled,
}

/// Access expiration: purchase date plus `months` fixed 30-day months.
///
/// This is the deliberate policy, not a calendar-accurate month.
pub fn expiration_for(purchase_date: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    purchase_date + Duration::days(30 * i64::from(months))
}

impl Entitlement {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            purchased_courses: Vec::new(),
            processed_references: HashSet::new(),
        }
    }

    /// True iff some window for `course_id` ends strictly after `now`.
    pub fn has_active_access(&self, course_id: &str, now: DateTime<Utc>) -> bool {
        self.purchased_courses
            .iter()
            .filter(|c| c.course_id == course_id)
            .flat_map(|c| c.windows.iter())
            .any(|w| w.expiration_date > now)
    }

    /// The active window for `course_id`, if any.
    pub fn active_window(&self, course_id: &str, now: DateTime<Utc>) -> Option<&PurchaseWindow> {
        self.purchased_courses
            .iter()
            .filter(|c| c.course_id == course_id)
            .flat_map(|c| c.windows.iter())
            .find(|w| w.expiration_date > now)
    }

    /// Record a purchase.
    ///
    /// Appends a window when the user has none for the course or all are
    /// expired; rejects when an active window exists. A `reference` that was
    /// already processed is an idempotent no-op regardless of window state.
    pub fn record_purchase(
        &mut self,
        course_id: &str,
        reference: &str,
        purchase_date: DateTime<Utc>,
        duration_months: u32,
    ) -> PurchaseOutcome {
        if self.processed_references.contains(reference) {
            return PurchaseOutcome::AlreadyProcessed;
        }

        if self.has_active_access(course_id, purchase_date) {
            return PurchaseOutcome::AlreadyEntitled;
        }

        let window = PurchaseWindow {
            purchase_date,
            expiration_date: expiration_for(purchase_date, duration_months),
        };

        match self
            .purchased_courses
            .iter_mut()
            .find(|c| c.course_id == course_id)
        {
            Some(entry) => entry.windows.push(window),
            None => self.purchased_courses.push(PurchasedCourse {
                course_id: course_id.to_string(),
                windows: vec![window],
            }),
        }

        self.processed_references.insert(reference.to_string());
        PurchaseOutcome::Recorded
    }

    /// Course IDs with an active window at `now` (for the my-courses listing).
    pub fn active_course_ids(&self, now: DateTime<Utc>) -> Vec<String> {
        self.purchased_courses
            .iter()
            .filter(|c| c.windows.iter().any(|w| w.expiration_date > now))
            .map(|c| c.course_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_expiration_is_exactly_thirty_day_months() {
        let expiration = expiration_for(t0(), 1);
        let delta = expiration - t0();
        assert_eq!(delta.num_milliseconds(), 2_592_000_000);

        let expiration = expiration_for(t0(), 3);
        assert_eq!((expiration - t0()).num_days(), 90);
    }

    #[test]
    fn test_access_boundary_is_exclusive_at_expiration() {
        let mut ledger = Entitlement::new("u1");
        assert_eq!(
            ledger.record_purchase("c1", "ref-1", t0(), 1),
            PurchaseOutcome::Recorded
        );

        let expiration = expiration_for(t0(), 1);
        assert!(ledger.has_active_access("c1", expiration - Duration::milliseconds(1)));
        assert!(!ledger.has_active_access("c1", expiration));
        assert!(!ledger.has_active_access("c1", expiration + Duration::milliseconds(1)));
    }

    #[test]
    fn test_purchase_with_active_window_conflicts() {
        let mut ledger = Entitlement::new("u1");
        ledger.record_purchase("c1", "ref-1", t0(), 1);

        let outcome = ledger.record_purchase("c1", "ref-2", t0() + Duration::days(10), 1);
        assert_eq!(outcome, PurchaseOutcome::AlreadyEntitled);
        assert_eq!(ledger.purchased_courses[0].windows.len(), 1);
    }

    #[test]
    fn test_renewal_after_expiry_appends_window() {
        let mut ledger = Entitlement::new("u1");
        ledger.record_purchase("c1", "ref-1", t0(), 1);

        let later = t0() + Duration::days(31);
        let outcome = ledger.record_purchase("c1", "ref-2", later, 2);
        assert_eq!(outcome, PurchaseOutcome::Recorded);

        // renewal appends rather than overwriting
        let windows = &ledger.purchased_courses[0].windows;
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].purchase_date, t0());
        assert_eq!(windows[1].purchase_date, later);
    }

    #[test]
    fn test_replayed_reference_is_idempotent() {
        let mut ledger = Entitlement::new("u1");
        ledger.record_purchase("c1", "ref-1", t0(), 1);

        let replay = ledger.record_purchase("c1", "ref-1", t0() + Duration::days(45), 1);
        assert_eq!(replay, PurchaseOutcome::AlreadyProcessed);
        assert_eq!(ledger.purchased_courses[0].windows.len(), 1);
    }

    #[test]
    fn test_distinct_courses_do_not_interfere() {
        let mut ledger = Entitlement::new("u1");
        ledger.record_purchase("c1", "ref-1", t0(), 1);

        assert_eq!(
            ledger.record_purchase("c2", "ref-2", t0(), 6),
            PurchaseOutcome::Recorded
        );
        assert!(ledger.has_active_access("c2", t0() + Duration::days(170)));
        assert!(!ledger.has_active_access("c1", t0() + Duration::days(170)));
    }

    #[test]
    fn test_active_course_ids_skips_expired() {
        let mut ledger = Entitlement::new("u1");
        ledger.record_purchase("c1", "ref-1", t0(), 1);
        ledger.record_purchase("c2", "ref-2", t0(), 12);

        let after_first_expired = t0() + Duration::days(60);
        assert_eq!(ledger.active_course_ids(after_first_expired), vec!["c2"]);
    }
}
