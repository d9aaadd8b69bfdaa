// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversation model: chatrooms, per-participant unread counters, messages.
//!
//! A chatroom's document ID is the canonical pair key of its two
//! participants, so pair uniqueness is a storage invariant and
//! find-or-create is idempotent in either argument order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unread-message counter for one participant of a chatroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCount {
    pub user: String,
    pub count: u32,
}

/// Durable pairing of two participants plus their unread counters.
///
/// Invariant: every participant has exactly one `unread_counts` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chatroom {
    /// Chatroom ID (also used as document ID): `pair_key(a, b)`
    pub id: String,
    pub participants: Vec<String>,
    pub unread_counts: Vec<UnreadCount>,
    pub created_at: String,
}

/// Canonical chatroom key for a participant pair, independent of order.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}_{}", a, b)
    } else {
        format!("{}_{}", b, a)
    }
}

impl Chatroom {
    /// Create a chatroom for a pair with both counters zeroed.
    pub fn new(a: &str, b: &str, created_at: String) -> Self {
        Self {
            id: pair_key(a, b),
            participants: vec![a.to_string(), b.to_string()],
            unread_counts: vec![
                UnreadCount {
                    user: a.to_string(),
                    count: 0,
                },
                UnreadCount {
                    user: b.to_string(),
                    count: 0,
                },
            ],
            created_at,
        }
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Increment the counter entry for `user_id` by one.
    ///
    /// Returns false (leaving the chatroom untouched) when no entry matches;
    /// callers treat that as a silent no-op.
    pub fn increment_unread(&mut self, user_id: &str) -> bool {
        match self.unread_counts.iter_mut().find(|c| c.user == user_id) {
            Some(entry) => {
                entry.count += 1;
                true
            }
            None => false,
        }
    }

    /// Reset the counter entry for `user_id` to exactly zero ("mark read").
    ///
    /// Returns false when no entry matches.
    pub fn reset_unread(&mut self, user_id: &str) -> bool {
        match self.unread_counts.iter_mut().find(|c| c.user == user_id) {
            Some(entry) => {
                entry.count = 0;
                true
            }
            None => false,
        }
    }

    pub fn unread_for(&self, user_id: &str) -> Option<u32> {
        self.unread_counts
            .iter()
            .find(|c| c.user == user_id)
            .map(|c| c.count)
    }

    /// The counterpart's counter entry, as returned by the unread-count
    /// listing: for each chatroom the requester sees the OTHER side's entry.
    pub fn counterpart_unread(&self, user_id: &str) -> Option<&UnreadCount> {
        self.unread_counts.iter().find(|c| c.user != user_id)
    }
}

/// Immutable chat message. Append-only; belongs to exactly one chatroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message ID (also used as document ID); v7 UUIDs sort by creation time
    pub id: String,
    pub sender: String,
    pub chatroom_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: &str, chatroom_id: &str, content: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            sender: sender.to_string(),
            chatroom_id: chatroom_id.to_string(),
            content: content.to_string(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(pair_key("alice", "bob"), pair_key("bob", "alice"));
        assert_eq!(pair_key("alice", "bob"), "alice_bob");
    }

    #[test]
    fn test_new_chatroom_zeroes_both_counters() {
        let room = Chatroom::new("b", "a", "2026-01-01T00:00:00.000Z".to_string());

        assert_eq!(room.id, "a_b");
        assert_eq!(room.participants.len(), 2);
        assert_eq!(room.unread_counts.len(), 2);
        assert_eq!(room.unread_for("a"), Some(0));
        assert_eq!(room.unread_for("b"), Some(0));
    }

    #[test]
    fn test_increment_unread_bumps_exactly_one_entry() {
        let mut room = Chatroom::new("a", "b", String::new());

        assert!(room.increment_unread("b"));
        assert!(room.increment_unread("b"));

        assert_eq!(room.unread_for("b"), Some(2));
        assert_eq!(room.unread_for("a"), Some(0));
    }

    #[test]
    fn test_increment_unread_missing_entry_is_noop() {
        let mut room = Chatroom::new("a", "b", String::new());

        assert!(!room.increment_unread("mallory"));
        assert_eq!(room.unread_for("a"), Some(0));
        assert_eq!(room.unread_for("b"), Some(0));
    }

    #[test]
    fn test_reset_unread_always_lands_on_zero() {
        let mut room = Chatroom::new("a", "b", String::new());

        // reset on an already-zero counter stays zero
        assert!(room.reset_unread("b"));
        assert_eq!(room.unread_for("b"), Some(0));

        for _ in 0..5 {
            room.increment_unread("b");
        }
        assert!(room.reset_unread("b"));
        assert_eq!(room.unread_for("b"), Some(0));
    }

    #[test]
    fn test_counterpart_unread_returns_other_side() {
        let mut room = Chatroom::new("a", "b", String::new());
        room.increment_unread("b");

        let entry = room.counterpart_unread("a").unwrap();
        assert_eq!(entry.user, "b");
        assert_eq!(entry.count, 1);
    }
}
