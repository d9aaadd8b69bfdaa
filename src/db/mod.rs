//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COURSES: &str = "courses";
    pub const CHATROOMS: &str = "chatrooms";
    pub const MESSAGES: &str = "messages";
    /// Entitlement ledger documents (keyed by user id)
    pub const ENTITLEMENTS: &str = "entitlements";
    /// Lecture progress documents (keyed by user id)
    pub const PROGRESS: &str = "progress";
}
