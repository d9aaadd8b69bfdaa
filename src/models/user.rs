//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User role. Admins manage the catalog and never purchase courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Argon2 password hash. Never exposed through the API.
    pub password_hash: String,
    pub role: Role,
    /// Avatar URL (blob-storage collaborator output)
    pub avatar_url: Option<String>,
    /// When the user registered (RFC3339)
    pub created_at: String,
}

/// Public projection of a user, safe to return from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar_url: user.avatar_url.clone(),
        }
    }
}
