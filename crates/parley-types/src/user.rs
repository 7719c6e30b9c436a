//! User identity types.
//!
//! Parley does not manage passwords. A user is an identity that owns
//! conversations and tags, and authenticates with one or more API keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered chat user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Unique login/display name.
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh UUIDv7 identity.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            created_at: Utc::now(),
        }
    }
}

/// Validate a username: 3-32 characters of ASCII letters, digits, `_` or `-`.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(format!("username must be 3-32 characters, got {len}"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("username may only contain letters, digits, '_' and '-'".to_string());
    }
    Ok(())
}
