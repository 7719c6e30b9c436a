//! Conversation tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#007bff";

/// A user-owned label that can be attached to any of the owner's conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(owner_id: Uuid, name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            name: name.into(),
            color: color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
            created_at: Utc::now(),
        }
    }
}
