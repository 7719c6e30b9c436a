//! Conversation and group membership types for Parley.
//!
//! A conversation is either one-to-one (the owner talking to a single implicit
//! `friendly` responder) or a group with explicit human and bot members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::message::Message;
use crate::persona::Persona;
use crate::tag::Tag;

/// A chat conversation owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation owned by `owner_id`.
    pub fn new(owner_id: Uuid, title: impl Into<String>, is_group: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            title: title.into(),
            is_group,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` owns this conversation.
    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        self.owner_id == *user_id
    }
}

/// Discriminant of a group member, as stored in the `member_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Human,
    Bot,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Human => write!(f, "human"),
            MemberKind::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for MemberKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(MemberKind::Human),
            "bot" => Ok(MemberKind::Bot),
            other => Err(format!("invalid member type: '{other}'")),
        }
    }
}

/// Who a group member is: a human user or a scripted bot with a persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "member_type", rename_all = "lowercase")]
pub enum Participant {
    Human { user_id: Uuid },
    Bot { persona: Persona },
}

impl Participant {
    pub fn kind(&self) -> MemberKind {
        match self {
            Participant::Human { .. } => MemberKind::Human,
            Participant::Bot { .. } => MemberKind::Bot,
        }
    }
}

/// A member of a group conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub conversation_id: Uuid,
    #[serde(flatten)]
    pub participant: Participant,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    /// A human member referencing `user_id`.
    pub fn human(conversation_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            participant: Participant::Human { user_id },
            joined_at: Utc::now(),
        }
    }

    /// A bot member speaking as `persona`.
    pub fn bot(conversation_id: Uuid, persona: Persona) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            participant: Participant::Bot { persona },
            joined_at: Utc::now(),
        }
    }

    /// The user this member refers to, for human members.
    pub fn user_id(&self) -> Option<Uuid> {
        match &self.participant {
            Participant::Human { user_id } => Some(*user_id),
            Participant::Bot { .. } => None,
        }
    }

    /// View this member as a bot responder, if it is one.
    pub fn as_bot(&self) -> Option<BotMember> {
        match &self.participant {
            Participant::Bot { persona } => Some(BotMember {
                member_id: self.id,
                persona: persona.clone(),
            }),
            Participant::Human { .. } => None,
        }
    }
}

/// A bot participant eligible to answer a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotMember {
    /// The group member row this bot is stored as; used as the reply's sender.
    pub member_id: Uuid,
    pub persona: Persona,
}

/// A conversation with what a listing needs to show it: its newest message,
/// tags, and members.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub latest_message: Option<Message>,
    pub tags: Vec<Tag>,
    pub members: Vec<GroupMember>,
}
