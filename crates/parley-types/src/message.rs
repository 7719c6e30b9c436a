//! Chat message types and the auto-reply outcome reported to senders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who produced a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (sender_kind IN ('human', 'automated_single', 'automated_group_bot'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// Written by a user (or a filler reply posted on a group member's behalf).
    Human,
    /// The implicit responder of a one-to-one conversation.
    AutomatedSingle,
    /// A bot member of a group conversation.
    AutomatedGroupBot,
}

impl SenderKind {
    pub fn is_automated(&self) -> bool {
        !matches!(self, SenderKind::Human)
    }
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderKind::Human => write!(f, "human"),
            SenderKind::AutomatedSingle => write!(f, "automated_single"),
            SenderKind::AutomatedGroupBot => write!(f, "automated_group_bot"),
        }
    }
}

impl FromStr for SenderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(SenderKind::Human),
            "automated_single" => Ok(SenderKind::AutomatedSingle),
            "automated_group_bot" => Ok(SenderKind::AutomatedGroupBot),
            other => Err(format!("invalid sender kind: '{other}'")),
        }
    }
}

/// A single message within a conversation.
///
/// Messages are ordered by `created_at` within a conversation; there are no
/// sequence numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub content: String,
    pub sender_kind: SenderKind,
    /// The sending user for human messages, the bot member for group bot
    /// replies, absent for one-to-one automated replies.
    pub sender_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        conversation_id: Uuid,
        content: impl Into<String>,
        sender_kind: SenderKind,
        sender_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            content: content.into(),
            sender_kind,
            sender_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_automated(&self) -> bool {
        self.sender_kind.is_automated()
    }
}

/// What happened to automated replies after a human message was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoReplyStatus {
    Scheduled,
    SkippedPrecedingAutomated,
    SkippedLoopGuard,
    SkippedNoBots,
}

impl AutoReplyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoReplyStatus::Scheduled => "scheduled",
            AutoReplyStatus::SkippedPrecedingAutomated => {
                "skipped: preceding message was automated"
            }
            AutoReplyStatus::SkippedLoopGuard => "skipped: loop guard triggered",
            AutoReplyStatus::SkippedNoBots => "skipped: no bots in group",
        }
    }
}

impl fmt::Display for AutoReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AutoReplyStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result of submitting a human message.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub message: Message,
    pub status: AutoReplyStatus,
    /// Automated (bot or one-to-one) replies scheduled.
    pub bot_replies: usize,
    /// Filler replies scheduled on behalf of other human members.
    pub filler_replies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_kind_roundtrip() {
        for kind in [
            SenderKind::Human,
            SenderKind::AutomatedSingle,
            SenderKind::AutomatedGroupBot,
        ] {
            let parsed: SenderKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_sender_kind_is_automated() {
        assert!(!SenderKind::Human.is_automated());
        assert!(SenderKind::AutomatedSingle.is_automated());
        assert!(SenderKind::AutomatedGroupBot.is_automated());
    }

    #[test]
    fn test_sender_kind_serde() {
        let json = serde_json::to_string(&SenderKind::AutomatedGroupBot).unwrap();
        assert_eq!(json, "\"automated_group_bot\"");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(AutoReplyStatus::Scheduled.to_string(), "scheduled");
        assert_eq!(
            AutoReplyStatus::SkippedPrecedingAutomated.to_string(),
            "skipped: preceding message was automated"
        );
        assert_eq!(
            AutoReplyStatus::SkippedLoopGuard.to_string(),
            "skipped: loop guard triggered"
        );
        assert_eq!(
            AutoReplyStatus::SkippedNoBots.to_string(),
            "skipped: no bots in group"
        );
    }

    #[test]
    fn test_submit_outcome_serializes_status_string() {
        let outcome = SubmitOutcome {
            message: Message::new(Uuid::now_v7(), "hello", SenderKind::Human, None),
            status: AutoReplyStatus::SkippedNoBots,
            bot_replies: 0,
            filler_replies: 2,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped: no bots in group");
        assert_eq!(json["message"]["sender_kind"], "human");
        assert_eq!(json["filler_replies"], 2);
    }
}
