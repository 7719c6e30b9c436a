//! Loop guard preventing runaway bot-to-bot exchanges.
//!
//! Looks at the most recent messages of a conversation: when the window holds
//! at least two messages and all of them are automated, bots stay quiet.

use parley_types::error::RepositoryError;
use parley_types::message::Message;
use tracing::debug;
use uuid::Uuid;

use crate::repository::SortOrder;
use crate::repository::message::MessageRepository;

/// Default number of recent messages inspected.
pub const DEFAULT_WINDOW: usize = 3;

/// Fewest messages the window must hold before it can trip.
const MIN_MESSAGES: usize = 2;

/// Recent-history heuristic deciding whether bots may auto-respond.
#[derive(Debug, Clone, Copy)]
pub struct LoopGuard {
    window: usize,
}

impl LoopGuard {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(MIN_MESSAGES),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Decide from `recent` messages (newest first, at most `window` long).
    pub fn evaluate(&self, recent: &[Message]) -> bool {
        let window = &recent[..recent.len().min(self.window)];
        if window.len() < MIN_MESSAGES {
            return true;
        }
        !window.iter().all(Message::is_automated)
    }

    /// Fetch the recent window of `conversation_id` and evaluate it.
    pub async fn is_auto_response_safe<M: MessageRepository>(
        &self,
        messages: &M,
        conversation_id: &Uuid,
    ) -> Result<bool, RepositoryError> {
        let limit = u32::try_from(self.window).unwrap_or(u32::MAX);
        let recent = messages
            .list_messages(conversation_id, SortOrder::Desc, Some(limit))
            .await?;
        let safe = self.evaluate(&recent);
        if !safe {
            debug!(conversation_id = %conversation_id, window = self.window, "loop guard tripped");
        }
        Ok(safe)
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
