//! Conversation access checks shared by the orchestrator and services.

use parley_types::conversation::Conversation;
use parley_types::error::ChatError;
use uuid::Uuid;

use crate::repository::conversation::ConversationRepository;

/// Load a conversation the user may read and write messages in.
///
/// Allowed: the owner, or a human member of a group conversation.
pub async fn authorize<C: ConversationRepository>(
    conversations: &C,
    user_id: &Uuid,
    conversation_id: &Uuid,
) -> Result<Conversation, ChatError> {
    let conversation = conversations
        .get_conversation(conversation_id)
        .await?
        .ok_or(ChatError::ConversationNotFound)?;

    if conversation.is_owned_by(user_id) {
        return Ok(conversation);
    }
    if conversation.is_group && conversations.is_member(conversation_id, user_id).await? {
        return Ok(conversation);
    }
    Err(ChatError::Forbidden)
}

/// Load a conversation only its owner may modify.
pub async fn require_owner<C: ConversationRepository>(
    conversations: &C,
    user_id: &Uuid,
    conversation_id: &Uuid,
) -> Result<Conversation, ChatError> {
    let conversation = conversations
        .get_conversation(conversation_id)
        .await?
        .ok_or(ChatError::ConversationNotFound)?;

    if conversation.is_owned_by(user_id) {
        Ok(conversation)
    } else {
        Err(ChatError::Forbidden)
    }
}
