//! Conversation management service.
//!
//! Creating, renaming, and deleting conversations, managing group members,
//! and reading or deleting messages. Mutations of the conversation itself are
//! owner-only; reads are open to the owner and human group members.

use chrono::Utc;
use parley_types::conversation::{Conversation, ConversationSummary, GroupMember};
use parley_types::error::ChatError;
use parley_types::message::{Message, SenderKind};
use parley_types::persona::Persona;
use tracing::info;
use uuid::Uuid;

use crate::repository::SortOrder;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;
use crate::repository::tag::TagRepository;
use crate::repository::user::UserRepository;
use crate::service::access::{authorize, require_owner};

/// Longest accepted conversation title, in characters.
pub const MAX_TITLE_LEN: usize = 100;

fn validate_title(title: &str) -> Result<String, ChatError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ChatError::Validation("title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ChatError::Validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

/// Service for conversations, their members, and message history.
///
/// Generic over repository traits -- parley-core never depends on parley-infra.
pub struct ConversationService<C, M, U, T>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserRepository,
    T: TagRepository,
{
    conversations: C,
    messages: M,
    users: U,
    tags: T,
}

impl<C, M, U, T> ConversationService<C, M, U, T>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserRepository,
    T: TagRepository,
{
    pub fn new(conversations: C, messages: M, users: U, tags: T) -> Self {
        Self {
            conversations,
            messages,
            users,
            tags,
        }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        title: &str,
        is_group: bool,
    ) -> Result<Conversation, ChatError> {
        let title = validate_title(title)?;
        let conversation = self
            .conversations
            .create_conversation(&Conversation::new(owner_id, title, is_group))
            .await?;
        info!(conversation_id = %conversation.id, is_group, "conversation created");
        Ok(conversation)
    }

    /// Conversations the user owns or belongs to, most recently updated first.
    pub async fn list(&self, user_id: &Uuid) -> Result<Vec<Conversation>, ChatError> {
        Ok(self.conversations.list_conversations(user_id).await?)
    }

    /// Like [`Self::list`], with each conversation's newest message, tags,
    /// and members attached.
    pub async fn list_summaries(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let conversations = self.list(user_id).await?;
        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let latest_message = self
                .messages
                .list_messages(&conversation.id, SortOrder::Desc, Some(1))
                .await?
                .into_iter()
                .next();
            let tags = self.tags.list_conversation_tags(&conversation.id).await?;
            let members = self.conversations.list_members(&conversation.id).await?;
            summaries.push(ConversationSummary {
                conversation,
                latest_message,
                tags,
                members,
            });
        }
        Ok(summaries)
    }

    pub async fn get(&self, user_id: &Uuid, conversation_id: &Uuid) -> Result<Conversation, ChatError> {
        authorize(&self.conversations, user_id, conversation_id).await
    }

    pub async fn rename(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        title: &str,
    ) -> Result<Conversation, ChatError> {
        let title = validate_title(title)?;
        let mut conversation = require_owner(&self.conversations, user_id, conversation_id).await?;
        conversation.title = title;
        conversation.updated_at = Utc::now();
        self.conversations.update_conversation(&conversation).await?;
        Ok(conversation)
    }

    /// Delete a conversation with its members, messages, and tag links.
    ///
    /// Replies already scheduled for it are not cancelled; storing them fails
    /// and is logged by the reply task.
    pub async fn delete(&self, user_id: &Uuid, conversation_id: &Uuid) -> Result<(), ChatError> {
        require_owner(&self.conversations, user_id, conversation_id).await?;
        self.conversations.delete_conversation(conversation_id).await?;
        info!(conversation_id = %conversation_id, "conversation deleted");
        Ok(())
    }

    /// Add a human member. A direct conversation becomes a group.
    pub async fn add_member(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        member_user_id: Uuid,
    ) -> Result<GroupMember, ChatError> {
        let conversation = require_owner(&self.conversations, user_id, conversation_id).await?;
        self.users
            .get_user(&member_user_id)
            .await?
            .ok_or(ChatError::UserNotFound)?;

        let member = GroupMember::human(conversation.id, member_user_id);
        self.conversations.add_member(&member).await?;
        self.ensure_group(conversation).await?;
        info!(conversation_id = %conversation_id, member = %member_user_id, "human member added");
        Ok(member)
    }

    /// Add a bot member speaking as `persona` (default `friendly`). A direct
    /// conversation becomes a group.
    pub async fn add_bot(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        persona: Option<Persona>,
    ) -> Result<GroupMember, ChatError> {
        let conversation = require_owner(&self.conversations, user_id, conversation_id).await?;
        let member = GroupMember::bot(conversation.id, persona.unwrap_or_default());
        self.conversations.add_member(&member).await?;
        self.ensure_group(conversation).await?;
        info!(conversation_id = %conversation_id, member = %member.id, "bot member added");
        Ok(member)
    }

    async fn ensure_group(&self, mut conversation: Conversation) -> Result<(), ChatError> {
        if conversation.is_group {
            return Ok(());
        }
        conversation.is_group = true;
        conversation.updated_at = Utc::now();
        self.conversations.update_conversation(&conversation).await?;
        Ok(())
    }

    pub async fn list_members(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<Vec<GroupMember>, ChatError> {
        authorize(&self.conversations, user_id, conversation_id).await?;
        Ok(self.conversations.list_members(conversation_id).await?)
    }

    /// Message history, oldest first. With a `limit`, the newest `limit`
    /// messages, still oldest first.
    pub async fn list_messages(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, ChatError> {
        authorize(&self.conversations, user_id, conversation_id).await?;
        match limit {
            None => Ok(self
                .messages
                .list_messages(conversation_id, SortOrder::Asc, None)
                .await?),
            Some(limit) => {
                let mut newest = self
                    .messages
                    .list_messages(conversation_id, SortOrder::Desc, Some(limit))
                    .await?;
                newest.reverse();
                Ok(newest)
            }
        }
    }

    /// Delete a message. Only the human who sent it may do so.
    pub async fn delete_message(&self, user_id: &Uuid, message_id: &Uuid) -> Result<(), ChatError> {
        let message = self
            .messages
            .get_message(message_id)
            .await?
            .ok_or(ChatError::MessageNotFound)?;

        if message.sender_kind != SenderKind::Human || message.sender_id != Some(*user_id) {
            return Err(ChatError::Forbidden);
        }
        self.messages.delete_message(message_id).await?;
        Ok(())
    }
}
