//! Tag management service.

use parley_types::conversation::Conversation;
use parley_types::error::ChatError;
use parley_types::tag::Tag;
use tracing::info;
use uuid::Uuid;

use crate::repository::conversation::ConversationRepository;
use crate::repository::tag::TagRepository;
use crate::service::access::require_owner;

/// Longest accepted tag name, in characters.
pub const MAX_TAG_NAME_LEN: usize = 50;

fn validate_name(name: &str) -> Result<String, ChatError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatError::Validation("tag name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(ChatError::Validation(format!(
            "tag name cannot exceed {MAX_TAG_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Accepts `#rgb` or `#rrggbb` hex colors.
fn validate_color(color: &str) -> Result<String, ChatError> {
    let color = color.trim();
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(color.to_lowercase())
    } else {
        Err(ChatError::Validation(format!("invalid color: '{color}'")))
    }
}

/// Service for user-owned tags and their links to conversations.
pub struct TagService<T: TagRepository, C: ConversationRepository> {
    tags: T,
    conversations: C,
}

impl<T: TagRepository, C: ConversationRepository> TagService<T, C> {
    pub fn new(tags: T, conversations: C) -> Self {
        Self { tags, conversations }
    }

    /// A tag owned by `owner_id`. Tags of other users look missing.
    async fn owned_tag(&self, owner_id: &Uuid, tag_id: &Uuid) -> Result<Tag, ChatError> {
        match self.tags.get_tag(tag_id).await? {
            Some(tag) if tag.owner_id == *owner_id => Ok(tag),
            _ => Err(ChatError::TagNotFound),
        }
    }

    pub async fn list(&self, owner_id: &Uuid) -> Result<Vec<Tag>, ChatError> {
        Ok(self.tags.list_tags(owner_id).await?)
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Tag, ChatError> {
        let name = validate_name(name)?;
        let color = color.map(validate_color).transpose()?;
        let tag = self.tags.create_tag(&Tag::new(owner_id, name, color)).await?;
        info!(tag_id = %tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub async fn update(
        &self,
        owner_id: &Uuid,
        tag_id: &Uuid,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Tag, ChatError> {
        let mut tag = self.owned_tag(owner_id, tag_id).await?;
        if let Some(name) = name {
            tag.name = validate_name(name)?;
        }
        if let Some(color) = color {
            tag.color = validate_color(color)?;
        }
        self.tags.update_tag(&tag).await?;
        Ok(tag)
    }

    pub async fn delete(&self, owner_id: &Uuid, tag_id: &Uuid) -> Result<(), ChatError> {
        self.owned_tag(owner_id, tag_id).await?;
        self.tags.delete_tag(tag_id).await?;
        info!(tag_id = %tag_id, "tag deleted");
        Ok(())
    }

    /// Attach one of the user's tags to one of their conversations.
    pub async fn attach(
        &self,
        owner_id: &Uuid,
        conversation_id: &Uuid,
        tag_id: &Uuid,
    ) -> Result<(), ChatError> {
        require_owner(&self.conversations, owner_id, conversation_id).await?;
        self.owned_tag(owner_id, tag_id).await?;
        self.tags.attach_tag(conversation_id, tag_id).await?;
        Ok(())
    }

    /// Detach a tag. `TagNotFound` if it was not attached.
    pub async fn detach(
        &self,
        owner_id: &Uuid,
        conversation_id: &Uuid,
        tag_id: &Uuid,
    ) -> Result<(), ChatError> {
        require_owner(&self.conversations, owner_id, conversation_id).await?;
        self.owned_tag(owner_id, tag_id).await?;
        if self.tags.detach_tag(conversation_id, tag_id).await? {
            Ok(())
        } else {
            Err(ChatError::TagNotFound)
        }
    }

    /// Tags on a conversation the user owns.
    pub async fn conversation_tags(
        &self,
        owner_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<Vec<Tag>, ChatError> {
        require_owner(&self.conversations, owner_id, conversation_id).await?;
        Ok(self.tags.list_conversation_tags(conversation_id).await?)
    }

    /// Conversations carrying one of the user's tags.
    pub async fn tagged_conversations(
        &self,
        owner_id: &Uuid,
        tag_id: &Uuid,
    ) -> Result<Vec<Conversation>, ChatError> {
        self.owned_tag(owner_id, tag_id).await?;
        Ok(self.tags.list_tagged_conversations(tag_id).await?)
    }
}
