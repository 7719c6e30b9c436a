//! In-memory repositories for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use parley_types::conversation::{Conversation, GroupMember, Participant};
use parley_types::error::RepositoryError;
use parley_types::message::Message;
use parley_types::tag::Tag;
use parley_types::user::User;
use uuid::Uuid;

use crate::repository::SortOrder;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;
use crate::repository::tag::TagRepository;
use crate::repository::user::UserRepository;

#[derive(Default)]
struct State {
    conversations: Vec<Conversation>,
    members: Vec<GroupMember>,
    messages: Vec<Message>,
    tags: Vec<Tag>,
    tag_links: Vec<(Uuid, Uuid)>,
    users: Vec<User>,
    api_keys: Vec<(Uuid, String)>,
}

/// Shared in-memory store implementing every repository trait.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    failing_saves: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` `save_message` calls fail.
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    /// Make `list_messages` fail until switched off.
    pub fn fail_message_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// All messages of a conversation in insertion order.
    pub fn messages_in(&self, conversation_id: &Uuid) -> Vec<Message> {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_save_failure(&self) -> bool {
        self.failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl ConversationRepository for MemoryStore {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        self.lock().conversations.push(conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.lock().conversations.iter().find(|c| c.id == *id).cloned())
    }

    async fn list_conversations(&self, user_id: &Uuid) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.lock();
        let mut found: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| {
                c.owner_id == *user_id
                    || state
                        .members
                        .iter()
                        .any(|m| m.conversation_id == c.id && m.user_id() == Some(*user_id))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn update_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let existing = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation.id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = conversation.clone();
        Ok(())
    }

    async fn delete_conversation(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.conversations.retain(|c| c.id != *id);
        state.members.retain(|m| m.conversation_id != *id);
        state.messages.retain(|m| m.conversation_id != *id);
        state.tag_links.retain(|(conv, _)| conv != id);
        Ok(())
    }

    async fn add_member(&self, member: &GroupMember) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if let Participant::Human { user_id } = &member.participant {
            let duplicate = state.members.iter().any(|m| {
                m.conversation_id == member.conversation_id && m.user_id() == Some(*user_id)
            });
            if duplicate {
                return Err(RepositoryError::Conflict(format!(
                    "user {user_id} is already a member"
                )));
            }
        }
        state.members.push(member.clone());
        Ok(())
    }

    async fn list_members(&self, conversation_id: &Uuid) -> Result<Vec<GroupMember>, RepositoryError> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect())
    }

    async fn is_member(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()
            .members
            .iter()
            .any(|m| m.conversation_id == *conversation_id && m.user_id() == Some(*user_id)))
    }
}

impl MessageRepository for MemoryStore {
    async fn save_message(&self, message: &Message) -> Result<(), RepositoryError> {
        if self.take_save_failure() {
            return Err(RepositoryError::Query("injected save failure".to_string()));
        }
        let mut state = self.lock();
        if let Some(conv) = state
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        {
            conv.updated_at = Utc::now();
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        Ok(self.lock().messages.iter().find(|m| m.id == *id).cloned())
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        order: SortOrder,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("injected read failure".to_string()));
        }
        let mut found = self.messages_in(conversation_id);
        if order == SortOrder::Desc {
            found.reverse();
        }
        if let Some(limit) = limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn delete_message(&self, id: &Uuid) -> Result<(), RepositoryError> {
        self.lock().messages.retain(|m| m.id != *id);
        Ok(())
    }
}

impl TagRepository for MemoryStore {
    async fn create_tag(&self, tag: &Tag) -> Result<Tag, RepositoryError> {
        self.lock().tags.push(tag.clone());
        Ok(tag.clone())
    }

    async fn get_tag(&self, id: &Uuid) -> Result<Option<Tag>, RepositoryError> {
        Ok(self.lock().tags.iter().find(|t| t.id == *id).cloned())
    }

    async fn list_tags(&self, owner_id: &Uuid) -> Result<Vec<Tag>, RepositoryError> {
        let mut found: Vec<Tag> = self
            .lock()
            .tags
            .iter()
            .filter(|t| t.owner_id == *owner_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn update_tag(&self, tag: &Tag) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let existing = state
            .tags
            .iter_mut()
            .find(|t| t.id == tag.id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = tag.clone();
        Ok(())
    }

    async fn delete_tag(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.tags.retain(|t| t.id != *id);
        state.tag_links.retain(|(_, tag)| tag != id);
        Ok(())
    }

    async fn attach_tag(&self, conversation_id: &Uuid, tag_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let link = (*conversation_id, *tag_id);
        if state.tag_links.contains(&link) {
            return Err(RepositoryError::Conflict("tag already attached".to_string()));
        }
        state.tag_links.push(link);
        Ok(())
    }

    async fn detach_tag(&self, conversation_id: &Uuid, tag_id: &Uuid) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        let before = state.tag_links.len();
        state
            .tag_links
            .retain(|link| *link != (*conversation_id, *tag_id));
        Ok(state.tag_links.len() != before)
    }

    async fn list_conversation_tags(&self, conversation_id: &Uuid) -> Result<Vec<Tag>, RepositoryError> {
        let state = self.lock();
        let mut found: Vec<Tag> = state
            .tags
            .iter()
            .filter(|t| state.tag_links.contains(&(*conversation_id, t.id)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn list_tagged_conversations(&self, tag_id: &Uuid) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.lock();
        let mut found: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| state.tag_links.contains(&(c.id, *tag_id)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }
}

impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' is taken",
                user.username
            )));
        }
        state.users.push(user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.id == *id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users = self.lock().users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn add_api_key(&self, user_id: &Uuid, key_hash: &str, _name: &str) -> Result<(), RepositoryError> {
        self.lock().api_keys.push((*user_id, key_hash.to_string()));
        Ok(())
    }

    async fn find_user_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.lock();
        let owner = state
            .api_keys
            .iter()
            .find(|(_, hash)| hash == key_hash)
            .map(|(user_id, _)| *user_id);
        Ok(owner.and_then(|id| state.users.iter().find(|u| u.id == id).cloned()))
    }
}
