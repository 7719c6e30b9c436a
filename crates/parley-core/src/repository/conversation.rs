//! Conversation and group membership repository trait definition.

use parley_types::conversation::{Conversation, GroupMember};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversations and their group members.
///
/// Deleting a conversation cascades to its messages, members, and tag links.
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation. Returns the created conversation.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by its unique ID.
    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List conversations a user owns or is a human member of,
    /// most recently updated first.
    fn list_conversations(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Update title, group flag, and `updated_at` of an existing conversation.
    fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a conversation and everything it owns.
    fn delete_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Add a member to a group. Returns `Conflict` if the user is already a
    /// human member of the conversation.
    fn add_member(
        &self,
        member: &GroupMember,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List members of a conversation in join order.
    fn list_members(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<GroupMember>, RepositoryError>> + Send;

    /// Whether `user_id` is a human member of the conversation.
    fn is_member(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
