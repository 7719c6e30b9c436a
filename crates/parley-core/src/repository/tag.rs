//! Tag repository trait definition.

use parley_types::conversation::Conversation;
use parley_types::error::RepositoryError;
use parley_types::tag::Tag;
use uuid::Uuid;

/// Repository trait for tags and their links to conversations.
pub trait TagRepository: Send + Sync {
    fn create_tag(
        &self,
        tag: &Tag,
    ) -> impl std::future::Future<Output = Result<Tag, RepositoryError>> + Send;

    fn get_tag(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Tag>, RepositoryError>> + Send;

    /// List a user's tags ordered by name.
    fn list_tags(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Tag>, RepositoryError>> + Send;

    fn update_tag(
        &self,
        tag: &Tag,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a tag and all its conversation links.
    fn delete_tag(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Link a tag to a conversation. Returns `Conflict` if already linked.
    fn attach_tag(
        &self,
        conversation_id: &Uuid,
        tag_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Unlink a tag from a conversation. Returns `true` if a link existed.
    fn detach_tag(
        &self,
        conversation_id: &Uuid,
        tag_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Tags attached to a conversation, ordered by name.
    fn list_conversation_tags(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Tag>, RepositoryError>> + Send;

    /// Conversations carrying a tag, most recently updated first.
    fn list_tagged_conversations(
        &self,
        tag_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;
}
