//! Message repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::message::Message;
use uuid::Uuid;

use super::SortOrder;

/// Repository trait for chat message persistence.
///
/// `save_message` is an atomic append; it also bumps the parent
/// conversation's `updated_at`.
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    fn save_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get_message(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// List messages of a conversation ordered by `created_at`.
    ///
    /// `SortOrder::Desc` with a limit returns the most recent messages,
    /// newest first.
    fn list_messages(
        &self,
        conversation_id: &Uuid,
        order: SortOrder,
        limit: Option<u32>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Delete a single message.
    fn delete_message(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
