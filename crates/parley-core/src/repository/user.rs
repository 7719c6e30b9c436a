//! User and API key repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::user::User;
use uuid::Uuid;

/// Repository trait for users and the hashed API keys they authenticate with.
///
/// Only key hashes are ever stored; plaintext keys never reach this layer.
pub trait UserRepository: Send + Sync {
    /// Create a user. Returns `Conflict` if the username is taken.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_user(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// List all users ordered by username.
    fn list_users(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Store a new API key hash for a user.
    fn add_api_key(
        &self,
        user_id: &Uuid,
        key_hash: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Resolve the owner of an API key hash, recording the key as used.
    fn find_user_by_key_hash(
        &self,
        key_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
