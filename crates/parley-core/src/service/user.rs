//! User accounts and API key issuance.
//!
//! Plaintext keys are returned exactly once, at creation. Only their
//! [`KeyHasher`] digest is stored.

use parley_types::error::ChatError;
use parley_types::user::{User, validate_username};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::info;

use crate::repository::user::UserRepository;
use crate::service::hash::KeyHasher;

/// Prefix of every issued API key.
pub const API_KEY_PREFIX: &str = "prly_";

/// Generate a fresh plaintext API key: prefix plus 32 random bytes as hex.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{API_KEY_PREFIX}{hex}")
}

/// Service for creating users and resolving API keys to users.
pub struct UserService<U: UserRepository, H: KeyHasher> {
    users: U,
    hasher: H,
}

impl<U: UserRepository, H: KeyHasher> UserService<U, H> {
    pub fn new(users: U, hasher: H) -> Self {
        Self { users, hasher }
    }

    /// Create a user with an initial API key. Returns the user and the
    /// plaintext key.
    pub async fn create_user(&self, username: &str) -> Result<(User, String), ChatError> {
        let username = username.trim();
        validate_username(username).map_err(ChatError::Validation)?;

        let user = self.users.create_user(&User::new(username)).await?;
        let key = self.issue_key(&user, "default").await?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok((user, key))
    }

    /// Issue an additional named key for an existing user.
    pub async fn issue_key(&self, user: &User, name: &str) -> Result<String, ChatError> {
        let key = generate_api_key();
        self.users
            .add_api_key(&user.id, &self.hasher.hash_key(&key), name)
            .await?;
        Ok(key)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ChatError> {
        Ok(self.users.list_users().await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, ChatError> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or(ChatError::UserNotFound)
    }

    /// Resolve a plaintext API key to its user.
    pub async fn authenticate(&self, key: &str) -> Result<Option<User>, ChatError> {
        Ok(self
            .users
            .find_user_by_key_hash(&self.hasher.hash_key(key))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    /// Reversible stand-in; real hashing lives in parley-infra.
    struct ReverseHasher;

    impl KeyHasher for ReverseHasher {
        fn hash_key(&self, key: &str) -> String {
            key.chars().rev().collect()
        }
    }

    fn service(store: &MemoryStore) -> UserService<MemoryStore, ReverseHasher> {
        UserService::new(store.clone(), ReverseHasher)
    }

    #[test]
    fn generated_keys_are_prefixed_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with(API_KEY_PREFIX));
        assert_eq!(a.len(), API_KEY_PREFIX.len() + 64);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn created_user_authenticates_with_issued_key() {
        let store = MemoryStore::new();
        let svc = service(&store);

        let (user, key) = svc.create_user("alice").await.unwrap();
        let found = svc.authenticate(&key).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        assert!(svc.authenticate("prly_wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extra_keys_resolve_to_same_user() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let (user, _) = svc.create_user("bob").await.unwrap();

        let second = svc.issue_key(&user, "laptop").await.unwrap();
        assert_eq!(svc.authenticate(&second).await.unwrap().unwrap().id, user.id);
    }

    #[tokio::test]
    async fn duplicate_and_invalid_usernames_are_rejected() {
        let store = MemoryStore::new();
        let svc = service(&store);
        svc.create_user("carol").await.unwrap();

        assert!(matches!(svc.create_user("carol").await, Err(ChatError::Conflict(_))));
        assert!(matches!(svc.create_user("x").await, Err(ChatError::Validation(_))));
        assert!(matches!(svc.find_by_username("dave").await, Err(ChatError::UserNotFound)));
    }
}
