//! SQLite user and API key repository implementation.

use chrono::Utc;
use parley_core::repository::user::UserRepository;
use parley_types::error::RepositoryError;
use parley_types::user::User;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    username: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: parse_uuid(&self.id, "user id")?,
            username: self.username,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn user_from_optional(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<User>, RepositoryError> {
    match row {
        Some(row) => {
            let user_row = UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(user_row.into_user()?))
        }
        None => Ok(None),
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let result = sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(format_datetime(&user.created_at))
            .execute(&self.pool.writer)
            .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                user.username
            ))),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        user_from_optional(row)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        user_from_optional(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY username ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_row = UserRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            users.push(user_row.into_user()?);
        }
        Ok(users)
    }

    async fn add_api_key(&self, user_id: &Uuid, key_hash: &str, name: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO api_keys (id, user_id, key_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id.to_string())
        .bind(key_hash)
        .bind(name)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn find_user_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT u.*, k.id AS key_id FROM api_keys k
               JOIN users u ON u.id = k.user_id
               WHERE k.key_hash = ?"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let key_id: String = row
            .try_get("key_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Best effort; a failed timestamp update never rejects a valid key.
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(&key_id)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!("failed to record API key use: {e}");
        }

        user_from_optional(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_util::test_pool;

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = repo.create_user(&User::new("alice")).await.unwrap();

        let by_id = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        let by_name = repo.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(repo.get_user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&User::new("alice")).await.unwrap();
        assert!(matches!(
            repo.create_user(&User::new("alice")).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_users_by_name() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&User::new("zed")).await.unwrap();
        repo.create_user(&User::new("amy")).await.unwrap();
        let names: Vec<String> = repo.list_users().await.unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }

    #[tokio::test]
    async fn test_api_key_lookup_records_use() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool.clone());
        let user = repo.create_user(&User::new("alice")).await.unwrap();
        repo.add_api_key(&user.id, "hash-1", "default").await.unwrap();

        let found = repo.find_user_by_key_hash("hash-1").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.find_user_by_key_hash("hash-2").await.unwrap().is_none());

        let (last_used,): (Option<String>,) =
            sqlx::query_as("SELECT last_used_at FROM api_keys WHERE key_hash = 'hash-1'")
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert!(last_used.is_some());
    }
}
