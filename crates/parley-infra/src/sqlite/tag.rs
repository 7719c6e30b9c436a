//! SQLite tag repository implementation.

use chrono::Utc;
use parley_core::repository::tag::TagRepository;
use parley_types::conversation::Conversation;
use parley_types::error::RepositoryError;
use parley_types::tag::Tag;
use sqlx::Row;
use uuid::Uuid;

use super::conversation::conversations_from_rows;
use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `TagRepository`.
#[derive(Clone)]
pub struct SqliteTagRepository {
    pool: DatabasePool,
}

impl SqliteTagRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct TagRow {
    id: String,
    owner_id: String,
    name: String,
    color: String,
    created_at: String,
}

impl TagRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            color: row.try_get("color")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_tag(self) -> Result<Tag, RepositoryError> {
        Ok(Tag {
            id: parse_uuid(&self.id, "tag id")?,
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            name: self.name,
            color: self.color,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn tags_from_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Tag>, RepositoryError> {
    let mut tags = Vec::with_capacity(rows.len());
    for row in rows {
        let tag_row = TagRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        tags.push(tag_row.into_tag()?);
    }
    Ok(tags)
}

impl TagRepository for SqliteTagRepository {
    async fn create_tag(&self, tag: &Tag) -> Result<Tag, RepositoryError> {
        sqlx::query(
            "INSERT INTO tags (id, owner_id, name, color, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tag.id.to_string())
        .bind(tag.owner_id.to_string())
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(format_datetime(&tag.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(tag.clone())
    }

    async fn get_tag(&self, id: &Uuid) -> Result<Option<Tag>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM tags WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let tag_row =
                    TagRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(tag_row.into_tag()?))
            }
            None => Ok(None),
        }
    }

    async fn list_tags(&self, owner_id: &Uuid) -> Result<Vec<Tag>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM tags WHERE owner_id = ? ORDER BY name ASC")
            .bind(owner_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tags_from_rows(&rows)
    }

    async fn update_tag(&self, tag: &Tag) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE tags SET name = ?, color = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(&tag.color)
            .bind(tag.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_tag(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn attach_tag(&self, conversation_id: &Uuid, tag_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO conversation_tags (conversation_id, tag_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(conversation_id.to_string())
        .bind(tag_id.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The composite primary key reports as a UNIQUE violation.
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(
                "tag is already attached to this conversation".to_string(),
            )),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn detach_tag(&self, conversation_id: &Uuid, tag_id: &Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversation_tags WHERE conversation_id = ? AND tag_id = ?")
            .bind(conversation_id.to_string())
            .bind(tag_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_conversation_tags(&self, conversation_id: &Uuid) -> Result<Vec<Tag>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT t.* FROM tags t
               JOIN conversation_tags ct ON ct.tag_id = t.id
               WHERE ct.conversation_id = ?
               ORDER BY t.name ASC"#,
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tags_from_rows(&rows)
    }

    async fn list_tagged_conversations(&self, tag_id: &Uuid) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT c.* FROM conversations c
               JOIN conversation_tags ct ON ct.conversation_id = c.id
               WHERE ct.tag_id = ?
               ORDER BY c.updated_at DESC"#,
        )
        .bind(tag_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        conversations_from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::conversation::SqliteConversationRepository;
    use crate::sqlite::test_util::{seed_user, test_pool};
    use parley_core::repository::conversation::ConversationRepository;

    #[tokio::test]
    async fn test_tag_crud() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "alice").await;
        let repo = SqliteTagRepository::new(pool);

        let work = repo.create_tag(&Tag::new(owner.id, "work", None)).await.unwrap();
        repo.create_tag(&Tag::new(owner.id, "family", Some("#00ff00".into())))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_tags(&owner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["family", "work"]);

        let mut renamed = work.clone();
        renamed.name = "job".to_string();
        repo.update_tag(&renamed).await.unwrap();
        assert_eq!(repo.get_tag(&work.id).await.unwrap().unwrap().name, "job");

        repo.delete_tag(&work.id).await.unwrap();
        assert!(repo.get_tag(&work.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_tag(&work.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_attach_detach_and_cascade() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "alice").await;
        let repo = SqliteTagRepository::new(pool.clone());
        let conversations = SqliteConversationRepository::new(pool);

        let conv = conversations
            .create_conversation(&Conversation::new(owner.id, "chat", false))
            .await
            .unwrap();
        let tag = repo.create_tag(&Tag::new(owner.id, "work", None)).await.unwrap();

        repo.attach_tag(&conv.id, &tag.id).await.unwrap();
        assert!(matches!(
            repo.attach_tag(&conv.id, &tag.id).await,
            Err(RepositoryError::Conflict(_))
        ));
        let attached = repo.list_conversation_tags(&conv.id).await.unwrap();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].id, tag.id);
        let tagged = repo.list_tagged_conversations(&tag.id).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, conv.id);

        assert!(repo.detach_tag(&conv.id, &tag.id).await.unwrap());
        assert!(!repo.detach_tag(&conv.id, &tag.id).await.unwrap());

        repo.attach_tag(&conv.id, &tag.id).await.unwrap();
        conversations.delete_conversation(&conv.id).await.unwrap();
        assert!(repo.list_tagged_conversations(&tag.id).await.unwrap().is_empty());
    }
}
