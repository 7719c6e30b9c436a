//! SQLite message repository implementation.

use parley_core::repository::SortOrder;
use parley_core::repository::message::MessageRepository;
use parley_types::error::RepositoryError;
use parley_types::message::{Message, SenderKind};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `MessageRepository`.
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    id: String,
    conversation_id: String,
    content: String,
    sender_kind: String,
    sender_id: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            content: row.try_get("content")?,
            sender_kind: row.try_get("sender_kind")?,
            sender_id: row.try_get("sender_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let sender_kind: SenderKind = self
            .sender_kind
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let sender_id = self
            .sender_id
            .as_deref()
            .map(|s| parse_uuid(s, "sender_id"))
            .transpose()?;

        Ok(Message {
            id: parse_uuid(&self.id, "message id")?,
            conversation_id: parse_uuid(&self.conversation_id, "conversation_id")?,
            content: self.content,
            sender_kind,
            sender_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl MessageRepository for SqliteMessageRepository {
    async fn save_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, content, sender_kind, sender_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(&message.content)
        .bind(message.sender_kind.to_string())
        .bind(message.sender_id.map(|id| id.to_string()))
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&message.created_at))
            .bind(message.conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row =
                    MessageRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        order: SortOrder,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RepositoryError> {
        // UUIDv7 ids break ties between messages stored in the same microsecond.
        let dir = order.as_sql();
        let mut sql = format!(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at {dir}, id {dir}"
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql)
            .bind(conversation_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }
        Ok(messages)
    }

    async fn delete_message(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::conversation::SqliteConversationRepository;
    use crate::sqlite::test_util::{seed_user, test_pool};
    use parley_core::repository::conversation::ConversationRepository;
    use parley_types::conversation::Conversation;

    async fn setup() -> (SqliteMessageRepository, SqliteConversationRepository, Conversation, Uuid) {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "alice").await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let conv = conversations
            .create_conversation(&Conversation::new(owner.id, "chat", false))
            .await
            .unwrap();
        (SqliteMessageRepository::new(pool), conversations, conv, owner.id)
    }

    #[tokio::test]
    async fn test_save_and_get_message() {
        let (repo, _, conv, owner) = setup().await;
        let msg = Message::new(conv.id, "hello", SenderKind::Human, Some(owner));
        repo.save_message(&msg).await.unwrap();

        let found = repo.get_message(&msg.id).await.unwrap().unwrap();
        assert_eq!(found.content, "hello");
        assert_eq!(found.sender_kind, SenderKind::Human);
        assert_eq!(found.sender_id, Some(owner));

        let reply = Message::new(conv.id, "hi!", SenderKind::AutomatedSingle, None);
        repo.save_message(&reply).await.unwrap();
        let found = repo.get_message(&reply.id).await.unwrap().unwrap();
        assert_eq!(found.sender_id, None);
        assert!(found.is_automated());
    }

    #[tokio::test]
    async fn test_save_bumps_conversation_updated_at() {
        let (repo, conversations, conv, owner) = setup().await;
        let msg = Message::new(conv.id, "hello", SenderKind::Human, Some(owner));
        repo.save_message(&msg).await.unwrap();

        let updated = conversations.get_conversation(&conv.id).await.unwrap().unwrap();
        assert!(updated.updated_at >= conv.updated_at);
        assert_eq!(
            updated.updated_at.timestamp_micros(),
            msg.created_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_list_order_and_limit() {
        let (repo, _, conv, owner) = setup().await;
        for text in ["one", "two", "three", "four"] {
            repo.save_message(&Message::new(conv.id, text, SenderKind::Human, Some(owner)))
                .await
                .unwrap();
        }

        let asc: Vec<String> = repo
            .list_messages(&conv.id, SortOrder::Asc, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(asc, vec!["one", "two", "three", "four"]);

        let recent: Vec<String> = repo
            .list_messages(&conv.id, SortOrder::Desc, Some(3))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(recent, vec!["four", "three", "two"]);
    }

    #[tokio::test]
    async fn test_save_to_missing_conversation_fails() {
        let (repo, _, _, _) = setup().await;
        let orphan = Message::new(Uuid::now_v7(), "lost", SenderKind::AutomatedGroupBot, None);
        assert!(repo.save_message(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_message() {
        let (repo, _, conv, owner) = setup().await;
        let msg = Message::new(conv.id, "oops", SenderKind::Human, Some(owner));
        repo.save_message(&msg).await.unwrap();

        repo.delete_message(&msg.id).await.unwrap();
        assert!(repo.get_message(&msg.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_message(&msg.id).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
