//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `parley-core` using sqlx with
//! split read/write pools, raw queries, and private Row structs.

use parley_core::repository::conversation::ConversationRepository;
use parley_types::conversation::{Conversation, GroupMember, MemberKind, Participant};
use parley_types::error::RepositoryError;
use parley_types::persona::Persona;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

pub(crate) struct ConversationRow {
    id: String,
    owner_id: String,
    title: String,
    is_group: bool,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            is_group: row.try_get("is_group")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub(crate) fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: parse_uuid(&self.id, "conversation id")?,
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            title: self.title,
            is_group: self.is_group,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

pub(crate) fn conversations_from_rows(
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<Conversation>, RepositoryError> {
    let mut conversations = Vec::with_capacity(rows.len());
    for row in rows {
        let conv_row =
            ConversationRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        conversations.push(conv_row.into_conversation()?);
    }
    Ok(conversations)
}

struct MemberRow {
    id: String,
    conversation_id: String,
    member_type: String,
    user_id: Option<String>,
    persona: Option<String>,
    joined_at: String,
}

impl MemberRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            member_type: row.try_get("member_type")?,
            user_id: row.try_get("user_id")?,
            persona: row.try_get("persona")?,
            joined_at: row.try_get("joined_at")?,
        })
    }

    fn into_member(self) -> Result<GroupMember, RepositoryError> {
        let kind: MemberKind = self
            .member_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let participant = match kind {
            MemberKind::Human => {
                let user_id = self
                    .user_id
                    .as_deref()
                    .ok_or_else(|| RepositoryError::Query("human member without user_id".into()))?;
                Participant::Human {
                    user_id: parse_uuid(user_id, "user_id")?,
                }
            }
            MemberKind::Bot => {
                let persona: Persona = self
                    .persona
                    .as_deref()
                    .unwrap_or_default()
                    .parse()
                    .map_err(|e: String| RepositoryError::Query(e))?;
                Participant::Bot { persona }
            }
        };

        Ok(GroupMember {
            id: parse_uuid(&self.id, "member id")?,
            conversation_id: parse_uuid(&self.conversation_id, "conversation_id")?,
            participant,
            joined_at: parse_datetime(&self.joined_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, owner_id, title, is_group, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.owner_id.to_string())
        .bind(&conversation.title)
        .bind(conversation.is_group)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(conversation.clone())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let conv_row = ConversationRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(conv_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn list_conversations(&self, user_id: &Uuid) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT c.* FROM conversations c
               WHERE c.owner_id = ?
                  OR EXISTS (
                      SELECT 1 FROM group_members m
                      WHERE m.conversation_id = c.id
                        AND m.member_type = 'human'
                        AND m.user_id = ?
                  )
               ORDER BY c.updated_at DESC"#,
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        conversations_from_rows(&rows)
    }

    async fn update_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE conversations SET title = ?, is_group = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&conversation.title)
        .bind(conversation.is_group)
        .bind(format_datetime(&conversation.updated_at))
        .bind(conversation.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_conversation(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_member(&self, member: &GroupMember) -> Result<(), RepositoryError> {
        let (user_id, persona) = match &member.participant {
            Participant::Human { user_id } => (Some(user_id.to_string()), None),
            Participant::Bot { persona } => (None, Some(persona.to_string())),
        };

        let result = sqlx::query(
            r#"INSERT INTO group_members (id, conversation_id, member_type, user_id, persona, joined_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(member.id.to_string())
        .bind(member.conversation_id.to_string())
        .bind(member.participant.kind().to_string())
        .bind(user_id)
        .bind(persona)
        .bind(format_datetime(&member.joined_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(
                "user is already a member of this conversation".to_string(),
            )),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn list_members(&self, conversation_id: &Uuid) -> Result<Vec<GroupMember>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM group_members WHERE conversation_id = ? ORDER BY joined_at ASC, id ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut members = Vec::with_capacity(rows.len());
        for row in &rows {
            let member_row =
                MemberRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            members.push(member_row.into_member()?);
        }
        Ok(members)
    }

    async fn is_member(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS cnt FROM group_members
               WHERE conversation_id = ? AND member_type = 'human' AND user_id = ?"#,
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count > 0)
    }
}
