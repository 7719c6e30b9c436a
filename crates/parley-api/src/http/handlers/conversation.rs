//! Conversation and membership handlers.
//!
//! Endpoints:
//! - GET    /api/v1/conversations               - List own and joined conversations with latest message, tags, members
//! - POST   /api/v1/conversations               - Create a conversation
//! - GET    /api/v1/conversations/{id}          - Get a conversation
//! - PUT    /api/v1/conversations/{id}          - Rename a conversation
//! - DELETE /api/v1/conversations/{id}          - Delete a conversation
//! - GET    /api/v1/conversations/{id}/members  - List group members
//! - POST   /api/v1/conversations/{id}/members  - Add a human member
//! - POST   /api/v1/conversations/{id}/bots     - Add a bot member

use axum::Json;
use axum::extract::{Path, State};
use parley_observe::attrs::OP_MANAGE_CONVERSATION;
use parley_types::conversation::{Conversation, ConversationSummary, GroupMember};
use parley_types::persona::Persona;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::path::parse_id;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
    #[serde(default)]
    pub is_group: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenameConversationRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddBotRequest {
    /// Defaults to `friendly`.
    pub persona: Option<Persona>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

fn conversation_link(id: &Uuid) -> String {
    format!("/api/v1/conversations/{id}")
}

/// GET /api/v1/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Vec<ConversationSummary>>, AppError> {
    let timer = RequestTimer::start();
    let conversations = state.conversation_service.list_summaries(&user.id).await?;
    Ok(timer.finish(conversations).with_link("self", "/api/v1/conversations"))
}

/// POST /api/v1/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateConversationRequest>,
) -> Result<ApiResponse<Conversation>, AppError> {
    let timer = RequestTimer::start();
    let conversation = state
        .conversation_service
        .create(user.id, &body.title, body.is_group)
        .instrument(tracing::info_span!("create_conversation", operation = OP_MANAGE_CONVERSATION))
        .await?;

    let link = conversation_link(&conversation.id);
    Ok(timer.finish(conversation).with_link("self", &link))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Conversation>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let conversation = state.conversation_service.get(&user.id, &id).await?;

    let link = conversation_link(&id);
    Ok(timer
        .finish(conversation)
        .with_link("self", &link)
        .with_link("messages", &format!("{link}/messages"))
        .with_link("members", &format!("{link}/members")))
}

/// PUT /api/v1/conversations/{id}
pub async fn rename_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RenameConversationRequest>,
) -> Result<ApiResponse<Conversation>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let conversation = state
        .conversation_service
        .rename(&user.id, &id, &body.title)
        .instrument(tracing::info_span!(
            "rename_conversation",
            operation = OP_MANAGE_CONVERSATION,
            conversation_id = %id
        ))
        .await?;
    Ok(timer.finish(conversation).with_link("self", &conversation_link(&id)))
}

/// DELETE /api/v1/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    state
        .conversation_service
        .delete(&user.id, &id)
        .instrument(tracing::info_span!(
            "delete_conversation",
            operation = OP_MANAGE_CONVERSATION,
            conversation_id = %id
        ))
        .await?;
    Ok(timer.finish(Deleted { deleted: true }))
}

/// GET /api/v1/conversations/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<GroupMember>>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let members = state.conversation_service.list_members(&user.id, &id).await?;
    Ok(timer
        .finish(members)
        .with_link("conversation", &conversation_link(&id)))
}

/// POST /api/v1/conversations/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<ApiResponse<GroupMember>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let member = state
        .conversation_service
        .add_member(&user.id, &id, body.user_id)
        .instrument(tracing::info_span!(
            "add_member",
            operation = OP_MANAGE_CONVERSATION,
            conversation_id = %id
        ))
        .await?;
    Ok(timer
        .finish(member)
        .with_link("conversation", &conversation_link(&id)))
}

/// POST /api/v1/conversations/{id}/bots
pub async fn add_bot(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AddBotRequest>,
) -> Result<ApiResponse<GroupMember>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let member = state
        .conversation_service
        .add_bot(&user.id, &id, body.persona)
        .instrument(tracing::info_span!(
            "add_bot",
            operation = OP_MANAGE_CONVERSATION,
            conversation_id = %id
        ))
        .await?;
    Ok(timer
        .finish(member)
        .with_link("conversation", &conversation_link(&id)))
}
