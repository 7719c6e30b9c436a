//! Tag handlers.
//!
//! Endpoints:
//! - GET    /api/v1/tags                      - List own tags
//! - POST   /api/v1/tags                      - Create a tag
//! - PUT    /api/v1/tags/{id}                 - Update name and/or color
//! - DELETE /api/v1/tags/{id}                 - Delete a tag
//! - GET    /api/v1/tags/{id}/conversations   - Conversations carrying a tag
//! - GET    /api/v1/conversations/{id}/tags   - Tags on a conversation
//! - POST   /api/v1/conversations/{id}/tags   - Attach a tag
//! - DELETE /api/v1/conversations/{id}/tags   - Detach a tag

use axum::Json;
use axum::extract::{Path, State};
use parley_observe::attrs::OP_MANAGE_TAG;
use parley_types::conversation::Conversation;
use parley_types::tag::Tag;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::path::parse_id;
use crate::http::handlers::conversation::Deleted;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagLinkRequest {
    pub tag_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TagLink {
    pub conversation_id: Uuid,
    pub tag_id: Uuid,
    pub attached: bool,
}

/// GET /api/v1/tags
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Vec<Tag>>, AppError> {
    let timer = RequestTimer::start();
    let tags = state.tag_service.list(&user.id).await?;
    Ok(timer.finish(tags).with_link("self", "/api/v1/tags"))
}

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateTagRequest>,
) -> Result<ApiResponse<Tag>, AppError> {
    let timer = RequestTimer::start();
    let tag = state
        .tag_service
        .create(user.id, &body.name, body.color.as_deref())
        .instrument(tracing::info_span!("create_tag", operation = OP_MANAGE_TAG))
        .await?;
    let link = format!("/api/v1/tags/{}", tag.id);
    Ok(timer.finish(tag).with_link("self", &link))
}

/// PUT /api/v1/tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateTagRequest>,
) -> Result<ApiResponse<Tag>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let tag = state
        .tag_service
        .update(&user.id, &id, body.name.as_deref(), body.color.as_deref())
        .instrument(tracing::info_span!("update_tag", operation = OP_MANAGE_TAG, tag_id = %id))
        .await?;
    Ok(timer.finish(tag))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    state
        .tag_service
        .delete(&user.id, &id)
        .instrument(tracing::info_span!("delete_tag", operation = OP_MANAGE_TAG, tag_id = %id))
        .await?;
    Ok(timer.finish(Deleted { deleted: true }))
}

/// GET /api/v1/tags/{id}/conversations
pub async fn tagged_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let conversations = state.tag_service.tagged_conversations(&user.id, &id).await?;
    Ok(timer.finish(conversations))
}

/// GET /api/v1/conversations/{id}/tags
pub async fn conversation_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<Tag>>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let tags = state.tag_service.conversation_tags(&user.id, &id).await?;
    Ok(timer.finish(tags))
}

/// POST /api/v1/conversations/{id}/tags
pub async fn attach_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<TagLinkRequest>,
) -> Result<ApiResponse<TagLink>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    state
        .tag_service
        .attach(&user.id, &id, &body.tag_id)
        .instrument(tracing::info_span!(
            "attach_tag",
            operation = OP_MANAGE_TAG,
            conversation_id = %id,
            tag_id = %body.tag_id
        ))
        .await?;
    Ok(timer.finish(TagLink {
        conversation_id: id,
        tag_id: body.tag_id,
        attached: true,
    }))
}

/// DELETE /api/v1/conversations/{id}/tags
pub async fn detach_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<TagLinkRequest>,
) -> Result<ApiResponse<TagLink>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    state
        .tag_service
        .detach(&user.id, &id, &body.tag_id)
        .instrument(tracing::info_span!(
            "detach_tag",
            operation = OP_MANAGE_TAG,
            conversation_id = %id,
            tag_id = %body.tag_id
        ))
        .await?;
    Ok(timer.finish(TagLink {
        conversation_id: id,
        tag_id: body.tag_id,
        attached: false,
    }))
}
