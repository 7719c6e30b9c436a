//! Message handlers.
//!
//! Endpoints:
//! - GET    /api/v1/conversations/{id}/messages - History, oldest first
//! - POST   /api/v1/messages                    - Submit a human message
//! - DELETE /api/v1/messages/{id}               - Delete an own message

use axum::Json;
use axum::extract::{Path, Query, State};
use parley_observe::attrs::OP_SUBMIT_MESSAGE;
use parley_types::message::{Message, SubmitOutcome};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::path::parse_id;
use crate::http::handlers::conversation::Deleted;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub conversation_id: Uuid,
    pub content: String,
}

/// GET /api/v1/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<ApiResponse<Vec<Message>>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    let messages = state
        .conversation_service
        .list_messages(&user.id, &id, query.limit)
        .await?;
    Ok(timer
        .finish(messages)
        .with_link("conversation", &format!("/api/v1/conversations/{id}")))
}

/// POST /api/v1/messages
///
/// Returns as soon as the message is stored; replies arrive later in the
/// conversation history.
pub async fn submit_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SubmitMessageRequest>,
) -> Result<ApiResponse<SubmitOutcome>, AppError> {
    let timer = RequestTimer::start();
    let span = tracing::info_span!(
        "submit_message",
        operation = OP_SUBMIT_MESSAGE,
        request_id = %timer.request_id(),
        conversation_id = %body.conversation_id,
    );
    let outcome = state
        .orchestrator
        .submit(user.id, body.conversation_id, &body.content)
        .instrument(span)
        .await?;

    let link = format!("/api/v1/conversations/{}/messages", body.conversation_id);
    Ok(timer.finish(outcome).with_link("messages", &link))
}

/// DELETE /api/v1/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_id(&id)?;
    state.conversation_service.delete_message(&user.id, &id).await?;
    Ok(timer.finish(Deleted { deleted: true }))
}
