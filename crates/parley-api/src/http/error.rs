//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use parley_types::error::ChatError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Conversation, message, tag, and user errors.
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Chat(ChatError::ConversationNotFound) => {
                (StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND")
            }
            AppError::Chat(ChatError::MessageNotFound) => (StatusCode::NOT_FOUND, "MESSAGE_NOT_FOUND"),
            AppError::Chat(ChatError::TagNotFound) => (StatusCode::NOT_FOUND, "TAG_NOT_FOUND"),
            AppError::Chat(ChatError::UserNotFound) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AppError::Chat(ChatError::Forbidden) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::Chat(ChatError::Conflict(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Chat(ChatError::Validation(_)) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Chat(ChatError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Chat(ChatError::Validation(msg)) => msg.clone(),
            AppError::Chat(e) => e.to_string(),
            AppError::Unauthorized(msg) | AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(code, "{message}");
        }

        ApiResponse::error(code, &message).into_response_with(status)
    }
}
