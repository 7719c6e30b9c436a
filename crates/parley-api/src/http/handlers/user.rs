//! User directory handlers.
//!
//! Endpoints:
//! - GET /api/v1/users    - Every user, by username
//! - GET /api/v1/users/me - The authenticated user

use axum::extract::State;
use parley_types::user::User;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/v1/users - Lets clients find ids to add as group members.
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    let timer = RequestTimer::start();
    let users = state.user_service.list_users().await?;
    Ok(timer.finish(users).with_link("self", "/api/v1/users"))
}

/// GET /api/v1/users/me
pub async fn current_user(AuthUser(user): AuthUser) -> Result<ApiResponse<User>, AppError> {
    let timer = RequestTimer::start();
    Ok(timer.finish(user).with_link("self", "/api/v1/users/me"))
}
