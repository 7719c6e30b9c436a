//! Response cache administration handlers.
//!
//! Endpoints:
//! - GET  /api/v1/cache/stats - Current size, capacity, TTL
//! - POST /api/v1/cache/clear - Drop every cached reply

use axum::extract::State;
use parley_core::reply::cache::CacheStats;
use parley_observe::attrs::OP_CACHE_ADMIN;
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub cleared: usize,
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<ApiResponse<CacheStats>, AppError> {
    let timer = RequestTimer::start();
    Ok(timer.finish(state.cache.stats()))
}

/// POST /api/v1/cache/clear
pub async fn clear_cache(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Cleared>, AppError> {
    let timer = RequestTimer::start();
    let cleared = state.cache.len();
    state.cache.clear();
    tracing::info!(operation = OP_CACHE_ADMIN, user_id = %user.id, cleared, "response cache cleared");
    Ok(timer.finish(Cleared { cleared }))
}
