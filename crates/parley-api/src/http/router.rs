//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{delete, get, post, put};
use parley_observe::attrs::SERVICE_NAME;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Conversations
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations)
                .post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation)
                .put(handlers::conversation::rename_conversation)
                .delete(handlers::conversation::delete_conversation),
        )
        .route(
            "/conversations/{id}/members",
            get(handlers::conversation::list_members).post(handlers::conversation::add_member),
        )
        .route("/conversations/{id}/bots", post(handlers::conversation::add_bot))
        .route(
            "/conversations/{id}/tags",
            get(handlers::tag::conversation_tags)
                .post(handlers::tag::attach_tag)
                .delete(handlers::tag::detach_tag),
        )
        // Messages
        .route(
            "/conversations/{id}/messages",
            get(handlers::message::list_messages),
        )
        .route("/messages", post(handlers::message::submit_message))
        .route("/messages/{id}", delete(handlers::message::delete_message))
        // Tags
        .route(
            "/tags",
            get(handlers::tag::list_tags).post(handlers::tag::create_tag),
        )
        .route(
            "/tags/{id}",
            put(handlers::tag::update_tag).delete(handlers::tag::delete_tag),
        )
        .route(
            "/tags/{id}/conversations",
            get(handlers::tag::tagged_conversations),
        )
        // Users
        .route("/users", get(handlers::user::list_users))
        .route("/users/me", get(handlers::user::current_user))
        // Personas
        .route("/personas", get(handlers::persona::list_personas))
        // Cache administration
        .route("/cache/stats", get(handlers::cache::cache_stats))
        .route("/cache/clear", post(handlers::cache::clear_cache));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
