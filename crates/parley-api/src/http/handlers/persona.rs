//! Persona catalogue handler.

use parley_types::persona::{Persona, PersonaProfile};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};

/// GET /api/v1/personas - Preset bot roles offered for group chats.
pub async fn list_personas(_auth: AuthUser) -> Result<ApiResponse<Vec<PersonaProfile>>, AppError> {
    let timer = RequestTimer::start();
    Ok(timer
        .finish(Persona::catalogue())
        .with_link("self", "/api/v1/personas"))
}
