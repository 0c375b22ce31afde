//! Authenticates CRUD requests the same way Sessions authenticate WebSocket
//! connections: a bearer JWT verified against the shared secret. Token
//! issuance is an external collaborator (spec §1); this extractor only
//! trusts what's already signed.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use trivia_realtime::auth::{extract_token, verify_bearer};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Extracted before a handler runs; handlers that
/// don't take this extractor accept anonymous requests.
pub struct AuthUser {
    pub user_id: String,
    pub username: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let token = extract_token(None, auth_header).map_err(|_| ApiError::Unauthorized)?;
        let claims = verify_bearer(&token, state.config.jwt_secret.as_bytes())
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser { user_id: claims.sub, username: claims.username })
    }
}
