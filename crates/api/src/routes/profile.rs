//! `GET /profile` — the caller's own profile row.

use axum::Json;
use axum::extract::State;

use trivia_protocol::rest::ProfileResponse;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Caller's profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let username = auth.username.clone().unwrap_or_else(|| auth.user_id.clone());
    let user = trivia_db::users::upsert_user(&state.db, &auth.user_id, &username).await?;

    Ok(Json(ProfileResponse { id: user.id, username: user.username, created_at: user.created_at }))
}
