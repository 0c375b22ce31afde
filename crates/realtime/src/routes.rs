//! The single WebSocket route this server exposes.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth::{extract_token, verify_bearer};
use crate::session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// `GET /ws/trivia/{game_id}/?token=...` — upgrades to a WebSocket once the
/// bearer token is verified. Game membership itself is not re-checked here:
/// a connected user who was never seated in the game simply never receives
/// unicasts and gets rejected by the reducer the moment they try an action
/// that isn't allowed from a non-player.
pub async fn upgrade(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let auth_header = headers.get("authorization").and_then(|v| v.to_str().ok());
    let token = match extract_token(query.token.as_deref(), auth_header) {
        Ok(token) => token,
        Err(_) => return axum::http::StatusCode::UNAUTHORIZED.into_response(),
    };

    let claims = match verify_bearer(&token, state.config.jwt_secret.as_bytes()) {
        Ok(claims) => claims,
        Err(_) => return axum::http::StatusCode::UNAUTHORIZED.into_response(),
    };

    ws.on_upgrade(move |socket| session::run(socket, state, game_id, claims.sub))
}
