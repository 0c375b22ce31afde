//! The game CRUD surface: create/list/join/unjoin/delete, taken from
//! `original_source/trivia_api/views.py`'s `GameViewSet`.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use validator::Validate;

use trivia_protocol::rest::{CreateGameRequest, GameListResponse, GameSummary, MessageResponse};
use trivia_protocol::ws::CrudEvent;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_game))
        .route("/", get(list_open_games))
        .route("/recent_states", get(recent_states))
        .route("/{id}/join_game", post(join_game))
        .route("/{id}/unjoin_game", post(unjoin_game))
        .route("/{id}", delete(delete_game))
}

async fn to_summary(state: &AppState, game: trivia_db::Game) -> Result<GameSummary, ApiError> {
    let players_count = trivia_db::games::player_count(&state.db, &game.id).await? as u32;
    Ok(GameSummary {
        id: game.id,
        name: game.name,
        creator_id: game.creator_id,
        question_time: game.question_time as u32,
        answer_time: game.answer_time as u32,
        rounds_number: game.rounds_number.map(|n| n as u32),
        players_count,
        created_at: game.created_at,
        started_at: game.started_at,
        ended_at: game.ended_at,
    })
}

/// `POST /games` — creates a game; the caller is seated as its host.
#[utoipa::path(
    post,
    path = "/api/v1/games",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "games"
)]
pub async fn create_game(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<GameSummary>, ApiError> {
    req.validate().map_err(|err| ApiError::bad_request("INVALID_GAME", err.to_string()))?;

    let username = auth.username.clone().unwrap_or_else(|| auth.user_id.clone());
    trivia_db::users::upsert_user(&state.db, &auth.user_id, &username).await?;

    let id = trivia_core::id::generate_game_id();
    let game = trivia_db::games::create_game(
        &state.db,
        &id,
        &req.name,
        &auth.user_id,
        &username,
        req.question_time as i32,
        req.answer_time as i32,
    )
    .await?;

    Ok(Json(to_summary(&state, game).await?))
}

/// `GET /games` — open (joinable) games only.
#[utoipa::path(
    get,
    path = "/api/v1/games",
    responses((status = 200, description = "Open games", body = GameListResponse)),
    tag = "games"
)]
pub async fn list_open_games(State(state): State<AppState>) -> Result<Json<GameListResponse>, ApiError> {
    let rows = trivia_db::games::list_open_games(&state.db).await?;
    let mut games = Vec::with_capacity(rows.len());
    for row in rows {
        games.push(to_summary(&state, row).await?);
    }
    Ok(Json(GameListResponse { games }))
}

/// `GET /games/recent_states` — the caller's ended games, most-recent first.
#[utoipa::path(
    get,
    path = "/api/v1/games/recent_states",
    responses(
        (status = 200, description = "Caller's ended games", body = GameListResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "games"
)]
pub async fn recent_states(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<GameListResponse>, ApiError> {
    let rows = trivia_db::games::list_ended_games_for_player(&state.db, &auth.user_id).await?;
    let mut games = Vec::with_capacity(rows.len());
    for row in rows {
        games.push(to_summary(&state, row).await?);
    }
    Ok(Json(GameListResponse { games }))
}

/// `POST /games/{id}/join_game`.
#[utoipa::path(
    post,
    path = "/api/v1/games/{id}/join_game",
    params(("id" = String, Path, description = "Game ID (e.g. gam_V1StGXR8_Z5j)")),
    responses(
        (status = 200, description = "Joined", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Game not found"),
        (status = 423, description = "Game already started"),
    ),
    tag = "games"
)]
pub async fn join_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let game = trivia_db::games::get_game(&state.db, &id).await?.ok_or_else(|| ApiError::not_found("Game"))?;

    if !game.is_open() {
        return Err(ApiError::locked("El juego ya comenzó, no permite inscripción."));
    }

    let username = auth.username.clone().unwrap_or_else(|| auth.user_id.clone());
    trivia_db::users::upsert_user(&state.db, &auth.user_id, &username).await?;

    if !trivia_db::games::is_player(&state.db, &id, &auth.user_id).await? {
        trivia_db::games::join_game(&state.db, &id, &auth.user_id, &username).await?;
    }

    state
        .hub
        .broadcast(&id, CrudEvent::PlayerJoined { user_id: auth.user_id, username }.into())
        .await;

    Ok(Json(MessageResponse { message: "Te has unido correctamente al juego.".to_string() }))
}

/// `POST /games/{id}/unjoin_game`.
#[utoipa::path(
    post,
    path = "/api/v1/games/{id}/unjoin_game",
    params(("id" = String, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Left the game", body = MessageResponse),
        (status = 400, description = "Not a player, or caller is the creator"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Game not found"),
        (status = 423, description = "Game already started"),
    ),
    tag = "games"
)]
pub async fn unjoin_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let game = trivia_db::games::get_game(&state.db, &id).await?.ok_or_else(|| ApiError::not_found("Game"))?;

    if game.creator_id == auth.user_id {
        return Err(ApiError::bad_request(
            "CREATOR_CANNOT_UNJOIN",
            "El crador del juego no puede desvincularse.",
        ));
    }

    if !game.is_open() {
        return Err(ApiError::locked("El juego ya comenzó, no permite inscripción."));
    }

    if !trivia_db::games::is_player(&state.db, &id, &auth.user_id).await? {
        return Err(ApiError::bad_request("NOT_A_PLAYER", "No estás inscrito en este juego."));
    }

    trivia_db::games::unjoin_game(&state.db, &id, &auth.user_id).await?;

    let username = auth.username.clone().unwrap_or_else(|| auth.user_id.clone());
    state
        .hub
        .broadcast(&id, CrudEvent::PlayerUnjoined { user_id: auth.user_id, username }.into())
        .await;

    Ok(Json(MessageResponse { message: "Has abandonado el juego.".to_string() }))
}

/// `DELETE /games/{id}` — creator-only; broadcasts `game_deleted` before the
/// row is actually removed, matching `perform_destroy`'s ordering.
#[utoipa::path(
    delete,
    path = "/api/v1/games/{id}",
    params(("id" = String, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Game deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Game not found"),
    ),
    tag = "games"
)]
pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let game = trivia_db::games::get_game(&state.db, &id).await?.ok_or_else(|| ApiError::not_found("Game"))?;

    if game.creator_id != auth.user_id {
        return Err(ApiError::forbidden("No eres el creador de este juego."));
    }

    state.hub.broadcast(&id, CrudEvent::GameDeleted { userid: id.clone() }.into()).await;
    state.hub.shutdown(&id).await;

    trivia_db::games::delete_game(&state.db, &id).await?;

    Ok(Json(MessageResponse { message: "Juego eliminado.".to_string() }))
}
