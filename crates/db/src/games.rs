//! Game CRUD: the row the orchestrator's `GameInfo` is hydrated from, and
//! the `game_players` roster. Round/Move/Qualification/Fault/ActionError —
//! the records the orchestrator itself owns — live in `record_store`.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::DbPool;
use crate::error::DbError;

#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: String, // gam_XXXXXXXXXXXX
    pub name: String,
    pub creator_id: String,
    pub question_time: i32,
    pub answer_time: i32,
    pub rounds_number: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub canceled: bool,
}

impl Game {
    pub fn is_open(&self) -> bool {
        self.started_at.is_none()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GamePlayer {
    pub game_id: String,
    pub user_id: String,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub is_host: bool,
}

/// Creates the game row and seats the creator as its first (host) player.
/// Runs as one transaction so a game is never persisted without its host.
pub async fn create_game(
    pool: &DbPool,
    id: &str,
    name: &str,
    creator_id: &str,
    creator_username: &str,
    question_time: i32,
    answer_time: i32,
) -> Result<Game, DbError> {
    let mut tx = pool.begin().await?;

    let game = sqlx::query_as!(
        Game,
        r#"
        INSERT INTO games (id, name, creator_id, question_time, answer_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, creator_id, question_time, answer_time, rounds_number,
                  created_at, started_at, ended_at, canceled
        "#,
        id,
        name,
        creator_id,
        question_time,
        answer_time
    )
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query!(
        "INSERT INTO game_players (game_id, user_id, username, is_host) VALUES ($1, $2, $3, true)",
        id,
        creator_id,
        creator_username
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(game)
}

pub async fn get_game(pool: &DbPool, id: &str) -> Result<Option<Game>, DbError> {
    let game = sqlx::query_as!(
        Game,
        r#"
        SELECT id, name, creator_id, question_time, answer_time, rounds_number,
               created_at, started_at, ended_at, canceled
        FROM games WHERE id = $1
        "#,
        id
    )
    .fetch_optional(pool)
    .await?;
    Ok(game)
}

/// `GET /games` — open (joinable, unstarted) games, most-recent first.
pub async fn list_open_games(pool: &DbPool) -> Result<Vec<Game>, DbError> {
    let games = sqlx::query_as!(
        Game,
        r#"
        SELECT id, name, creator_id, question_time, answer_time, rounds_number,
               created_at, started_at, ended_at, canceled
        FROM games WHERE started_at IS NULL
        ORDER BY created_at DESC
        "#
    )
    .fetch_all(pool)
    .await?;
    Ok(games)
}

/// `GET /games/recent_states` — the caller's ended games, most-recent first.
pub async fn list_ended_games_for_player(pool: &DbPool, user_id: &str) -> Result<Vec<Game>, DbError> {
    let games = sqlx::query_as!(
        Game,
        r#"
        SELECT g.id, g.name, g.creator_id, g.question_time, g.answer_time, g.rounds_number,
               g.created_at, g.started_at, g.ended_at, g.canceled
        FROM games g
        JOIN game_players p ON p.game_id = g.id
        WHERE p.user_id = $1 AND g.ended_at IS NOT NULL
        ORDER BY g.ended_at DESC
        "#,
        user_id
    )
    .fetch_all(pool)
    .await?;
    Ok(games)
}

pub async fn players_for_game(pool: &DbPool, game_id: &str) -> Result<Vec<GamePlayer>, DbError> {
    let players = sqlx::query_as!(
        GamePlayer,
        r#"SELECT game_id, user_id, username, joined_at, is_host FROM game_players WHERE game_id = $1 ORDER BY joined_at ASC"#,
        game_id
    )
    .fetch_all(pool)
    .await?;
    Ok(players)
}

pub async fn player_count(pool: &DbPool, game_id: &str) -> Result<i64, DbError> {
    let row = sqlx::query!("SELECT COUNT(*) as count FROM game_players WHERE game_id = $1", game_id)
        .fetch_one(pool)
        .await?;
    Ok(row.count.unwrap_or(0))
}

pub async fn is_player(pool: &DbPool, game_id: &str, user_id: &str) -> Result<bool, DbError> {
    let row = sqlx::query!(
        "SELECT EXISTS(SELECT 1 FROM game_players WHERE game_id = $1 AND user_id = $2) as exists",
        game_id,
        user_id
    )
    .fetch_one(pool)
    .await?;
    Ok(row.exists.unwrap_or(false))
}

/// Adds `user_id` to the roster. Caller must have already verified the game
/// is still open (spec §7's `join_game` admission rule).
pub async fn join_game(pool: &DbPool, game_id: &str, user_id: &str, username: &str) -> Result<(), DbError> {
    sqlx::query!(
        "INSERT INTO game_players (game_id, user_id, username, is_host) VALUES ($1, $2, $3, false)",
        game_id,
        user_id,
        username
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Removes `user_id` from the roster. Caller must have already verified the
/// game is open and the caller isn't the creator.
pub async fn unjoin_game(pool: &DbPool, game_id: &str, user_id: &str) -> Result<(), DbError> {
    sqlx::query!("DELETE FROM game_players WHERE game_id = $1 AND user_id = $2", game_id, user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fixes the roster and round count, marking the game as started. The
/// `OrchestratorState` in memory is the source of truth from this point on;
/// this just persists the equivalent row state.
pub async fn start_game(pool: &DbPool, game_id: &str, rounds_number: i32, started_at: DateTime<Utc>) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE games SET started_at = $2, rounds_number = $3 WHERE id = $1",
        game_id,
        started_at,
        rounds_number
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn end_game(pool: &DbPool, game_id: &str, ended_at: DateTime<Utc>, canceled: bool) -> Result<(), DbError> {
    sqlx::query!(
        "UPDATE games SET ended_at = $2, canceled = $3 WHERE id = $1",
        game_id,
        ended_at,
        canceled
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_game(pool: &DbPool, game_id: &str) -> Result<(), DbError> {
    sqlx::query!("DELETE FROM games WHERE id = $1", game_id).execute(pool).await?;
    Ok(())
}
