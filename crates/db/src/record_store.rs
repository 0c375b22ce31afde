//! The Record Store proper (spec §4.4): transactional persistence of Round,
//! Move, Qualification, Fault, and ActionError rows, plus the two
//! operations the per-game actor needs around the orchestrator's pure
//! `reduce()`:
//!
//! - `load_state` rebuilds a `trivia_core::game::OrchestratorState` from the
//!   database on actor startup (or after a crash/restart — spec §9's
//!   "a rewrite should group each action's reads/writes in one transaction
//!   keyed by game id" implies the Round a crash leaves mid-phase must be
//!   fully recoverable from stored timestamps alone, which is exactly what
//!   `RoundInfo::phase()` derives).
//! - `apply` persists one `reduce()` call's `PersistOp` list inside a single
//!   `sqlx::Transaction`, so a partial failure can never leave the database
//!   straddling two phases.

use sqlx::Row;

use trivia_core::game::state::{
    ActionErrorRecord, FaultCategory, FaultRecord, GameInfo, MoveRecord, OrchestratorState, PlayerRecord,
    QualificationRecord, RoundInfo,
};
use trivia_core::game::reducer::PersistOp;

use crate::DbPool;
use crate::error::DbError;
use crate::games;

fn fault_category_from_code(code: &str) -> FaultCategory {
    match code {
        "QT" => FaultCategory::QuestionTimeout,
        "AT" => FaultCategory::AnswerTimeout,
        "ET" => FaultCategory::EvaluationTimeout,
        "FT" => FaultCategory::AssessTimeout,
        _ => FaultCategory::FocusInfraction,
    }
}

/// Rebuilds the full in-memory aggregate the orchestrator reduces over.
/// Called once when a per-game actor starts (on first action against a game
/// with no running actor yet, or after a server restart).
pub async fn load_state(pool: &DbPool, game_id: &str) -> Result<OrchestratorState, DbError> {
    let game = games::get_game(pool, game_id).await?.ok_or_else(|| DbError::GameNotFound(game_id.to_string()))?;
    let players = games::players_for_game(pool, game_id).await?;

    let game_info = GameInfo {
        game_id: game.id.clone(),
        name: game.name,
        host_id: game.creator_id,
        question_time: game.question_time as u32,
        answer_time: game.answer_time as u32,
        rounds_number: game.rounds_number.map(|n| n as u32),
        created_at: game.created_at,
        started_at: game.started_at,
        ended_at: game.ended_at,
        canceled: game.canceled,
    };

    let mut player_records: Vec<PlayerRecord> = players
        .iter()
        .map(|p| PlayerRecord {
            user_id: p.user_id.clone(),
            display_name: p.username.clone(),
            is_host: p.is_host,
            joined_at: p.joined_at,
            connected: true,
            disqualified: false,
        })
        .collect();

    let rounds = sqlx::query!(
        r#"
        SELECT id, game_id, round_number, nosy_id, question, started_at,
               question_arrived_at, answer_ended_at, qualify_ended_at, ended_at
        FROM rounds WHERE game_id = $1 ORDER BY round_number ASC
        "#,
        game_id
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| RoundInfo {
        round_id: r.id,
        game_id: r.game_id,
        round_number: r.round_number as u32,
        nosy_id: r.nosy_id,
        question: r.question,
        started_at: r.started_at,
        question_arrived_at: r.question_arrived_at,
        answer_ended_at: r.answer_ended_at,
        qualify_ended_at: r.qualify_ended_at,
        ended_at: r.ended_at,
    })
    .collect::<Vec<_>>();

    let moves = sqlx::query!(
        r#"
        SELECT m.id, m.round_id, m.player_id, m.text, m.submitted_at, m.grade, m.auto_graded
        FROM moves m JOIN rounds r ON r.id = m.round_id WHERE r.game_id = $1
        "#,
        game_id
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|m| MoveRecord {
        move_id: m.id,
        round_id: m.round_id,
        player_id: m.player_id,
        text: m.text,
        submitted_at: m.submitted_at,
        grade: m.grade,
        auto_graded: m.auto_graded,
    })
    .collect::<Vec<_>>();

    let qualifications = sqlx::query!(
        r#"
        SELECT q.id, q.round_id, q.reviewer_id, q.move_id, q.assessed_correct, q.assessed_at
        FROM qualifications q JOIN rounds r ON r.id = q.round_id WHERE r.game_id = $1
        "#,
        game_id
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|q| QualificationRecord {
        qualification_id: q.id,
        round_id: q.round_id,
        reviewer_id: q.reviewer_id,
        move_id: q.move_id,
        assessed_correct: q.assessed_correct,
        assessed_at: q.assessed_at,
    })
    .collect::<Vec<_>>();

    let faults = sqlx::query(
        r#"SELECT f.id, f.player_id, f.round_id, f.category, f.created_at
           FROM faults f WHERE f.game_id = $1"#,
    )
    .bind(game_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| FaultRecord {
        fault_id: row.get("id"),
        player_id: row.get("player_id"),
        round_id: row.get("round_id"),
        category: fault_category_from_code(row.get::<String, _>("category").as_str()),
        created_at: row.get("created_at"),
    })
    .collect::<Vec<_>>();

    // Fault weight determines disqualification; mark players whose total is
    // already past the threshold (a restarted actor must recover this too).
    for player in &mut player_records {
        let total: i32 = faults.iter().filter(|f| f.player_id == player.user_id).map(|f| f.weight()).sum();
        if total >= trivia_core::game::DISQUALIFICATION_THRESHOLD {
            player.disqualified = true;
        }
    }

    Ok(OrchestratorState {
        game: game_info,
        players: player_records,
        rounds,
        moves,
        qualifications,
        faults,
    })
}

/// Persists one `reduce()` call's side effects inside a single transaction.
/// `game_id` scopes every write — `PersistOp::UpsertPlayer`/`InsertFault`
/// don't carry their own game id (a `PlayerRecord`/`FaultRecord` only makes
/// sense within the aggregate that owns it), so the caller, which already
/// holds the single game this action was reduced against, supplies it.
pub async fn apply(pool: &DbPool, game_id: &str, ops: Vec<PersistOp>) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for op in ops {
        match op {
            PersistOp::UpsertGame(game) => {
                sqlx::query!(
                    r#"
                    UPDATE games SET started_at = $2, ended_at = $3, rounds_number = $4, canceled = $5
                    WHERE id = $1
                    "#,
                    game.game_id,
                    game.started_at,
                    game.ended_at,
                    game.rounds_number.map(|n| n as i32),
                    game.canceled
                )
                .execute(&mut *tx)
                .await?;
            }
            PersistOp::UpsertPlayer(player) => {
                sqlx::query!(
                    "UPDATE game_players SET username = $3 WHERE game_id = $1 AND user_id = $2",
                    game_id,
                    player.user_id,
                    player.display_name
                )
                .execute(&mut *tx)
                .await?;
            }
            PersistOp::UpsertRound(round) => {
                sqlx::query!(
                    r#"
                    INSERT INTO rounds (id, game_id, round_number, nosy_id, question, started_at,
                                        question_arrived_at, answer_ended_at, qualify_ended_at, ended_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    ON CONFLICT (id) DO UPDATE SET
                        nosy_id = EXCLUDED.nosy_id,
                        question = EXCLUDED.question,
                        question_arrived_at = EXCLUDED.question_arrived_at,
                        answer_ended_at = EXCLUDED.answer_ended_at,
                        qualify_ended_at = EXCLUDED.qualify_ended_at,
                        ended_at = EXCLUDED.ended_at
                    "#,
                    round.round_id,
                    round.game_id,
                    round.round_number as i32,
                    round.nosy_id,
                    round.question,
                    round.started_at,
                    round.question_arrived_at,
                    round.answer_ended_at,
                    round.qualify_ended_at,
                    round.ended_at
                )
                .execute(&mut *tx)
                .await?;
            }
            PersistOp::UpsertMove(mv) => {
                sqlx::query!(
                    r#"
                    INSERT INTO moves (id, round_id, player_id, text, submitted_at, grade, auto_graded)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ON CONFLICT (id) DO UPDATE SET grade = EXCLUDED.grade, auto_graded = EXCLUDED.auto_graded
                    "#,
                    mv.move_id,
                    mv.round_id,
                    mv.player_id,
                    mv.text,
                    mv.submitted_at,
                    mv.grade,
                    mv.auto_graded
                )
                .execute(&mut *tx)
                .await?;
            }
            PersistOp::UpsertQualification(q) => {
                sqlx::query!(
                    r#"
                    INSERT INTO qualifications (id, round_id, reviewer_id, move_id, assessed_correct, assessed_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (id) DO UPDATE SET assessed_correct = EXCLUDED.assessed_correct, assessed_at = EXCLUDED.assessed_at
                    "#,
                    q.qualification_id,
                    q.round_id,
                    q.reviewer_id,
                    q.move_id,
                    q.assessed_correct,
                    q.assessed_at
                )
                .execute(&mut *tx)
                .await?;
            }
            PersistOp::InsertFault(fault) => {
                sqlx::query(
                    r#"INSERT INTO faults (id, game_id, player_id, round_id, category, created_at)
                       VALUES ($1, $2, $3, $4, $5, $6)"#,
                )
                .bind(&fault.fault_id)
                .bind(game_id)
                .bind(&fault.player_id)
                .bind(&fault.round_id)
                .bind(fault.category.code())
                .bind(fault.created_at)
                .execute(&mut *tx)
                .await?;
            }
            PersistOp::InsertActionError(err) => {
                sqlx::query!(
                    r#"
                    INSERT INTO action_errors (id, game_id, actor, action, message, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                    err.error_id,
                    err.game_id,
                    err.actor,
                    err.action,
                    err.message,
                    err.created_at
                )
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_category_roundtrips_through_code() {
        for category in [
            FaultCategory::QuestionTimeout,
            FaultCategory::AnswerTimeout,
            FaultCategory::EvaluationTimeout,
            FaultCategory::AssessTimeout,
            FaultCategory::FocusInfraction,
        ] {
            assert_eq!(fault_category_from_code(category.code()), category);
        }
    }
}
