//! DTOs for the CRUD surface: `/games`, `/games/{id}/join_game`,
//! `/games/{id}/unjoin_game`, `/games/{id}`, `/games/recent_states`.
//! Field names and validation rules are taken from
//! `original_source/trivia_api/serializers.py`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

fn validate_round_time(value: u32) -> Result<(), validator::ValidationError> {
    if trivia_core::game::ALLOWED_ROUND_TIMES.contains(&value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_round_time"))
    }
}

/// `POST /games` request body.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 3, message = "El nombre de la partida debe tener al menos 3 caracteres"))]
    pub name: String,
    #[validate(custom(function = "validate_round_time"))]
    #[serde(default = "default_round_time")]
    pub question_time: u32,
    #[validate(custom(function = "validate_round_time"))]
    #[serde(default = "default_round_time")]
    pub answer_time: u32,
}

fn default_round_time() -> u32 {
    90
}

/// One row of `GET /games` (open games only) or `GET /games/recent_states`
/// (the caller's ended games).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub question_time: u32,
    pub answer_time: u32,
    pub rounds_number: Option<u32>,
    pub players_count: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// `GET /games` / `GET /games/recent_states` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameListResponse {
    pub games: Vec<GameSummary>,
}

/// `POST /games/{id}/join_game` / `unjoin_game` response — a bare message,
/// matching the original's plain-text acknowledgement responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_name() {
        let req = CreateGameRequest { name: "ab".into(), question_time: 90, answer_time: 90 };
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_disallowed_round_time() {
        let req = CreateGameRequest { name: "Trivia Night".into(), question_time: 75, answer_time: 90 };
        assert!(req.validate().is_err());
    }

    #[test]
    fn accepts_valid_request() {
        let req = CreateGameRequest { name: "Trivia Night".into(), question_time: 60, answer_time: 120 };
        assert!(req.validate().is_ok());
    }
}
