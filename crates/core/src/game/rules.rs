//! Game configuration and the timing constants that drive the Timer Scheduler.

use serde::{Deserialize, Serialize};

/// Grace period added after every per-phase duration before a timer is
/// considered to have genuinely expired (absorbs network/scheduling jitter).
pub const DELTA_TIME_SECS: i64 = 2;

/// Warm-up delay between `start()` succeeding and the first round's question
/// phase opening.
pub const START_TIME_SECS: i64 = 5;

/// Fixed duration of the qualifying phase (nosy grading window).
pub const QUALIFY_TIME_SECS: i64 = 90;

/// Fixed duration of the evaluating phase (cross-assessment window).
pub const ASSESS_TIME_SECS: i64 = 30;

/// The only permitted values for `question_time` / `answer_time`.
pub const ALLOWED_ROUND_TIMES: [u32; 3] = [60, 90, 120];

/// Minimum active player count below which a game is canceled outright.
pub const MIN_ACTIVE_PLAYERS: usize = 3;

/// Total accumulated fault weight at which a player becomes disqualified.
pub const DISQUALIFICATION_THRESHOLD: i32 = 3;

/// Per-game configuration, set at creation and partially re-validated at `start()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seconds allotted for the nosy to pose a question.
    pub question_time: u32,
    /// Seconds allotted for the rest to submit an answer.
    pub answer_time: u32,
    /// Total rounds for the game, fixed by `start()` (one nosy assignment
    /// slot apiece at minimum).
    pub rounds_number: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { question_time: 90, answer_time: 90, rounds_number: None }
    }
}

impl GameConfig {
    /// Validates a requested `question_time`/`answer_time` value against the
    /// allowed set, mirroring `GameSerializer.validate_question_time` /
    /// `validate_answer_time` in the original implementation.
    pub fn validate_round_time(value: u32) -> Result<(), &'static str> {
        if ALLOWED_ROUND_TIMES.contains(&value) {
            Ok(())
        } else {
            Err("El valor para QUESTION TIME no es uno de los permitidos")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.question_time, 90);
        assert_eq!(config.answer_time, 90);
        assert!(config.rounds_number.is_none());
    }

    #[test]
    fn test_validate_round_time() {
        assert!(GameConfig::validate_round_time(60).is_ok());
        assert!(GameConfig::validate_round_time(90).is_ok());
        assert!(GameConfig::validate_round_time(120).is_ok());
        assert!(GameConfig::validate_round_time(75).is_err());
    }
}
