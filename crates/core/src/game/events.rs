//! Outbound events emitted by the reducer, and the delivery envelope that
//! tells the Room Hub who should receive each one.

use serde::{Deserialize, Serialize};

use super::state::FaultCategory;

/// One player's score line in a `round_result` or `game_result` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user_id: String,
    pub score: i32,
}

/// A single per-round delta, bundled into `round_result.round_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResultEntry {
    pub user_id: String,
    pub round_score: i32,
}

/// Every event the Round Orchestrator can produce, tagged for the wire the
/// same way the inbound actions are: a `type` discriminant plus a flat
/// payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined { user_id: String, display_name: String },
    PlayerUnjoined { user_id: String },
    GameDeleted,
    GameStarted { rounds: u32, players: Vec<String> },
    RoundStarted { round_number: u32, nosy_id: String },
    RoundQuestion { question: String },
    /// Unicast to the nosy only, and only for answers from someone other
    /// than the nosy themselves.
    RoundAnswer { answer: String, userid: String },
    AnswerTimeEnded,
    QuestionTimeEnded,
    QualifyTimeout,
    /// Unicast, one per reviewer, carrying the material they need to assess.
    RoundReviewAnswer { correct_answer: String, graded_answer: String, grade: i32 },
    AssessTimeout,
    RoundResult { round_results: Vec<RoundResultEntry>, game_scores: Vec<ScoreEntry> },
    GameResult { game_scores: Vec<ScoreEntry> },
    GameCanceled { message: String, game_scores: Vec<ScoreEntry> },
    UserFault { player_id: String, category: &'static str },
    UserDisqualified { player_id: String },
    Error { message: String },
}

impl GameEvent {
    /// Builds the `error{message}` event, mirroring the literal Spanish
    /// error strings the wire protocol requires verbatim.
    pub fn error(message: impl Into<String>) -> Self {
        GameEvent::Error { message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GameEvent::Error { .. })
    }

    pub fn fault(player_id: impl Into<String>, category: FaultCategory) -> Self {
        GameEvent::UserFault { player_id: player_id.into(), category: category.code() }
    }

    /// Stable lowercase name, matching the wire `type` tag, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::PlayerJoined { .. } => "player_joined",
            GameEvent::PlayerUnjoined { .. } => "player_unjoined",
            GameEvent::GameDeleted => "game_deleted",
            GameEvent::GameStarted { .. } => "game_started",
            GameEvent::RoundStarted { .. } => "round_started",
            GameEvent::RoundQuestion { .. } => "round_question",
            GameEvent::RoundAnswer { .. } => "round_answer",
            GameEvent::AnswerTimeEnded => "answer_time_ended",
            GameEvent::QuestionTimeEnded => "question_time_ended",
            GameEvent::QualifyTimeout => "qualify_timeout",
            GameEvent::RoundReviewAnswer { .. } => "round_review_answer",
            GameEvent::AssessTimeout => "assess_timeout",
            GameEvent::RoundResult { .. } => "round_result",
            GameEvent::GameResult { .. } => "game_result",
            GameEvent::GameCanceled { .. } => "game_canceled",
            GameEvent::UserFault { .. } => "user_fault",
            GameEvent::UserDisqualified { .. } => "user_disqualified",
            GameEvent::Error { .. } => "error",
        }
    }
}

/// Who an event is delivered to. The Room Hub fans a `Broadcast` out to
/// every connected player in the game; a `Unicast` goes to exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Broadcast,
    Unicast(String),
}

/// An event paired with its delivery target, as produced by `reduce()` and
/// consumed by the Room Hub.
#[derive(Debug, Clone)]
pub struct Effect {
    pub event: GameEvent,
    pub delivery: Delivery,
}

impl Effect {
    pub fn broadcast(event: GameEvent) -> Self {
        Self { event, delivery: Delivery::Broadcast }
    }

    pub fn unicast(user_id: impl Into<String>, event: GameEvent) -> Self {
        Self { event, delivery: Delivery::Unicast(user_id.into()) }
    }
}
