//! The orchestrator's view of a game: the host-owned `GameInfo`, the
//! append-only history of rounds/moves/qualifications/faults, and the
//! `OrchestratorState` aggregate that `reduce()` operates over.
//!
//! Round phase is never stored as an explicit enum field. It is derived from
//! which of a round's four completion timestamps are set, the same
//! soft-delete-via-nullable-timestamp convention the Record Store uses for
//! rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The phase of a single round, derived from its timestamps rather than
/// stored directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Waiting for the nosy to submit `question`.
    Questioning,
    /// Question is live; players may `answer`.
    Answering,
    /// Answer window closed; the nosy grades submitted moves with `qualify`.
    Qualifying,
    /// Qualifications assigned; reviewers `assess` their assigned move.
    Evaluating,
    /// Assessment window closed; round is over.
    Finished,
}

/// A player's standing within one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub user_id: String,
    pub display_name: String,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
    pub connected: bool,
    pub disqualified: bool,
}

impl PlayerRecord {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, is_host: bool, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            is_host,
            joined_at: now,
            connected: true,
            disqualified: false,
        }
    }
}

/// An answer submitted by a non-nosy player during the answering phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub move_id: String,
    pub round_id: String,
    pub player_id: String,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
    /// Grade assigned by the nosy during the qualifying phase. `None` until
    /// graded; auto-graded moves (qualify timeout) carry `auto = true`.
    pub grade: Option<i32>,
    pub auto_graded: bool,
}

/// A cross-assessment assignment: `reviewer_id` judges whether the nosy's
/// grade on `move_id` was fair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationRecord {
    pub qualification_id: String,
    pub round_id: String,
    pub reviewer_id: String,
    pub move_id: String,
    pub assessed_correct: Option<bool>,
    pub assessed_at: Option<DateTime<Utc>>,
}

/// The reason a fault was levied against a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// Nosy failed to submit a question before the question timer fired.
    QuestionTimeout,
    /// Player failed to submit an answer before the answer timer fired.
    AnswerTimeout,
    /// Nosy failed to grade every submitted move before the qualify timer fired.
    EvaluationTimeout,
    /// Reviewer failed to assess their assigned qualification before the assess timer fired.
    AssessTimeout,
    /// Client-reported focus infraction (e.g. leaving the game tab during a live round).
    FocusInfraction,
}

impl FaultCategory {
    /// Wire code used in `user_fault` events and Record Store rows.
    pub fn code(&self) -> &'static str {
        match self {
            FaultCategory::QuestionTimeout => "QT",
            FaultCategory::AnswerTimeout => "AT",
            FaultCategory::EvaluationTimeout => "ET",
            FaultCategory::AssessTimeout => "FT",
            FaultCategory::FocusInfraction => "FF",
        }
    }

    /// Weight added to a player's running fault total.
    pub fn weight(&self) -> i32 {
        match self {
            FaultCategory::QuestionTimeout => 2,
            FaultCategory::AnswerTimeout => 1,
            FaultCategory::EvaluationTimeout => 1,
            FaultCategory::AssessTimeout => 1,
            FaultCategory::FocusInfraction => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultRecord {
    pub fault_id: String,
    pub player_id: String,
    pub round_id: Option<String>,
    pub category: FaultCategory,
    pub created_at: DateTime<Utc>,
}

impl FaultRecord {
    pub fn weight(&self) -> i32 {
        self.category.weight()
    }
}

/// An audit record of a rejected action: who tried what, and why it failed.
/// Persisted so `error{message}` replies can be traced back after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionErrorRecord {
    pub error_id: String,
    pub game_id: String,
    pub actor: Option<String>,
    pub action: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// One round's full lifecycle. Phase is derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundInfo {
    pub round_id: String,
    pub game_id: String,
    pub round_number: u32,
    pub nosy_id: String,
    pub question: Option<String>,
    pub started_at: DateTime<Utc>,
    pub question_arrived_at: Option<DateTime<Utc>>,
    pub answer_ended_at: Option<DateTime<Utc>>,
    pub qualify_ended_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RoundInfo {
    pub fn new(round_id: impl Into<String>, game_id: impl Into<String>, round_number: u32, nosy_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            round_id: round_id.into(),
            game_id: game_id.into(),
            round_number,
            nosy_id: nosy_id.into(),
            question: None,
            started_at: now,
            question_arrived_at: None,
            answer_ended_at: None,
            qualify_ended_at: None,
            ended_at: None,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        if self.ended_at.is_some() {
            RoundPhase::Finished
        } else if self.qualify_ended_at.is_some() {
            RoundPhase::Evaluating
        } else if self.answer_ended_at.is_some() {
            RoundPhase::Qualifying
        } else if self.question_arrived_at.is_some() {
            RoundPhase::Answering
        } else {
            RoundPhase::Questioning
        }
    }
}

/// Game-level metadata, set at creation and by `start()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: String,
    pub name: String,
    pub host_id: String,
    pub question_time: u32,
    pub answer_time: u32,
    pub rounds_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub canceled: bool,
}

impl GameInfo {
    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_ended(&self) -> bool {
        self.ended_at.is_some() || self.canceled
    }
}

/// The full aggregate the Round Orchestrator reduces over: the game, its
/// players, and the append-only history of rounds, moves, qualifications,
/// and faults. This is rebuilt from the Record Store on actor startup and
/// held in memory for the lifetime of the per-game actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub game: GameInfo,
    /// Join order matters: nosy selection and qualification derangement both
    /// iterate players in a stable, deterministic order.
    pub players: Vec<PlayerRecord>,
    pub rounds: Vec<RoundInfo>,
    pub moves: Vec<MoveRecord>,
    pub qualifications: Vec<QualificationRecord>,
    pub faults: Vec<FaultRecord>,
}

impl OrchestratorState {
    pub fn new(game: GameInfo, host: PlayerRecord) -> Self {
        Self {
            game,
            players: vec![host],
            rounds: Vec::new(),
            moves: Vec::new(),
            qualifications: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn get_player(&self, user_id: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn get_player_mut(&mut self, user_id: &str) -> Option<&mut PlayerRecord> {
        self.players.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.game.host_id == user_id
    }

    /// Players still eligible to take part: joined, not disqualified.
    pub fn active_players(&self) -> Vec<&PlayerRecord> {
        self.players.iter().filter(|p| !p.disqualified).collect()
    }

    pub fn active_player_count(&self) -> usize {
        self.active_players().len()
    }

    /// Total fault weight accumulated by a player across the whole game.
    pub fn fault_sum(&self, user_id: &str) -> i32 {
        self.faults.iter().filter(|f| f.player_id == user_id).map(|f| f.weight()).sum()
    }

    pub fn is_disqualified(&self, user_id: &str) -> bool {
        self.fault_sum(user_id) >= super::rules::DISQUALIFICATION_THRESHOLD
    }

    /// The round currently in flight, if the game has started and the last
    /// round hasn't finished yet.
    pub fn current_round(&self) -> Option<&RoundInfo> {
        self.rounds.last().filter(|r| r.phase() != RoundPhase::Finished)
    }

    pub fn current_round_mut(&mut self) -> Option<&mut RoundInfo> {
        if self.rounds.last().map(|r| r.phase() != RoundPhase::Finished).unwrap_or(false) {
            self.rounds.last_mut()
        } else {
            None
        }
    }

    pub fn round(&self, round_id: &str) -> Option<&RoundInfo> {
        self.rounds.iter().find(|r| r.round_id == round_id)
    }

    pub fn moves_for_round(&self, round_id: &str) -> Vec<&MoveRecord> {
        self.moves.iter().filter(|m| m.round_id == round_id).collect()
    }

    pub fn qualifications_for_round(&self, round_id: &str) -> Vec<&QualificationRecord> {
        self.qualifications.iter().filter(|q| q.round_id == round_id).collect()
    }

    /// Rounds in which `user_id` served as the nosy, in round-number order.
    pub fn rounds_as_nosy(&self, user_id: &str) -> Vec<&RoundInfo> {
        self.rounds.iter().filter(|r| r.nosy_id == user_id).collect()
    }

    /// Per-player move text lookup, used when unicasting a qualifier's
    /// reviewing material.
    pub fn move_by_id(&self, move_id: &str) -> Option<&MoveRecord> {
        self.moves.iter().find(|m| m.move_id == move_id)
    }

    /// A HashMap view of players keyed by id, for callers that want O(1)
    /// lookups over several ids rather than repeated linear scans.
    pub fn players_by_id(&self) -> HashMap<&str, &PlayerRecord> {
        self.players.iter().map(|p| (p.user_id.as_str(), p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn test_state() -> OrchestratorState {
        let game = GameInfo {
            game_id: "gam_test".into(),
            name: "Test Game".into(),
            host_id: "usr_host".into(),
            question_time: 90,
            answer_time: 90,
            rounds_number: None,
            created_at: now(),
            started_at: None,
            ended_at: None,
            canceled: false,
        };
        let host = PlayerRecord::new("usr_host", "Host", true, now());
        OrchestratorState::new(game, host)
    }

    fn add_player(state: &mut OrchestratorState, id: &str) {
        state.players.push(PlayerRecord::new(id, id, false, now()));
    }

    #[test]
    fn round_phase_derivation_follows_timestamp_order() {
        let mut round = RoundInfo::new("rnd_1", "gam_test", 1, "usr_host", now());
        assert_eq!(round.phase(), RoundPhase::Questioning);

        round.question_arrived_at = Some(now());
        assert_eq!(round.phase(), RoundPhase::Answering);

        round.answer_ended_at = Some(now());
        assert_eq!(round.phase(), RoundPhase::Qualifying);

        round.qualify_ended_at = Some(now());
        assert_eq!(round.phase(), RoundPhase::Evaluating);

        round.ended_at = Some(now());
        assert_eq!(round.phase(), RoundPhase::Finished);
    }

    #[test]
    fn fault_sum_and_disqualification_threshold() {
        let mut state = test_state();
        add_player(&mut state, "usr_a");
        assert!(!state.is_disqualified("usr_a"));

        state.faults.push(FaultRecord {
            fault_id: "flt_1".into(),
            player_id: "usr_a".into(),
            round_id: None,
            category: FaultCategory::QuestionTimeout,
            created_at: now(),
        });
        assert_eq!(state.fault_sum("usr_a"), 2);
        assert!(!state.is_disqualified("usr_a"));

        state.faults.push(FaultRecord {
            fault_id: "flt_2".into(),
            player_id: "usr_a".into(),
            round_id: None,
            category: FaultCategory::AnswerTimeout,
            created_at: now(),
        });
        assert_eq!(state.fault_sum("usr_a"), 3);
        assert!(state.is_disqualified("usr_a"));
    }

    #[test]
    fn active_players_excludes_disqualified() {
        let mut state = test_state();
        add_player(&mut state, "usr_a");
        add_player(&mut state, "usr_b");
        state.get_player_mut("usr_b").unwrap().disqualified = true;

        let active: Vec<&str> = state.active_players().iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(active, vec!["usr_host", "usr_a"]);
    }

    #[test]
    fn current_round_is_none_once_finished() {
        let mut state = test_state();
        let mut round = RoundInfo::new("rnd_1", "gam_test", 1, "usr_host", now());
        state.rounds.push(round.clone());
        assert!(state.current_round().is_some());

        round.ended_at = Some(now());
        state.rounds.pop();
        state.rounds.push(round);
        assert!(state.current_round().is_none());
    }
}
