//! Orchestrator commands for the reducer pattern.
//!
//! A command is either a player-initiated action relayed from a Session, or
//! a timeout fired by the Timer Scheduler. The reducer processes exactly one
//! command at a time and produces a new `OrchestratorState` plus a
//! `ReducerOutcome`.

use serde::{Deserialize, Serialize};

/// A player-initiated or scheduler-initiated command applied to one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrchestratorAction {
    /// Host starts the game, fixing the round count for the whole game.
    Start { actor: String, rounds: u32 },
    /// Nosy submits the round's question.
    Question { actor: String, text: String },
    /// Any active non-nosy player submits an answer.
    Answer { actor: String, text: String },
    /// Nosy grades a submitted move.
    Qualify { actor: String, target_player: String, grade: i32 },
    /// A reviewer assesses the fairness of the grade on their assigned move.
    Assess { actor: String, is_correct: bool },
    /// Question timer fired: the nosy never submitted a question.
    QuestionTimeout,
    /// Answer timer fired: the answering window is over.
    AnswerTimeout,
    /// Qualify timer fired: the nosy never finished grading every move.
    QualifyTimeout,
    /// Assess timer fired: the evaluating window is over, unconditionally.
    AssessTimeout,
}

impl OrchestratorAction {
    /// The acting player's id, for player-initiated actions. Timeouts have no
    /// actor since the Timer Scheduler issues them, not a connection.
    pub fn actor(&self) -> Option<&str> {
        match self {
            OrchestratorAction::Start { actor, .. }
            | OrchestratorAction::Question { actor, .. }
            | OrchestratorAction::Answer { actor, .. }
            | OrchestratorAction::Qualify { actor, .. }
            | OrchestratorAction::Assess { actor, .. } => Some(actor),
            OrchestratorAction::QuestionTimeout
            | OrchestratorAction::AnswerTimeout
            | OrchestratorAction::QualifyTimeout
            | OrchestratorAction::AssessTimeout => None,
        }
    }

    /// Whether only the host may issue this action.
    pub fn requires_host(&self) -> bool {
        matches!(self, OrchestratorAction::Start { .. })
    }

    /// Stable lowercase name for logging and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            OrchestratorAction::Start { .. } => "start",
            OrchestratorAction::Question { .. } => "question",
            OrchestratorAction::Answer { .. } => "answer",
            OrchestratorAction::Qualify { .. } => "qualify",
            OrchestratorAction::Assess { .. } => "assess",
            OrchestratorAction::QuestionTimeout => "question_timeout",
            OrchestratorAction::AnswerTimeout => "answer_timeout",
            OrchestratorAction::QualifyTimeout => "qualify_timeout",
            OrchestratorAction::AssessTimeout => "assess_timeout",
        }
    }

    /// Whether this action is a scheduler-fired timeout rather than a
    /// player-initiated command.
    pub fn is_timeout(&self) -> bool {
        self.actor().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_is_none_for_timeouts() {
        assert_eq!(OrchestratorAction::QuestionTimeout.actor(), None);
        assert_eq!(OrchestratorAction::AnswerTimeout.actor(), None);
        assert_eq!(OrchestratorAction::QualifyTimeout.actor(), None);
        assert_eq!(OrchestratorAction::AssessTimeout.actor(), None);
    }

    #[test]
    fn actor_is_some_for_player_commands() {
        let cmd = OrchestratorAction::Answer { actor: "usr_a".into(), text: "42".into() };
        assert_eq!(cmd.actor(), Some("usr_a"));
    }

    #[test]
    fn only_start_requires_host() {
        assert!(OrchestratorAction::Start { actor: "usr_a".into(), rounds: 5 }.requires_host());
        assert!(!OrchestratorAction::Answer { actor: "usr_a".into(), text: "x".into() }.requires_host());
    }

    #[test]
    fn name_is_stable() {
        assert_eq!(OrchestratorAction::QualifyTimeout.name(), "qualify_timeout");
        assert_eq!(
            OrchestratorAction::Qualify { actor: "usr_a".into(), target_player: "usr_b".into(), grade: 3 }.name(),
            "qualify"
        );
    }

    #[test]
    fn is_timeout_distinguishes_scheduler_from_player() {
        assert!(OrchestratorAction::AssessTimeout.is_timeout());
        assert!(!OrchestratorAction::Start { actor: "usr_a".into(), rounds: 5 }.is_timeout());
    }
}
