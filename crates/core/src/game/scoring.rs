//! Scoring: per-move grades submitted by the nosy, and the nosy's own score
//! for how well their grading held up under cross-assessment.
//!
//! Ported from `nosy_score` / `player_score` / `get_scores` in the original
//! implementation.

use super::events::ScoreEntry;
use super::state::OrchestratorState;

/// The nosy's score for a single round, computed from how many of their
/// grading qualifications were later judged incorrect.
///
/// A round with no qualifications (nobody else played, or all moves
/// self-reviewed and thus never counted) scores the nosy a flat `+3`. This
/// is a product-intent assumption: the original awards it identically
/// to a flawless grading pass, rather than treating an unreviewable round
/// as unscored.
pub fn nosy_score(qualifications: usize, incorrect: usize) -> i32 {
    if qualifications == 0 {
        return 3;
    }
    let ratio = (qualifications - incorrect) as f64 / qualifications as f64;
    if ratio >= 0.8 {
        3
    } else if ratio >= 0.5 {
        1
    } else {
        -2
    }
}

/// A single player's total score across the whole game: the sum of every
/// grade they received on their own moves, plus the nosy score from every
/// round they served as nosy.
pub fn player_score(state: &OrchestratorState, user_id: &str) -> i32 {
    let move_points: i32 = state.moves.iter().filter(|m| m.player_id == user_id).filter_map(|m| m.grade).sum();

    let nosy_points: i32 = state
        .rounds_as_nosy(user_id)
        .iter()
        .map(|round| {
            let qualifications = state.qualifications_for_round(&round.round_id);
            let total = qualifications.len();
            let incorrect = qualifications.iter().filter(|q| q.assessed_correct == Some(false)).count();
            nosy_score(total, incorrect)
        })
        .sum();

    move_points + nosy_points
}

/// Every player who has ever joined the game, including disqualified ones,
/// with their current total score. Used for `round_result`, `game_result`,
/// and `game_canceled` payloads alike.
pub fn game_scores(state: &OrchestratorState) -> Vec<ScoreEntry> {
    state.players.iter().map(|p| ScoreEntry { user_id: p.user_id.clone(), score: player_score(state, &p.user_id) }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{FaultCategory, GameInfo, MoveRecord, PlayerRecord, QualificationRecord, RoundInfo};
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn nosy_score_perfect_grading() {
        assert_eq!(nosy_score(4, 0), 3);
    }

    #[test]
    fn nosy_score_mostly_correct() {
        assert_eq!(nosy_score(4, 1), 1); // ratio 0.75 -> below 0.8, at least 0.5
    }

    #[test]
    fn nosy_score_mostly_incorrect() {
        assert_eq!(nosy_score(4, 3), -2);
    }

    #[test]
    fn nosy_score_with_no_qualifications() {
        assert_eq!(nosy_score(0, 0), 3);
    }

    #[test]
    fn nosy_score_boundary_ratios() {
        assert_eq!(nosy_score(5, 1), 3); // ratio 0.8 exactly
        assert_eq!(nosy_score(2, 1), 1); // ratio 0.5 exactly
    }

    fn test_state() -> OrchestratorState {
        let game = GameInfo {
            game_id: "gam_test".into(),
            name: "Test Game".into(),
            host_id: "usr_a".into(),
            question_time: 90,
            answer_time: 90,
            rounds_number: Some(2),
            created_at: now(),
            started_at: Some(now()),
            ended_at: None,
            canceled: false,
        };
        let host = PlayerRecord::new("usr_a", "A", true, now());
        let mut state = OrchestratorState::new(game, host);
        state.players.push(PlayerRecord::new("usr_b", "B", false, now()));
        state.players.push(PlayerRecord::new("usr_c", "C", false, now()));
        state
    }

    #[test]
    fn player_score_sums_move_grades() {
        let mut state = test_state();
        state.moves.push(MoveRecord {
            move_id: "mov_1".into(),
            round_id: "rnd_1".into(),
            player_id: "usr_b".into(),
            text: "x".into(),
            submitted_at: now(),
            grade: Some(3),
            auto_graded: false,
        });
        state.moves.push(MoveRecord {
            move_id: "mov_2".into(),
            round_id: "rnd_2".into(),
            player_id: "usr_b".into(),
            text: "y".into(),
            submitted_at: now(),
            grade: Some(-2),
            auto_graded: false,
        });
        assert_eq!(player_score(&state, "usr_b"), 1);
    }

    #[test]
    fn player_score_includes_nosy_points_from_own_rounds() {
        let mut state = test_state();
        state.rounds.push(RoundInfo::new("rnd_1", "gam_test", 1, "usr_a", now()));
        state.qualifications.push(QualificationRecord {
            qualification_id: "qua_1".into(),
            round_id: "rnd_1".into(),
            reviewer_id: "usr_b".into(),
            move_id: "mov_1".into(),
            assessed_correct: Some(true),
            assessed_at: Some(now()),
        });
        state.qualifications.push(QualificationRecord {
            qualification_id: "qua_2".into(),
            round_id: "rnd_1".into(),
            reviewer_id: "usr_c".into(),
            move_id: "mov_2".into(),
            assessed_correct: Some(true),
            assessed_at: Some(now()),
        });
        // 2/2 correct -> ratio 1.0 -> +3 nosy points, no move grades of their own.
        assert_eq!(player_score(&state, "usr_a"), 3);
    }

    #[test]
    fn game_scores_includes_disqualified_players() {
        let mut state = test_state();
        state.get_player_mut("usr_c").unwrap().disqualified = true;
        state.faults.push(super::super::state::FaultRecord {
            fault_id: "flt_1".into(),
            player_id: "usr_c".into(),
            round_id: None,
            category: FaultCategory::QuestionTimeout,
            created_at: now(),
        });

        let scores = game_scores(&state);
        let ids: Vec<&str> = scores.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["usr_a", "usr_b", "usr_c"]);
    }
}
