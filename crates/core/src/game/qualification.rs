//! Qualification assignment: deranging non-nosy moves across non-nosy
//! players so nobody reviews their own answer.
//!
//! Ported from `Round.create_qualifications` in the original implementation.
//! `moves[i]` is assumed to be authored by `players[i]` (every active
//! non-nosy player submits exactly one move, and both lists are taken in the
//! same creation order). The assignment is built in two passes: first every
//! fixed point `perm[i] == players[i]` is broken by swapping with its
//! successor (wrapping at the end), building the full permutation; only once
//! every position has been visited are the final `players[i] -> perm[i]`
//! pairs read off. Reading assignments out mid-pass would be wrong, since a
//! later swap — particularly the wraparound from the last index back to the
//! first — can still change an earlier slot. With a single move the lone
//! player reviews their own answer (accepted as a degenerate case); with
//! zero moves there is nothing to assign.

use super::state::MoveRecord;

/// One derangement assignment: `reviewer_id` is handed `move_id` to assess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationAssignment {
    pub reviewer_id: String,
    pub move_id: String,
}

/// Builds the round's qualification assignments.
///
/// `moves` must already be sorted by submission order and must exclude the
/// nosy's own entries (the nosy never submits a move). `players` must be the
/// active non-nosy players in the same creation order, with `players[i]`
/// the author of `moves[i]`.
pub fn create_qualifications(moves: &[MoveRecord], players: &[String]) -> Vec<QualificationAssignment> {
    if moves.is_empty() {
        return Vec::new();
    }

    let mut perm: Vec<&MoveRecord> = moves.iter().collect();
    let len = perm.len();

    for i in 0..len {
        if players.get(i).map(|p| &perm[i].player_id == p).unwrap_or(false) {
            let next = (i + 1) % len;
            perm.swap(i, next);
        }
    }

    players
        .iter()
        .zip(perm.iter())
        .map(|(player, mv)| QualificationAssignment { reviewer_id: player.clone(), move_id: mv.move_id.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn mv(id: &str, player: &str) -> MoveRecord {
        MoveRecord {
            move_id: id.into(),
            round_id: "rnd_1".into(),
            player_id: player.into(),
            text: "answer".into(),
            submitted_at: now(),
            grade: None,
            auto_graded: false,
        }
    }

    #[test]
    fn zero_moves_yields_no_assignments() {
        let assignments = create_qualifications(&[], &["usr_a".into()]);
        assert!(assignments.is_empty());
    }

    #[test]
    fn single_move_is_self_reviewed() {
        let moves = vec![mv("mov_1", "usr_a")];
        let players = vec!["usr_a".to_string()];
        let assignments = create_qualifications(&moves, &players);
        assert_eq!(assignments, vec![QualificationAssignment { reviewer_id: "usr_a".into(), move_id: "mov_1".into() }]);
    }

    #[test]
    fn no_reviewer_ever_gets_their_own_move_with_multiple_players() {
        let moves =
            vec![mv("mov_1", "usr_a"), mv("mov_2", "usr_b"), mv("mov_3", "usr_c")];
        let players = vec!["usr_a".to_string(), "usr_b".to_string(), "usr_c".to_string()];

        let assignments = create_qualifications(&moves, &players);
        assert_eq!(assignments.len(), 3);
        for assignment in &assignments {
            let authored_by_reviewer =
                moves.iter().find(|m| m.move_id == assignment.move_id).unwrap().player_id == assignment.reviewer_id;
            assert!(!authored_by_reviewer, "{:?} reviewed their own move", assignment);
        }
    }

    #[test]
    fn every_move_is_assigned_exactly_once_across_players() {
        let moves =
            vec![mv("mov_1", "usr_a"), mv("mov_2", "usr_b"), mv("mov_3", "usr_c"), mv("mov_4", "usr_d")];
        let players = vec!["usr_a".to_string(), "usr_b".to_string(), "usr_c".to_string(), "usr_d".to_string()];

        let assignments = create_qualifications(&moves, &players);
        let mut assigned_moves: Vec<&str> = assignments.iter().map(|a| a.move_id.as_str()).collect();
        assigned_moves.sort();
        assert_eq!(assigned_moves, vec!["mov_1", "mov_2", "mov_3", "mov_4"]);
    }
}
