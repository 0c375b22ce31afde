//! Nosy selection: who poses the question for the next round.
//!
//! Ported from `Game.next_nosy` in the original implementation. First pass
//! picks at random among active players who have never served as nosy.
//! Once everyone has had a turn, it falls back to the lowest scorer,
//! breaking ties by player id, skipping exactly one candidate if the lowest
//! scorer is the immediately preceding round's nosy (so the same player
//! never serves twice in a row purely by virtue of tying for last place).

use rand::Rng;

use super::state::{OrchestratorState, PlayerRecord};

/// Picks the next nosy from `state`'s active players. `previous_nosy` is the
/// immediately preceding round's nosy id, or `None` for the first round.
///
/// Returns `None` only if there are no active players at all, which callers
/// should treat as an invariant violation (the game-cancellation threshold
/// is checked before this is called).
pub fn next_nosy(state: &OrchestratorState, previous_nosy: Option<&str>) -> Option<String> {
    let active = state.active_players();
    if active.is_empty() {
        return None;
    }

    let never_served: Vec<&PlayerRecord> =
        active.iter().filter(|p| state.rounds_as_nosy(&p.user_id).is_empty()).copied().collect();

    if !never_served.is_empty() {
        let idx = rand::thread_rng().gen_range(0..never_served.len());
        return Some(never_served[idx].user_id.clone());
    }

    let mut by_score: Vec<&PlayerRecord> = active;
    by_score.sort_by(|a, b| {
        let score_a = super::scoring::player_score(state, &a.user_id);
        let score_b = super::scoring::player_score(state, &b.user_id);
        score_a.cmp(&score_b).then_with(|| a.user_id.cmp(&b.user_id))
    });

    let lowest = by_score[0];
    if by_score.len() > 1 && Some(lowest.user_id.as_str()) == previous_nosy {
        Some(by_score[1].user_id.clone())
    } else {
        Some(lowest.user_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{GameInfo, RoundInfo};
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn test_state() -> OrchestratorState {
        let game = GameInfo {
            game_id: "gam_test".into(),
            name: "Test Game".into(),
            host_id: "usr_a".into(),
            question_time: 90,
            answer_time: 90,
            rounds_number: Some(4),
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
    fn first_round_picks_among_unserved_players() {
        let state = test_state();
        let picked = next_nosy(&state, None).unwrap();
        assert!(["usr_a", "usr_b", "usr_c"].contains(&picked.as_str()));
    }

    #[test]
    fn once_everyone_served_falls_back_to_lowest_score_ties_by_id() {
        let mut state = test_state();
        // All three have served as nosy in some prior round; no scores recorded
        // (0-0-0 ties), so the fallback sorts purely by player id.
        state.rounds.push(RoundInfo::new("rnd_1", "gam_test", 1, "usr_a", now()));
        state.rounds.push(RoundInfo::new("rnd_2", "gam_test", 2, "usr_b", now()));
        state.rounds.push(RoundInfo::new("rnd_3", "gam_test", 3, "usr_c", now()));

        let picked = next_nosy(&state, Some("usr_c")).unwrap();
        assert_eq!(picked, "usr_a");
    }

    #[test]
    fn skips_exactly_one_candidate_when_lowest_scorer_was_previous_nosy() {
        let mut state = test_state();
        state.rounds.push(RoundInfo::new("rnd_1", "gam_test", 1, "usr_a", now()));
        state.rounds.push(RoundInfo::new("rnd_2", "gam_test", 2, "usr_b", now()));
        state.rounds.push(RoundInfo::new("rnd_3", "gam_test", 3, "usr_c", now()));

        // usr_a ties for lowest (0) but was the previous nosy, so usr_b (next
        // lowest by id) is picked instead.
        let picked = next_nosy(&state, Some("usr_a")).unwrap();
        assert_eq!(picked, "usr_b");
    }

    #[test]
    fn empty_player_list_returns_none() {
        let game = GameInfo {
            game_id: "gam_empty".into(),
            name: "Empty".into(),
            host_id: "usr_a".into(),
            question_time: 90,
            answer_time: 90,
            rounds_number: None,
            created_at: now(),
            started_at: None,
            ended_at: None,
            canceled: false,
        };
        let mut state = OrchestratorState::new(game, PlayerRecord::new("usr_a", "A", true, now()));
        state.get_player_mut("usr_a").unwrap().disqualified = true;
        assert_eq!(next_nosy(&state, None), None);
    }
}
