//! The Round Orchestrator: a pure function from `(state, action, now)` to a
//! new state plus the side effects that state transition implies.
//!
//! `reduce()` never touches the clock, the network, or the Record Store
//! itself. It hands back a `ReducerOutcome` carrying the events to deliver
//! and the persistence operations the caller (the per-game actor, holding
//! the only mutable handle to this game's state) must apply. Timer arming
//! and cancellation is likewise left to the caller: this function only
//! reports which phase the round is now in, never reaches for a clock.

use chrono::{DateTime, Utc};

use crate::id;

use super::commands::OrchestratorAction;
use super::events::{Delivery, Effect, GameEvent, RoundResultEntry, ScoreEntry};
use super::nosy::next_nosy;
use super::qualification::create_qualifications;
use super::rules::MIN_ACTIVE_PLAYERS;
use super::scoring::{game_scores, nosy_score};
use super::state::{
    ActionErrorRecord, FaultCategory, FaultRecord, MoveRecord, OrchestratorState, QualificationRecord, RoundInfo,
    RoundPhase,
};

/// A single mutation the Record Store must apply to persist this tick's
/// outcome. The orchestrator never writes to the database directly; it only
/// describes what changed.
#[derive(Debug, Clone)]
pub enum PersistOp {
    UpsertGame(super::state::GameInfo),
    UpsertPlayer(super::state::PlayerRecord),
    UpsertRound(RoundInfo),
    UpsertMove(MoveRecord),
    UpsertQualification(QualificationRecord),
    InsertFault(FaultRecord),
    InsertActionError(ActionErrorRecord),
}

/// The result of applying one `OrchestratorAction` to an `OrchestratorState`.
#[derive(Debug, Clone)]
pub struct ReducerOutcome {
    pub state: OrchestratorState,
    pub effects: Vec<Effect>,
    pub persist: Vec<PersistOp>,
    /// The rejection message, if this action was invalid. Mirrors the
    /// `error{message}` event already present in `effects` for convenient
    /// inspection by callers that log rejections separately from delivery.
    pub error: Option<String>,
    pub changed: bool,
}

impl ReducerOutcome {
    fn unchanged(state: OrchestratorState) -> Self {
        Self { state, effects: Vec::new(), persist: Vec::new(), error: None, changed: false }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Applies one action to `state`, returning the new state and its effects.
/// Stale timeouts (the phase has already moved on by the time the timer
/// fires) are silently absorbed as no-ops rather than rejected: the first
/// lock acquirer — an action or an earlier timer — always wins.
pub fn reduce(state: &OrchestratorState, action: OrchestratorAction, now: DateTime<Utc>) -> ReducerOutcome {
    match action {
        OrchestratorAction::Start { actor, rounds } => handle_start(state, &actor, rounds, now),
        OrchestratorAction::Question { actor, text } => handle_question(state, &actor, text, now),
        OrchestratorAction::Answer { actor, text } => handle_answer(state, &actor, text, now),
        OrchestratorAction::Qualify { actor, target_player, grade } => {
            handle_qualify(state, &actor, &target_player, grade, now)
        }
        OrchestratorAction::Assess { actor, is_correct } => handle_assess(state, &actor, is_correct, now),
        OrchestratorAction::QuestionTimeout => handle_question_timeout(state, now),
        OrchestratorAction::AnswerTimeout => handle_answer_timeout(state, now),
        OrchestratorAction::QualifyTimeout => handle_qualify_timeout(state, now),
        OrchestratorAction::AssessTimeout => handle_assess_timeout(state, now),
    }
}

fn reject(state: &OrchestratorState, action_name: &str, actor: Option<&str>, message: &str, now: DateTime<Utc>) -> ReducerOutcome {
    let record = ActionErrorRecord {
        error_id: id::generate_action_error_id(),
        game_id: state.game.game_id.clone(),
        actor: actor.map(String::from),
        action: action_name.to_string(),
        message: message.to_string(),
        created_at: now,
    };
    let delivery_effect = match actor {
        Some(user_id) => Effect::unicast(user_id, GameEvent::error(message)),
        None => Effect::broadcast(GameEvent::error(message)),
    };
    ReducerOutcome {
        state: state.clone(),
        effects: vec![delivery_effect],
        persist: vec![PersistOp::InsertActionError(record)],
        error: Some(message.to_string()),
        changed: false,
    }
}

fn apply_fault(
    state: &mut OrchestratorState,
    effects: &mut Vec<Effect>,
    persist: &mut Vec<PersistOp>,
    player_id: &str,
    round_id: Option<String>,
    category: FaultCategory,
    now: DateTime<Utc>,
) {
    let fault =
        FaultRecord { fault_id: id::generate_fault_id(), player_id: player_id.to_string(), round_id, category, created_at: now };
    effects.push(Effect::broadcast(GameEvent::fault(player_id, category)));
    persist.push(PersistOp::InsertFault(fault.clone()));
    state.faults.push(fault);

    if state.is_disqualified(player_id) {
        if let Some(player) = state.get_player_mut(player_id) {
            if !player.disqualified {
                player.disqualified = true;
                let updated = player.clone();
                effects.push(Effect::broadcast(GameEvent::UserDisqualified { player_id: player_id.to_string() }));
                persist.push(PersistOp::UpsertPlayer(updated));
            }
        }
    }
}

/// Cancels the game outright if too few active players remain. Returns
/// whether the game was (or already was) canceled.
fn maybe_cancel_game(state: &mut OrchestratorState, effects: &mut Vec<Effect>, persist: &mut Vec<PersistOp>, now: DateTime<Utc>) -> bool {
    if state.game.has_ended() {
        return state.game.canceled;
    }
    if state.active_player_count() < MIN_ACTIVE_PLAYERS {
        state.game.canceled = true;
        state.game.ended_at = Some(now);
        effects.push(Effect::broadcast(GameEvent::GameCanceled {
            message: "La partida fue cancelada por no contar con suficientes jugadores activos".to_string(),
            game_scores: game_scores(state),
        }));
        persist.push(PersistOp::UpsertGame(state.game.clone()));
        true
    } else {
        false
    }
}

fn start_round(
    state: &mut OrchestratorState,
    effects: &mut Vec<Effect>,
    persist: &mut Vec<PersistOp>,
    previous_nosy: Option<&str>,
    now: DateTime<Utc>,
) {
    let round_number = state.rounds.len() as u32 + 1;
    let nosy_id = next_nosy(state, previous_nosy).expect("active player count was checked before starting a round");
    let round = RoundInfo::new(id::generate_round_id(), state.game.game_id.clone(), round_number, nosy_id.clone(), now);
    persist.push(PersistOp::UpsertRound(round.clone()));
    effects.push(Effect::broadcast(GameEvent::RoundStarted { round_number, nosy_id }));
    state.rounds.push(round);
}

/// Reassigns the current round to a new nosy in place, rather than deleting
/// and recreating the row: the round keeps its id and round_number, only its
/// nosy, start time, and question are reset.
fn restart_round(state: &mut OrchestratorState, effects: &mut Vec<Effect>, persist: &mut Vec<PersistOp>, now: DateTime<Utc>) {
    let previous_nosy = state.current_round().map(|r| r.nosy_id.clone());
    let round_number = state.current_round().expect("restart_round called with no round in flight").round_number;
    let new_nosy = next_nosy(state, previous_nosy.as_deref()).expect("active player count was checked before restarting a round");

    if let Some(round) = state.current_round_mut() {
        round.nosy_id = new_nosy.clone();
        round.question = None;
        round.started_at = now;
    }
    let round_clone = state.current_round().expect("round still in flight after reassignment").clone();
    persist.push(PersistOp::UpsertRound(round_clone));
    effects.push(Effect::broadcast(GameEvent::RoundStarted { round_number, nosy_id: new_nosy }));
}

/// Builds the qualification assignments for `round_id` and unicasts each
/// reviewer their reviewing material, then closes the qualifying phase.
fn advance_to_evaluating(state: &mut OrchestratorState, round_id: &str, effects: &mut Vec<Effect>, persist: &mut Vec<PersistOp>, now: DateTime<Utc>) {
    let nosy_id = state.round(round_id).expect("round exists").nosy_id.clone();
    let correct_answer = state
        .moves_for_round(round_id)
        .iter()
        .find(|m| m.player_id == nosy_id)
        .map(|m| m.text.clone())
        .unwrap_or_default();

    // The nosy never submits a Move to be reviewed — only non-nosy moves
    // enter the derangement (spec §4.2 / invariant 4).
    let mut moves: Vec<MoveRecord> =
        state.moves_for_round(round_id).into_iter().filter(|m| m.player_id != nosy_id).cloned().collect();
    moves.sort_by_key(|m| m.submitted_at);
    // players[i] is, by construction, the author of moves[i] — the
    // derangement only needs this correspondence, not any particular
    // canonical player ordering.
    let players: Vec<String> = moves.iter().map(|m| m.player_id.clone()).collect();

    for assignment in create_qualifications(&moves, &players) {
        let qualification = QualificationRecord {
            qualification_id: id::generate_qualification_id(),
            round_id: round_id.to_string(),
            reviewer_id: assignment.reviewer_id.clone(),
            move_id: assignment.move_id.clone(),
            assessed_correct: None,
            assessed_at: None,
        };
        persist.push(PersistOp::UpsertQualification(qualification.clone()));

        let graded_move = moves.iter().find(|m| m.move_id == assignment.move_id).expect("assignment references an existing move");
        effects.push(Effect::unicast(
            assignment.reviewer_id.clone(),
            GameEvent::RoundReviewAnswer {
                correct_answer: correct_answer.clone(),
                graded_answer: graded_move.text.clone(),
                grade: graded_move.grade.unwrap_or(0),
            },
        ));
        state.qualifications.push(qualification);
    }

    if let Some(round) = state.current_round_mut() {
        round.qualify_ended_at = Some(now);
    }
    let round_clone = state.round(round_id).expect("round exists").clone();
    persist.push(PersistOp::UpsertRound(round_clone));
}

/// Closes out the current round: broadcasts its results, then either starts
/// the next round or ends the game if this was the last one.
fn finish_round(state: &mut OrchestratorState, effects: &mut Vec<Effect>, persist: &mut Vec<PersistOp>, now: DateTime<Utc>) {
    let (round_id, round_number, nosy_id) = {
        let round = state.current_round_mut().expect("finish_round called with no round in flight");
        round.ended_at = Some(now);
        (round.round_id.clone(), round.round_number, round.nosy_id.clone())
    };
    let round_clone = state.round(&round_id).expect("round exists").clone();
    persist.push(PersistOp::UpsertRound(round_clone));

    // The nosy's own Move (the correct answer) is never graded and is
    // accounted for separately below via its `nosy_score`, not as a
    // per-player evaluation total.
    let mut round_results: Vec<RoundResultEntry> = state
        .moves_for_round(&round_id)
        .iter()
        .filter(|mv| mv.player_id != nosy_id)
        .map(|mv| RoundResultEntry { user_id: mv.player_id.clone(), round_score: mv.grade.unwrap_or(0) })
        .collect();
    let qualifications = state.qualifications_for_round(&round_id);
    let total = qualifications.len();
    let incorrect = qualifications.iter().filter(|q| q.assessed_correct == Some(false)).count();
    round_results.push(RoundResultEntry { user_id: nosy_id.clone(), round_score: nosy_score(total, incorrect) });

    effects.push(Effect::broadcast(GameEvent::RoundResult { round_results, game_scores: game_scores(state) }));

    if maybe_cancel_game(state, effects, persist, now) {
        return;
    }

    let is_last_round = state.game.rounds_number.map(|total_rounds| round_number >= total_rounds).unwrap_or(false);
    if is_last_round {
        state.game.ended_at = Some(now);
        persist.push(PersistOp::UpsertGame(state.game.clone()));
        effects.push(Effect::broadcast(GameEvent::GameResult { game_scores: game_scores(state) }));
    } else {
        start_round(state, effects, persist, Some(&nosy_id), now);
    }
}

fn handle_start(state: &OrchestratorState, actor: &str, rounds: u32, now: DateTime<Utc>) -> ReducerOutcome {
    if actor != state.game.host_id {
        return reject(state, "start", Some(actor), "La partida solo la puede iniciar quien la creó", now);
    }
    if state.game.has_started() {
        return reject(state, "start", Some(actor), "La partida ya había sido iniciada", now);
    }
    if state.active_player_count() < 2 {
        return reject(state, "start", Some(actor), "Para iniciar la partida debe tener al menos 2 jugadores inscritos", now);
    }
    if (rounds as usize) < state.active_player_count() {
        return reject(state, "start", Some(actor), "El número de rondas debe ser mayor o igual al número de jugadores", now);
    }

    let mut state = state.clone();
    let mut effects = Vec::new();
    let mut persist = Vec::new();

    state.game.started_at = Some(now);
    state.game.rounds_number = Some(rounds);
    persist.push(PersistOp::UpsertGame(state.game.clone()));

    let player_ids: Vec<String> = state.players.iter().map(|p| p.user_id.clone()).collect();
    effects.push(Effect::broadcast(GameEvent::GameStarted { rounds, players: player_ids }));

    start_round(&mut state, &mut effects, &mut persist, None, now);

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_question(state: &OrchestratorState, actor: &str, text: String, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) => round.round_id.clone(),
        None => return reject(state, "question", Some(actor), "El juego aun no comienza", now),
    };
    let (nosy_id, already_submitted) = {
        let round = state.round(&round_id).expect("round exists");
        (round.nosy_id.clone(), round.question_arrived_at.is_some())
    };
    if actor != nosy_id {
        return reject(state, "question", Some(actor), "Solo el pregunton puede enviar la pregunta de la ronda", now);
    }
    if already_submitted {
        return reject(state, "question", Some(actor), "Ya se entregó la pregunta de esta ronda", now);
    }

    let mut state = state.clone();
    let mut effects = Vec::new();
    let mut persist = Vec::new();

    if let Some(round) = state.current_round_mut() {
        round.question = Some(text.clone());
        round.question_arrived_at = Some(now);
    }
    persist.push(PersistOp::UpsertRound(state.round(&round_id).expect("round exists").clone()));
    effects.push(Effect::broadcast(GameEvent::RoundQuestion { question: text }));

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_answer(state: &OrchestratorState, actor: &str, text: String, now: DateTime<Utc>) -> ReducerOutcome {
    if !state.game.has_started() {
        return reject(state, "answer", Some(actor), "El juego aun no comienza", now);
    }
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Questioning => {
            return reject(state, "answer", Some(actor), "Aun no está la pregunta de la ronda", now);
        }
        Some(round) if round.phase() == RoundPhase::Answering => round.round_id.clone(),
        Some(_) => return reject(state, "answer", Some(actor), "Ya no se aceptan respuestas en esta ronda", now),
        None => return reject(state, "answer", Some(actor), "El juego aun no comienza", now),
    };
    if state.moves.iter().any(|m| m.round_id == round_id && m.player_id == actor) {
        return reject(state, "answer", Some(actor), "No se puede cambiar la respuesta previamente enviada", now);
    }

    let mut state = state.clone();
    let mut effects = Vec::new();
    let mut persist = Vec::new();

    let nosy_id = state.round(&round_id).expect("round exists").nosy_id.clone();
    let mv = MoveRecord {
        move_id: id::generate_move_id(),
        round_id: round_id.clone(),
        player_id: actor.to_string(),
        text: text.clone(),
        submitted_at: now,
        grade: None,
        auto_graded: false,
    };
    persist.push(PersistOp::UpsertMove(mv.clone()));
    if actor != nosy_id {
        effects.push(Effect::unicast(nosy_id, GameEvent::RoundAnswer { answer: text, userid: actor.to_string() }));
    }
    state.moves.push(mv);

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_qualify(state: &OrchestratorState, actor: &str, target_player: &str, grade: i32, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Qualifying => round.round_id.clone(),
        _ => return reject(state, "qualify", Some(actor), "Ya no se aceptan calificaciones", now),
    };
    let nosy_id = state.round(&round_id).expect("round exists").nosy_id.clone();
    if actor != nosy_id {
        return reject(state, "qualify", Some(actor), "Solo el pregunton puede calificar las respuestas", now);
    }
    if !state.moves.iter().any(|m| m.round_id == round_id && m.player_id == target_player) {
        return reject(state, "qualify", Some(actor), "Este usuario no ha enviado una respuesta para ser evaluada", now);
    }

    let mut state = state.clone();
    let mut effects = Vec::new();
    let mut persist = Vec::new();

    if let Some(mv) = state.moves.iter_mut().find(|m| m.round_id == round_id && m.player_id == target_player) {
        mv.grade = Some(grade);
        mv.auto_graded = false;
    }
    let updated_move = state.moves.iter().find(|m| m.round_id == round_id && m.player_id == target_player).expect("just updated").clone();
    persist.push(PersistOp::UpsertMove(updated_move));

    // The nosy's own Move (the correct answer) is never graded, so it must
    // not hold the qualify phase open waiting for an evaluation that never
    // comes.
    let all_graded = state.moves_for_round(&round_id).iter().filter(|m| m.player_id != nosy_id).all(|m| m.grade.is_some());
    if all_graded {
        advance_to_evaluating(&mut state, &round_id, &mut effects, &mut persist, now);
    }

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_assess(state: &OrchestratorState, actor: &str, is_correct: bool, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Evaluating => round.round_id.clone(),
        Some(_) => return reject(state, "assess", Some(actor), "Ya no se aceptan evaluaciones en esta ronda", now),
        None => return reject(state, "assess", Some(actor), "El juego aun no comienza", now),
    };
    let qualification_idx = state
        .qualifications
        .iter()
        .position(|q| q.round_id == round_id && q.reviewer_id == actor && q.assessed_correct.is_none());
    let idx = match qualification_idx {
        Some(idx) => idx,
        None => return reject(state, "assess", Some(actor), "No hay una evaluación activa para este usuario", now),
    };

    let mut state = state.clone();
    let mut persist = Vec::new();

    state.qualifications[idx].assessed_correct = Some(is_correct);
    state.qualifications[idx].assessed_at = Some(now);
    persist.push(PersistOp::UpsertQualification(state.qualifications[idx].clone()));

    // The assess timer always runs to completion, even if every reviewer has
    // already responded — unlike the qualify phase, there is no early
    // advance here.
    ReducerOutcome { state, effects: Vec::new(), persist, error: None, changed: true }
}

fn handle_question_timeout(state: &OrchestratorState, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Questioning => round.round_id.clone(),
        _ => return ReducerOutcome::unchanged(state.clone()),
    };

    let mut state = state.clone();
    let mut effects = vec![Effect::broadcast(GameEvent::QuestionTimeEnded)];
    let mut persist = Vec::new();

    let nosy_id = state.round(&round_id).expect("round exists").nosy_id.clone();
    apply_fault(&mut state, &mut effects, &mut persist, &nosy_id, Some(round_id), FaultCategory::QuestionTimeout, now);

    if !maybe_cancel_game(&mut state, &mut effects, &mut persist, now) {
        restart_round(&mut state, &mut effects, &mut persist, now);
    }

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_answer_timeout(state: &OrchestratorState, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Answering => round.round_id.clone(),
        _ => return ReducerOutcome::unchanged(state.clone()),
    };

    let mut state = state.clone();
    let mut effects = vec![Effect::broadcast(GameEvent::AnswerTimeEnded)];
    let mut persist = Vec::new();

    // Missing players — including the nosy, if they never submitted the
    // correct answer — get only an `AT` fault and score nothing for the
    // round; no Move is fabricated on their behalf.
    let missing: Vec<String> = state
        .active_players()
        .iter()
        .map(|p| p.user_id.clone())
        .filter(|id| !state.moves.iter().any(|m| m.round_id == round_id && &m.player_id == id))
        .collect();

    for player_id in missing {
        apply_fault(&mut state, &mut effects, &mut persist, &player_id, Some(round_id.clone()), FaultCategory::AnswerTimeout, now);
    }

    if let Some(round) = state.current_round_mut() {
        round.answer_ended_at = Some(now);
    }
    persist.push(PersistOp::UpsertRound(state.round(&round_id).expect("round exists").clone()));

    maybe_cancel_game(&mut state, &mut effects, &mut persist, now);

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_qualify_timeout(state: &OrchestratorState, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Qualifying => round.round_id.clone(),
        _ => return ReducerOutcome::unchanged(state.clone()),
    };

    let mut state = state.clone();
    let mut effects = vec![Effect::broadcast(GameEvent::QualifyTimeout)];
    let mut persist = Vec::new();

    let nosy_id = state.round(&round_id).expect("round exists").nosy_id.clone();

    // Only genuine non-nosy submissions are auto-graded; the nosy's own Move
    // (the correct answer) is never a gradable answer and must not pick up a
    // spurious evaluation.
    for mv in state.moves.iter_mut().filter(|m| m.round_id == round_id && m.grade.is_none() && m.player_id != nosy_id) {
        mv.grade = Some(2);
        mv.auto_graded = true;
    }
    for mv in state.moves_for_round(&round_id) {
        if mv.auto_graded {
            persist.push(PersistOp::UpsertMove(mv.clone()));
        }
    }

    apply_fault(&mut state, &mut effects, &mut persist, &nosy_id, Some(round_id.clone()), FaultCategory::EvaluationTimeout, now);

    if !maybe_cancel_game(&mut state, &mut effects, &mut persist, now) {
        advance_to_evaluating(&mut state, &round_id, &mut effects, &mut persist, now);
    }

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}

fn handle_assess_timeout(state: &OrchestratorState, now: DateTime<Utc>) -> ReducerOutcome {
    let round_id = match state.current_round() {
        Some(round) if round.phase() == RoundPhase::Evaluating => round.round_id.clone(),
        _ => return ReducerOutcome::unchanged(state.clone()),
    };

    let mut state = state.clone();
    let mut effects = vec![Effect::broadcast(GameEvent::AssessTimeout)];
    let mut persist = Vec::new();

    let unassessed_reviewers: Vec<String> = state
        .qualifications_for_round(&round_id)
        .iter()
        .filter(|q| q.assessed_correct.is_none())
        .map(|q| q.reviewer_id.clone())
        .collect();
    for reviewer_id in unassessed_reviewers {
        apply_fault(&mut state, &mut effects, &mut persist, &reviewer_id, Some(round_id.clone()), FaultCategory::AssessTimeout, now);
    }

    if !maybe_cancel_game(&mut state, &mut effects, &mut persist, now) {
        finish_round(&mut state, &mut effects, &mut persist, now);
    }

    ReducerOutcome { state, effects, persist, error: None, changed: true }
}
