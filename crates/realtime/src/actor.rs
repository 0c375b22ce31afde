//! The per-game actor: the only task allowed to mutate one game's
//! `OrchestratorState`. Every `OrchestratorAction` — player-initiated or
//! timer-fired — is serialized through its `mpsc::Receiver`, so the task
//! itself is the lock the teacher would otherwise reach for a `Mutex` to get.
//!
//! Timers are explicit and cancellable: `rearm_timer` aborts whatever phase
//! timer was pending and spawns exactly one new one, sized off the round's
//! *current* phase (derived from timestamps, never assumed). A stale fire —
//! a timeout that lands after the phase has already moved on — is a
//! functional no-op: by the time it's processed the `AbortHandle` that would
//! have killed it was already replaced, but `reduce()` itself checks the
//! round's phase before acting on a timeout, so even a fire that slips in
//! during the handoff window is absorbed harmlessly.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

use trivia_core::game::rules::{ASSESS_TIME_SECS, DELTA_TIME_SECS, QUALIFY_TIME_SECS, START_TIME_SECS};
use trivia_core::game::{self, Delivery, Effect, OrchestratorAction, OrchestratorState, RoundPhase};
use trivia_db::{DbPool, record_store};
use trivia_protocol::ws::OutboundEvent;

use crate::hub::RoomHub;

/// What a `Session` (the actor's own timer tasks, or a CRUD handler reaching
/// in through the `RoomHub`) sends into a game's queue.
pub enum ActorMessage {
    /// A session has finished its handshake and wants to receive broadcasts.
    Join { user_id: String, tx: mpsc::UnboundedSender<OutboundEvent> },
    /// A session disconnected; stop delivering to it.
    Leave { user_id: String },
    /// A command to reduce, optionally with a channel for the immediate
    /// accept/reject result (timers fire with `respond: None`).
    Action { action: OrchestratorAction, respond: Option<oneshot::Sender<Result<(), String>>> },
    /// An event that didn't come out of `reduce()` — the CRUD surface's
    /// `player_joined`/`player_unjoined`/`game_deleted` — broadcast to every
    /// joined session as-is.
    Broadcast(OutboundEvent),
    /// The game row was deleted; stop the actor.
    Shutdown,
}

struct GameActor {
    game_id: String,
    db: DbPool,
    rx: mpsc::Receiver<ActorMessage>,
    state: OrchestratorState,
    sessions: HashMap<String, mpsc::UnboundedSender<OutboundEvent>>,
    /// The one outstanding phase timer, tagged with the round attempt
    /// (`started_at`, which `restart_round` bumps even when it reuses the
    /// same round row) and phase it was armed for, so a just-replaced timer
    /// can't be confused with the live one and a restart's fresh Questioning
    /// phase is never mistaken for the one it replaced.
    timer: Option<(chrono::DateTime<Utc>, RoundPhase, AbortHandle)>,
    self_tx: mpsc::Sender<ActorMessage>,
    /// Cleared the first time a question timer is armed. Lets round 1's
    /// question window alone absorb the warm-up between `start()` succeeding
    /// and the first question actually being due.
    warmup_pending: bool,
}

/// Spawns the actor task for `game_id`, rehydrating its state from the
/// Record Store, and returns the channel to reach it.
pub fn spawn(game_id: String, db: DbPool, _hub: RoomHub) -> mpsc::Sender<ActorMessage> {
    let (tx, rx) = mpsc::channel(256);
    let self_tx = tx.clone();

    tokio::spawn(async move {
        let state = match record_store::load_state(&db, &game_id).await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(game_id = %game_id, error = %err, "failed to load game state for actor");
                return;
            }
        };

        let mut actor = GameActor {
            game_id,
            db,
            rx,
            state,
            sessions: HashMap::new(),
            timer: None,
            self_tx,
            warmup_pending: true,
        };
        actor.run().await;
    });

    tx
}

impl GameActor {
    async fn run(&mut self) {
        tracing::info!(game_id = %self.game_id, "game actor started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                ActorMessage::Join { user_id, tx } => {
                    self.sessions.insert(user_id, tx);
                }
                ActorMessage::Leave { user_id } => {
                    self.sessions.remove(&user_id);
                }
                ActorMessage::Action { action, respond } => {
                    let result = self.apply(action).await;
                    if let Some(respond) = respond {
                        let _ = respond.send(result);
                    }
                }
                ActorMessage::Broadcast(event) => {
                    for tx in self.sessions.values() {
                        let _ = tx.send(event.clone());
                    }
                }
                ActorMessage::Shutdown => break,
            }
        }

        tracing::info!(game_id = %self.game_id, "game actor shut down");
    }

    async fn apply(&mut self, action: OrchestratorAction) -> Result<(), String> {
        let now = Utc::now();
        let action_name = action.name();
        let outcome = game::reduce(&self.state, action, now);
        self.state = outcome.state;

        if !outcome.persist.is_empty() {
            if let Err(err) = record_store::apply(&self.db, &self.game_id, outcome.persist).await {
                tracing::error!(game_id = %self.game_id, action = action_name, error = %err, "failed to persist reducer outcome");
            }
        }

        for effect in &outcome.effects {
            self.dispatch(effect);
        }

        self.rearm_timer();

        match outcome.error {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }

    fn dispatch(&self, effect: &Effect) {
        let event = OutboundEvent::Game(effect.event.clone());
        match &effect.delivery {
            Delivery::Broadcast => {
                for tx in self.sessions.values() {
                    let _ = tx.send(event.clone());
                }
            }
            Delivery::Unicast(user_id) => {
                if let Some(tx) = self.sessions.get(user_id) {
                    let _ = tx.send(event);
                }
            }
        }
    }

    /// Arms the timer the round's current phase calls for, if the phase
    /// actually changed since the last call. A legitimate phase exit cancels
    /// the outgoing phase's timer and arms the incoming one; an action that
    /// leaves the round in the same phase (e.g. a second player answering
    /// while others are still pending) must NOT reset the clock already
    /// running for that phase, and neither must a stale/rejected action that
    /// produced no state change.
    fn rearm_timer(&mut self) {
        let Some(round) = self.state.current_round() else {
            if let Some((_, _, handle)) = self.timer.take() {
                handle.abort();
            }
            return;
        };
        let round_number = round.round_number;
        let attempt = round.started_at;
        let phase = round.phase();

        if let Some((armed_attempt, armed_phase, _)) = &self.timer {
            if *armed_attempt == attempt && *armed_phase == phase {
                return;
            }
        }
        if let Some((_, _, handle)) = self.timer.take() {
            handle.abort();
        }

        let (duration_secs, action): (i64, OrchestratorAction) = match phase {
            RoundPhase::Questioning => {
                let warmup = if self.warmup_pending && round_number == 1 { START_TIME_SECS } else { 0 };
                self.warmup_pending = false;
                (self.state.game.question_time as i64 + DELTA_TIME_SECS + warmup, OrchestratorAction::QuestionTimeout)
            }
            RoundPhase::Answering => {
                (self.state.game.answer_time as i64 + DELTA_TIME_SECS, OrchestratorAction::AnswerTimeout)
            }
            RoundPhase::Qualifying => (QUALIFY_TIME_SECS + DELTA_TIME_SECS, OrchestratorAction::QualifyTimeout),
            RoundPhase::Evaluating => (ASSESS_TIME_SECS + DELTA_TIME_SECS, OrchestratorAction::AssessTimeout),
            RoundPhase::Finished => return,
        };

        let tx = self.self_tx.clone();
        let join_handle = tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_secs(duration_secs.max(0) as u64)).await;
            let _ = tx.send(ActorMessage::Action { action, respond: None }).await;
        });
        self.timer = Some((attempt, phase, join_handle.abort_handle()));
    }
}
