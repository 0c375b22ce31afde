//! A single WebSocket connection: the authenticated bridge between one
//! player and their game's actor.
//!
//! Mirrors the teacher's split-sink/split-stream relay shape (one task reads
//! the socket, one task writes it, bridged by channels) rather than holding
//! the whole connection in a single loop — the write side needs to react to
//! both the actor's broadcasts and the client's own frames independently.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc, oneshot};

use trivia_core::game::OrchestratorAction;
use trivia_protocol::ws::{ClientAction, OutboundEvent};

use crate::actor::ActorMessage;
use crate::rate_limit::session_action_limiter;
use crate::state::AppState;

pub async fn run(socket: WebSocket, state: AppState, game_id: String, user_id: String) {
    let (sender, receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));

    let (event_tx, event_rx) = mpsc::unbounded_channel::<OutboundEvent>();
    let actor_tx = state.hub.handle_for(&game_id).await;

    if actor_tx.send(ActorMessage::Join { user_id: user_id.clone(), tx: event_tx }).await.is_err() {
        tracing::warn!(game_id = %game_id, user_id = %user_id, "game actor unavailable at join");
        return;
    }

    let mut write_task = tokio::spawn(write_loop(sender.clone(), event_rx));
    let mut read_task = tokio::spawn(read_loop(receiver, actor_tx.clone(), game_id.clone(), user_id.clone()));

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    let _ = actor_tx.send(ActorMessage::Leave { user_id: user_id.clone() }).await;
    tracing::info!(game_id = %game_id, user_id = %user_id, "session closed");
}

/// Delivers the actor's broadcasts/unicasts to this client as they arrive.
async fn write_loop(sender: Arc<Mutex<SplitSink<WebSocket, Message>>>, mut event_rx: mpsc::UnboundedReceiver<OutboundEvent>) {
    while let Some(event) = event_rx.recv().await {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize outbound event");
                continue;
            }
        };
        let mut sender = sender.lock().await;
        if sender.send(Message::Text(payload.into())).await.is_err() {
            return;
        }
    }
}

/// Parses inbound client frames and relays them to the actor as
/// `OrchestratorAction`s, with the authenticated `user_id` injected as the
/// actor — never trusted from the payload.
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    actor_tx: mpsc::Sender<ActorMessage>,
    game_id: String,
    user_id: String,
) {
    let limiter = session_action_limiter();

    while let Some(frame) = receiver.next().await {
        let Ok(frame) = frame else { return };
        let Message::Text(text) = frame else { continue };

        if limiter.check().is_err() {
            tracing::warn!(game_id = %game_id, user_id = %user_id, "rate limit exceeded, dropping frame");
            continue;
        }

        let client_action: ClientAction = match serde_json::from_str(&text) {
            Ok(action) => action,
            Err(err) => {
                tracing::debug!(game_id = %game_id, user_id = %user_id, error = %err, "malformed client frame");
                continue;
            }
        };

        let action = to_orchestrator_action(client_action, &user_id);
        let (respond_tx, respond_rx) = oneshot::channel();
        if actor_tx.send(ActorMessage::Action { action, respond: Some(respond_tx) }).await.is_err() {
            return;
        }
        // The reducer already emits an `error` event through the actor's own
        // broadcast path on rejection; we only wait here to keep backpressure
        // from this connection's actions bounded by the actor's own pace.
        let _ = respond_rx.await;
    }
}

fn to_orchestrator_action(action: ClientAction, actor: &str) -> OrchestratorAction {
    match action {
        ClientAction::Start { rounds } => OrchestratorAction::Start { actor: actor.to_string(), rounds },
        ClientAction::Question { text } => OrchestratorAction::Question { actor: actor.to_string(), text },
        ClientAction::Answer { text } => OrchestratorAction::Answer { actor: actor.to_string(), text },
        ClientAction::Qualify { userid, grade } => {
            OrchestratorAction::Qualify { actor: actor.to_string(), target_player: userid, grade }
        }
        ClientAction::Assess { correctness } => {
            OrchestratorAction::Assess { actor: actor.to_string(), is_correct: correctness.as_bool() }
        }
    }
}
