//! Room Hub: the in-process registry of running per-game actors.
//!
//! Each game gets exactly one `tokio` task (`actor::spawn`) that serializes
//! every `OrchestratorAction` against its state — the task itself is the
//! lock, so the hub never needs a `Mutex<OrchestratorState>` of its own. The
//! hub's only job is handing a `Session` the channel to reach that task,
//! spawning the actor on first contact if none is running yet.
//!
//! This replaces the teacher's Socket.IO room abstraction (and its Redis
//! adapter for cross-instance fanout) with a plain `HashMap`: one process
//! owns every game, so there is no cross-instance fanout to do.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::mpsc;

use trivia_db::DbPool;
use trivia_protocol::ws::OutboundEvent;

use crate::actor::{self, ActorMessage};

#[derive(Clone)]
pub struct RoomHub {
    db: DbPool,
    games: Arc<Mutex<HashMap<String, mpsc::Sender<ActorMessage>>>>,
}

impl RoomHub {
    pub fn new(db: DbPool) -> Self {
        Self { db, games: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Returns a live handle to `game_id`'s actor, spawning it if this is the
    /// first session to touch the game since server start.
    pub async fn handle_for(&self, game_id: &str) -> mpsc::Sender<ActorMessage> {
        let mut games = self.games.lock().await;
        if let Some(tx) = games.get(game_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }
        let tx = actor::spawn(game_id.to_string(), self.db.clone(), self.clone());
        games.insert(game_id.to_string(), tx.clone());
        tx
    }

    /// Pushes a CRUD-originated event (`player_joined`, `player_unjoined`,
    /// `game_deleted`) to whoever is currently joined to `game_id`. A no-op
    /// if nobody has connected to the game yet — there is nothing lost, since
    /// a session that joins afterward hydrates from the REST response itself.
    pub async fn broadcast(&self, game_id: &str, event: OutboundEvent) {
        let tx = self.handle_for(game_id).await;
        let _ = tx.send(ActorMessage::Broadcast(event)).await;
    }

    /// Stops the actor for a deleted game and forgets it, so a later request
    /// for the same id (which should now 404 at the REST layer) can't resume
    /// a stale session.
    pub async fn shutdown(&self, game_id: &str) {
        let mut games = self.games.lock().await;
        if let Some(tx) = games.remove(game_id) {
            let _ = tx.send(ActorMessage::Shutdown).await;
        }
    }
}
