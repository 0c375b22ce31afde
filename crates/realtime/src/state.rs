//! Top-level application state shared across every WebSocket connection.

use trivia_db::DbPool;

use crate::config::Config;
use crate::hub::RoomHub;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub hub: RoomHub,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let hub = RoomHub::new(db.clone());
        Self { db, config, hub }
    }
}
