//! Application state shared across the CRUD surface.

use anyhow::Result;
use trivia_db::DbPool;
use trivia_realtime::RoomHub;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    /// The same Room Hub the realtime WebSocket route mounted alongside this
    /// router reaches into — so `join_game`/`unjoin_game`/`delete` can push
    /// `player_joined`/`player_unjoined`/`game_deleted` to anyone already
    /// connected, exactly as the original's REST views call into the channel
    /// layer.
    pub hub: RoomHub,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self> {
        let db = trivia_db::create_pool(&config.database_url).await?;

        sqlx::migrate!("../db/migrations").run(&db).await?;
        tracing::info!("database migrations completed");

        let hub = RoomHub::new(db.clone());
        Ok(Self { db, config: config.clone(), hub })
    }
}
