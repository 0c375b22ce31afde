//! Library surface of the realtime server: the Room Hub, the per-game
//! actor, the Session handler, and the WebSocket route, exposed so
//! `trivia-api` can mount the same route against the same in-process Room
//! Hub rather than running a second, unreachable copy of it. The `realtime`
//! binary in this crate is a thin standalone wrapper around the same pieces,
//! useful for running the WebSocket surface on its own during development.

pub mod actor;
pub mod auth;
pub mod config;
pub mod hub;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use hub::RoomHub;
pub use state::AppState;

use axum::Router;
use axum::routing::get;

/// The `/ws/trivia/{game_id}/` route, ready to be `.merge()`d into a larger
/// router once `.with_state(app_state)` is applied.
pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/trivia/{game_id}/", get(routes::upgrade))
}
