//! Record Store for the trivia server.
//!
//! Transactional Postgres persistence (via `sqlx`) for Game/GamePlayer rows
//! and for the Round/Move/Qualification/Fault/ActionError records the Round
//! Orchestrator owns. `record_store` is the bridge between `trivia-core`'s
//! pure `OrchestratorState`/`PersistOp` types and actual rows.

pub mod error;
pub mod games;
pub mod pool;
pub mod record_store;
pub mod users;

pub use error::DbError;
pub use games::{Game, GamePlayer};
pub use pool::{DbPool, create_pool};
pub use users::User;
