//! WebSocket wire protocol: inbound client actions and outbound server
//! events for `/ws/trivia/<game_id>/`.

pub mod inbound;
pub mod outbound;

pub use inbound::{ClientAction, Correctness};
pub use outbound::{CrudEvent, GameEvent, OutboundEvent};
