//! Outbound WebSocket messages.
//!
//! The Round Orchestrator's `GameEvent` (in `trivia-core`) already has the
//! exact wire shape spec §6 requires (`{"type": "...", ...}`, snake_case
//! variants) — it is re-exported here rather than duplicated, so `realtime`
//! and `api` (and any future client generator) share one definition. This
//! module adds the handful of outbound events that originate from the CRUD
//! surface rather than the orchestrator (`player_joined`/`player_unjoined`
//! on join/leave, `game_deleted`), using the same envelope shape.

pub use trivia_core::game::GameEvent;

use serde::Serialize;

/// Events broadcast by the CRUD surface (`trivia-api`) rather than the
/// orchestrator. Kept as a separate enum instead of adding non-orchestrator
/// variants to `GameEvent` so `trivia-core` stays free of any notion of a
/// REST layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrudEvent {
    PlayerJoined { user_id: String, username: String },
    PlayerUnjoined { user_id: String, username: String },
    GameDeleted { userid: String },
}

/// What a Session actually pushes down the wire: either an orchestrator
/// event or a CRUD-originated one, sharing the same `{"type": ...}` envelope.
/// `untagged` lets each inner enum's own tag show through unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    Game(GameEvent),
    Crud(CrudEvent),
}

impl From<GameEvent> for OutboundEvent {
    fn from(event: GameEvent) -> Self {
        OutboundEvent::Game(event)
    }
}

impl From<CrudEvent> for OutboundEvent {
    fn from(event: CrudEvent) -> Self {
        OutboundEvent::Crud(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crud_event_serializes_with_type_tag() {
        let event = CrudEvent::GameDeleted { userid: "gam_x".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "game_deleted");
        assert_eq!(json["userid"], "gam_x");
    }

    #[test]
    fn outbound_event_untagged_preserves_inner_shape() {
        let event = OutboundEvent::from(CrudEvent::PlayerJoined { user_id: "usr_a".into(), username: "ada".into() });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "player_joined");
    }
}
