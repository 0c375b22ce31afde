//! Inbound WebSocket messages: `{"action": "...", ...}` frames sent by a
//! connected client. Shapes are taken verbatim from spec §6.
//!
//! A `ClientAction` carries only what the client actually sends — it has no
//! `actor` field. The Session fills in the authenticated player id (never
//! trusted from the payload) before handing the action to the orchestrator
//! as a `trivia_core::game::OrchestratorAction`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    Start { rounds: u32 },
    Question { text: String },
    Answer { text: String },
    Qualify { userid: String, grade: i32 },
    Assess { correctness: Correctness },
}

/// The wire encodes booleans as the strings `"true"`/`"false"` rather than
/// JSON booleans (ported verbatim from the original client contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    True,
    False,
}

impl Correctness {
    pub fn as_bool(self) -> bool {
        matches!(self, Correctness::True)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_start_action() {
        let msg: ClientAction = serde_json::from_str(r#"{"action":"start","rounds":3}"#).unwrap();
        matches!(msg, ClientAction::Start { rounds: 3 });
    }

    #[test]
    fn decodes_qualify_action() {
        let msg: ClientAction =
            serde_json::from_str(r#"{"action":"qualify","userid":"usr_b","grade":3}"#).unwrap();
        match msg {
            ClientAction::Qualify { userid, grade } => {
                assert_eq!(userid, "usr_b");
                assert_eq!(grade, 3);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn decodes_assess_correctness_as_string() {
        let msg: ClientAction =
            serde_json::from_str(r#"{"action":"assess","correctness":"true"}"#).unwrap();
        match msg {
            ClientAction::Assess { correctness } => assert!(correctness.as_bool()),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn rejects_unknown_action() {
        let result: Result<ClientAction, _> = serde_json::from_str(r#"{"action":"nope"}"#);
        assert!(result.is_err());
    }
}
