//! Prefixed nanoid generation for entity identifiers.
//!
//! All entities use prefixed nanoid identifiers instead of UUIDs:
//! - Human-readable prefixes identify entity type at a glance
//! - URL-safe characters (no encoding needed)
//! - ~71 bits entropy per entity

use once_cell::sync::Lazy;
use rand::Rng;
use rand::rngs::OsRng;
use std::sync::Mutex;

/// Thread-safe RNG for ID generation.
static RNG: Lazy<Mutex<OsRng>> = Lazy::new(|| Mutex::new(OsRng));

/// Alphabet for nanoid generation (URL-safe).
const ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '_', 'a',
    'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't',
    'u', 'v', 'w', 'x', 'y', 'z',
];

/// Entity ID length (excluding prefix). Provides ~71 bits entropy.
const ENTITY_ID_LEN: usize = 12;

/// Generate a random string of the specified length using the nanoid alphabet.
fn generate_id(len: usize) -> String {
    let mut rng = RNG.lock().expect("RNG lock poisoned");
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx]
        })
        .collect()
}

/// Entity prefixes for the trivia domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPrefix {
    User,
    Game,
    Round,
    Move,
    Qualification,
    Fault,
    ActionError,
}

impl EntityPrefix {
    /// Returns the string prefix for this entity type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "usr_",
            EntityPrefix::Game => "gam_",
            EntityPrefix::Round => "rnd_",
            EntityPrefix::Move => "mov_",
            EntityPrefix::Qualification => "qua_",
            EntityPrefix::Fault => "flt_",
            EntityPrefix::ActionError => "err_",
        }
    }
}

/// Generate a prefixed ID for a user entity. Format: `usr_XXXXXXXXXXXX`.
pub fn generate_user_id() -> String {
    format!("{}{}", EntityPrefix::User.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a game entity. Format: `gam_XXXXXXXXXXXX`.
pub fn generate_game_id() -> String {
    format!("{}{}", EntityPrefix::Game.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a round entity. Format: `rnd_XXXXXXXXXXXX`.
pub fn generate_round_id() -> String {
    format!("{}{}", EntityPrefix::Round.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a move (answer) entity. Format: `mov_XXXXXXXXXXXX`.
pub fn generate_move_id() -> String {
    format!("{}{}", EntityPrefix::Move.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a qualification entity. Format: `qua_XXXXXXXXXXXX`.
pub fn generate_qualification_id() -> String {
    format!("{}{}", EntityPrefix::Qualification.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a fault entity. Format: `flt_XXXXXXXXXXXX`.
pub fn generate_fault_id() -> String {
    format!("{}{}", EntityPrefix::Fault.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for an action-error audit entity. Format: `err_XXXXXXXXXXXX`.
pub fn generate_action_error_id() -> String {
    format!("{}{}", EntityPrefix::ActionError.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Parse the prefix from an ID string.
/// Returns `None` if the ID doesn't have a recognized prefix.
pub fn parse_prefix(id: &str) -> Option<EntityPrefix> {
    if id.starts_with("usr_") {
        Some(EntityPrefix::User)
    } else if id.starts_with("gam_") {
        Some(EntityPrefix::Game)
    } else if id.starts_with("rnd_") {
        Some(EntityPrefix::Round)
    } else if id.starts_with("mov_") {
        Some(EntityPrefix::Move)
    } else if id.starts_with("qua_") {
        Some(EntityPrefix::Qualification)
    } else if id.starts_with("flt_") {
        Some(EntityPrefix::Fault)
    } else if id.starts_with("err_") {
        Some(EntityPrefix::ActionError)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_format() {
        let id = generate_user_id();
        assert!(id.starts_with("usr_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_game_id_format() {
        let id = generate_game_id();
        assert!(id.starts_with("gam_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_round_id_format() {
        let id = generate_round_id();
        assert!(id.starts_with("rnd_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_move_id_format() {
        let id = generate_move_id();
        assert!(id.starts_with("mov_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_qualification_id_format() {
        let id = generate_qualification_id();
        assert!(id.starts_with("qua_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_fault_id_format() {
        let id = generate_fault_id();
        assert!(id.starts_with("flt_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: Vec<String> = (0..100).map(|_| generate_game_id()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("usr_abcdefghijkl"), Some(EntityPrefix::User));
        assert_eq!(parse_prefix("gam_abcdefghijkl"), Some(EntityPrefix::Game));
        assert_eq!(parse_prefix("rnd_abcdefghijkl"), Some(EntityPrefix::Round));
        assert_eq!(parse_prefix("mov_abcdefghijkl"), Some(EntityPrefix::Move));
        assert_eq!(parse_prefix("qua_abcdefghijkl"), Some(EntityPrefix::Qualification));
        assert_eq!(parse_prefix("flt_abcdefghijkl"), Some(EntityPrefix::Fault));
        assert_eq!(parse_prefix("err_abcdefghijkl"), Some(EntityPrefix::ActionError));
        assert_eq!(parse_prefix("unknown_id"), None);
    }
}
