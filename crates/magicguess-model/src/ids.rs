//! Identity newtypes for rooms and players.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The reserved author id for system and game-event chat messages.
const SYSTEM_ID: &str = "system";

/// A unique identifier for a player.
///
/// Player ids are stable across sessions — they are the user's account id,
/// so a player who disconnects and rejoins is recognized as the same
/// embedded [`Player`](crate::Player) rather than duplicated.
///
/// `#[serde(transparent)]` keeps the stored form a bare string, matching
/// the record layout the store persists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// The reserved id used as the author of system and game messages.
    pub fn system() -> Self {
        Self(SYSTEM_ID.to_string())
    }

    /// Returns `true` if this is the reserved system author id.
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_ID
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unique identifier for a room record.
///
/// Room ids are opaque push-key-style strings assigned at creation time;
/// humans join rooms through the 4-digit short code instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_id_is_recognized() {
        assert!(PlayerId::system().is_system());
        assert!(!PlayerId::from("alice").is_system());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = RoomId::from("r-abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"r-abc123\"");
    }
}
