//! Append-only chat and event messages.

use serde::{Deserialize, Serialize};

use crate::{now_ms, PlayerId};

/// What kind of entry this is in the room's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Free-form player chat.
    Message,
    /// Lifecycle notices (joins, departures).
    System,
    /// Game events (turn changes, feedback, victory).
    Game,
}

/// One entry in a room's append-only message stream.
///
/// Messages are never updated after append; they are retained for the
/// room's lifetime and deleted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub player_id: PlayerId,
    pub player_name: String,
    pub message: String,
    pub timestamp: u64,
    pub kind: MessageKind,
}

impl ChatMessage {
    /// A chat message authored by a player.
    pub fn player(id: &str, author: PlayerId, author_name: &str, text: &str) -> Self {
        Self::new(id, author, author_name, text, MessageKind::Message)
    }

    /// A lifecycle notice authored by the reserved system id.
    pub fn system(id: &str, text: &str) -> Self {
        Self::new(id, PlayerId::system(), "System", text, MessageKind::System)
    }

    /// A game event authored by the reserved system id.
    pub fn game(id: &str, text: &str) -> Self {
        Self::new(id, PlayerId::system(), "System", text, MessageKind::Game)
    }

    fn new(
        id: &str,
        player_id: PlayerId,
        player_name: &str,
        message: &str,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: id.to_string(),
            player_id,
            player_name: player_name.to_string(),
            message: message.to_string(),
            timestamp: now_ms(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_messages_use_reserved_author() {
        let msg = ChatMessage::system("m1", "Alice joined the room");
        assert!(msg.player_id.is_system());
        assert_eq!(msg.kind, MessageKind::System);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let msg = ChatMessage::game("m2", "It is Bob's turn");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"game\""));
    }
}
