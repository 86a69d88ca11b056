//! The room record and its embedded structures.
//!
//! A [`Room`] is the single source of truth for one match: every client
//! reads it from the store, applies protocol rules, and writes it back.
//! [`Player`] and [`GameData`] have no identity or lifecycle outside the
//! room that embeds them.

use serde::{Deserialize, Serialize};

use crate::{Difficulty, PlayerId, RoomId};

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly forward — no path returns to `Waiting`:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: room exists and accepts joins; players ready up.
/// - **Playing**: a round is running; `game_data` is present.
/// - **Finished**: terminal. A new game requires a fresh room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if transitioning to `target` is valid.
    ///
    /// Enforces the strict forward ordering of the state machine.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing) | (Self::Playing, Self::Finished)
        )
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player embedded in a room record, keyed by their stable account id.
///
/// Created on join. While a game is in progress a departing player is
/// only marked `is_connected = false`; actual removal happens when
/// leaving a `Waiting` room or when the room is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub level: u32,
    pub is_ready: bool,
    pub is_host: bool,
    pub is_connected: bool,
    /// Cumulative score across the room's lifetime.
    pub score: u32,
    /// Guesses made this round.
    pub attempts: u32,
    /// Gates further guesses within the current turn.
    pub has_guessed: bool,
    pub last_guess: Option<u32>,
    /// Milliseconds into the turn when the last guess was made.
    pub guess_time: u64,
}

impl Player {
    /// Creates a fresh player entry for a room join.
    pub fn new(id: PlayerId, name: &str, avatar: &str, level: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            avatar: avatar.to_string(),
            level,
            is_ready: false,
            is_host: false,
            is_connected: true,
            score: 0,
            attempts: 0,
            has_guessed: false,
            last_guess: None,
            guess_time: 0,
        }
    }

    /// Zeroes the per-round transient fields when a game starts.
    pub fn reset_for_round(&mut self) {
        self.score = 0;
        self.attempts = 0;
        self.has_guessed = false;
        self.last_guess = None;
        self.guess_time = 0;
    }
}

// ---------------------------------------------------------------------------
// GameData
// ---------------------------------------------------------------------------

/// Authoritative round state, present only while `status == Playing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    /// Drawn once at game start, fixed for the round.
    pub target_number: u32,
    /// Epoch ms when the game started.
    pub start_time: u64,
    /// Whose turn it currently is. Always a connected player while the
    /// room is `Playing` — enforced by the turn coordinator on every
    /// disconnect and advance.
    pub active_player_id: PlayerId,
    /// Epoch ms when the current turn began. Strictly increases on each
    /// advance, which orders turn transitions across clients.
    pub turn_start_time: u64,
    /// Fixed turn duration in ms.
    pub turn_time_limit: u64,
    /// Retained at 1/1 for extensibility; this design plays one round.
    pub current_round: u32,
    pub max_rounds: u32,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The shared record coordinating one multiplayer match instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// 4-digit human-entry code, unique among `Waiting` rooms.
    pub short_code: String,
    pub name: String,
    pub host_id: PlayerId,
    pub host_name: String,
    /// Join order determines turn rotation order.
    pub players: Vec<Player>,
    pub max_players: usize,
    pub difficulty: Difficulty,
    pub status: RoomStatus,
    /// Present only while `status == Playing`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_data: Option<GameData>,
    pub created_at: u64,
    pub is_private: bool,
    /// Stored only for private rooms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Room {
    /// Looks up a player by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Mutable lookup by id.
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    /// The player currently flagged as host, if any.
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// Connected players in join order (the turn rotation order).
    pub fn connected_players(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| p.is_connected).collect()
    }

    /// Returns `true` if no player slot remains.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Transfers hostship to `new_host`, clearing the flag elsewhere.
    /// A no-op when `new_host` is not in the room.
    pub fn promote_host(&mut self, new_host: &PlayerId) {
        for p in &mut self.players {
            p.is_host = &p.id == new_host;
        }
        let promoted = self.player(new_host).map(|p| (p.id.clone(), p.name.clone()));
        if let Some((id, name)) = promoted {
            self.host_id = id;
            self.host_name = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_room() -> Room {
        let host = {
            let mut p = Player::new(PlayerId::from("h"), "Hana", "wizard", 3);
            p.is_host = true;
            p.is_ready = true;
            p
        };
        Room {
            id: RoomId::from("r-1"),
            short_code: "1234".to_string(),
            name: "test".to_string(),
            host_id: host.id.clone(),
            host_name: host.name.clone(),
            players: vec![host],
            max_players: 2,
            difficulty: Difficulty::Easy,
            status: RoomStatus::Waiting,
            game_data: None,
            created_at: 0,
            is_private: false,
            password: None,
        }
    }

    #[test]
    fn test_status_transitions_are_strictly_forward() {
        assert!(RoomStatus::Waiting.can_transition_to(RoomStatus::Playing));
        assert!(RoomStatus::Playing.can_transition_to(RoomStatus::Finished));
        assert!(!RoomStatus::Waiting.can_transition_to(RoomStatus::Finished));
        assert!(!RoomStatus::Playing.can_transition_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Finished.can_transition_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Finished.can_transition_to(RoomStatus::Playing));
    }

    #[test]
    fn test_only_waiting_is_joinable() {
        assert!(RoomStatus::Waiting.is_joinable());
        assert!(!RoomStatus::Playing.is_joinable());
        assert!(!RoomStatus::Finished.is_joinable());
    }

    #[test]
    fn test_connected_players_preserve_join_order() {
        let mut room = sample_room();
        room.max_players = 4;
        room.players.push(Player::new(PlayerId::from("a"), "A", "cat", 1));
        room.players.push(Player::new(PlayerId::from("b"), "B", "dog", 1));
        room.players[1].is_connected = false;

        let connected: Vec<_> =
            room.connected_players().iter().map(|p| p.name.clone()).collect();
        assert_eq!(connected, vec!["Hana", "B"]);
    }

    #[test]
    fn test_promote_host_moves_the_flag() {
        let mut room = sample_room();
        room.max_players = 4;
        room.players.push(Player::new(PlayerId::from("a"), "A", "cat", 1));

        room.promote_host(&PlayerId::from("a"));
        assert_eq!(room.host_id, PlayerId::from("a"));
        assert_eq!(room.host_name, "A");
        assert!(!room.players[0].is_host);
        assert!(room.players[1].is_host);
    }

    #[test]
    fn test_promote_host_to_absent_player_keeps_fields() {
        let mut room = sample_room();
        room.promote_host(&PlayerId::from("nobody"));
        assert_eq!(room.host_id, PlayerId::from("h"));
        assert_eq!(room.host_name, "Hana");
    }

    #[test]
    fn test_password_absent_from_public_record() {
        let room = sample_room();
        let json = serde_json::to_string(&room).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("game_data"));
    }

    #[test]
    fn test_reset_for_round_clears_transients() {
        let mut p = Player::new(PlayerId::from("x"), "X", "owl", 1);
        p.score = 90;
        p.attempts = 3;
        p.has_guessed = true;
        p.last_guess = Some(42);
        p.guess_time = 1200;

        p.reset_for_round();
        assert_eq!(p.score, 0);
        assert_eq!(p.attempts, 0);
        assert!(!p.has_guessed);
        assert_eq!(p.last_guess, None);
        assert_eq!(p.guess_time, 0);
    }
}
