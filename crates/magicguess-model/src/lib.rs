//! Shared record types for magicGuess.
//!
//! Everything in this crate is data that lives in the shared room record
//! store: the room record itself, its embedded players and round state,
//! and the append-only chat messages. No coordination logic lives here —
//! the rules that produce valid next records belong to the `magicguess`
//! crate.
//!
//! # Key types
//!
//! - [`Room`] — the shared record coordinating one match instance
//! - [`Player`] — embedded in [`Room`], join order = turn rotation order
//! - [`GameData`] — authoritative round state while a game is running
//! - [`RoomStatus`] — the `Waiting → Playing → Finished` state machine
//! - [`ChatMessage`] — append-only room-scoped event stream entry
//! - [`Difficulty`] — guess range and base time per difficulty

mod chat;
mod difficulty;
mod ids;
mod room;

pub use chat::{ChatMessage, MessageKind};
pub use difficulty::{Difficulty, TURN_TIME_LIMIT_MS};
pub use ids::{PlayerId, RoomId};
pub use room::{GameData, Player, Room, RoomStatus};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// All cross-client timestamps in the room record (turn starts, message
/// times, room creation) use this representation so every client reads
/// the same authoritative values back out of the store.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
