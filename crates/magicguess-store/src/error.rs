//! Error types for the record store layer.

use magicguess_model::RoomId;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for this room id.
    #[error("no record for room {0}")]
    NoRecord(RoomId),

    /// Attempted to insert a record that already exists.
    #[error("record for room {0} already exists")]
    AlreadyExists(RoomId),

    /// A conditional write observed a different version than expected.
    /// The caller should re-read and retry.
    #[error("version conflict on room {room}: expected {expected}, found {found}")]
    VersionConflict {
        room: RoomId,
        expected: u64,
        found: u64,
    },

    /// An optimistic update loop exhausted its retry budget.
    #[error("too much contention updating room {0}")]
    Contention(RoomId),

    /// The backing store is unreachable or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
