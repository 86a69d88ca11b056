//! The unified error type for coordination operations.

use magicguess_model::{PlayerId, RoomId};
use magicguess_store::StoreError;

/// Everything a coordination operation can fail with.
///
/// All of these are recoverable and user-visible: the calling UI
/// surfaces the message and decides whether to retry. No error crosses
/// client boundaries; each client raises its own.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The room id does not resolve to a record.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The short code does not resolve to a waiting room.
    #[error("no open room with code {0}")]
    CodeNotFound(String),

    /// Wrong password for a private room.
    #[error("wrong password for room {0}")]
    WrongPassword(RoomId),

    /// The acting player is not a member of the room.
    #[error("player {0} is not in this room")]
    NotAMember(PlayerId),

    /// Only the host may perform this action.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// No player slot remains.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room's status does not allow this operation.
    #[error("invalid room state: {0}")]
    InvalidState(String),

    /// It is another player's turn.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The active player already used their guess this turn.
    #[error("player {0} already guessed this turn")]
    AlreadyGuessed(PlayerId),

    /// The guess arrived after the turn's time budget expired.
    /// Side effect: the turn has been advanced.
    #[error("the turn's time budget expired")]
    TurnExpired,

    /// Malformed creation or input parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A store-level failure (contention, unavailability).
    #[error(transparent)]
    Store(#[from] StoreError),
}
