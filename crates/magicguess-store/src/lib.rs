//! The room record store collaborator contract.
//!
//! The store is the only serialization point in the whole design: there
//! is no server process, so every connected client runs the same
//! coordination logic against one shared record per room. This crate
//! defines that contract ([`RecordStore`]), the optimistic update helper
//! every coordination write goes through ([`modify_room`]), and an
//! in-process implementation ([`MemoryStore`]) used by tests and local
//! play.
//!
//! # Conditional writes
//!
//! Plain last-write-wins lets two clients race to advance the same turn
//! (a timeout firing on one client while the active player's guess lands
//! on another) and silently lose one of the updates. The contract
//! therefore requires a compare-and-swap on a store-managed version:
//! a write based on a stale snapshot fails with
//! [`StoreError::VersionConflict`] and the caller re-reads and retries.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use magicguess_model::{ChatMessage, Room, RoomId};
use tokio::sync::{broadcast, watch};

/// A room record paired with the store-managed version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned {
    pub room: Room,
    pub version: u64,
}

/// Abstract contract over the shared record store.
///
/// One record per room plus one append-only message log per room. The
/// trait is object-safe so coordination components can share a single
/// `Arc<dyn RecordStore>` regardless of the backing implementation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the current record for a room, with its version.
    async fn get(&self, id: &RoomId) -> Result<Option<Versioned>, StoreError>;

    /// Creates the record for a new room. Fails with
    /// [`StoreError::AlreadyExists`] if the id is taken.
    async fn insert(&self, room: Room) -> Result<u64, StoreError>;

    /// Replaces the record only if its version still equals `expected`.
    /// Returns the new version on success.
    async fn compare_and_swap(
        &self,
        id: &RoomId,
        expected: u64,
        room: Room,
    ) -> Result<u64, StoreError>;

    /// Deletes a room record. Deleting an absent record is a no-op.
    /// Subscribers observe `None`.
    async fn delete(&self, id: &RoomId) -> Result<(), StoreError>;

    /// Returns every room record. Callers filter; no index is assumed
    /// beyond the full scan.
    async fn rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// Subscribes to changes of one room record. The receiver always
    /// holds the latest snapshot; `None` means the record was deleted.
    async fn subscribe(
        &self,
        id: &RoomId,
    ) -> Result<watch::Receiver<Option<Room>>, StoreError>;

    /// Appends a message to a room's event stream.
    async fn append_chat(
        &self,
        id: &RoomId,
        msg: ChatMessage,
    ) -> Result<(), StoreError>;

    /// Returns the last `n` messages of a room's stream, oldest first.
    async fn chat_tail(
        &self,
        id: &RoomId,
        n: usize,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Subscribes to messages appended after this call.
    async fn subscribe_chat(
        &self,
        id: &RoomId,
    ) -> Result<broadcast::Receiver<ChatMessage>, StoreError>;

    /// Deletes a room's entire message log.
    async fn delete_chat(&self, id: &RoomId) -> Result<(), StoreError>;
}

/// What a [`modify_room`] closure decided to do with the record.
pub enum Apply<T> {
    /// Write the updated record back (conditionally, on the read version).
    Update(Room, T),
    /// Delete the record.
    Remove(T),
    /// Leave the record untouched.
    Skip(T),
}

/// Reads a room record, applies `f`, and conditionally writes the result.
///
/// Retries on [`StoreError::VersionConflict`] up to `max_retries` extra
/// attempts, re-reading the current record each time, then gives up with
/// [`StoreError::Contention`]. The closure sees `None` when the record
/// does not exist; returning `Apply::Update` in that case creates it.
///
/// Domain errors raised by the closure abort immediately without
/// retrying — only write conflicts are transient.
pub async fn modify_room<T, E, F>(
    store: &dyn RecordStore,
    id: &RoomId,
    max_retries: u32,
    mut f: F,
) -> Result<T, E>
where
    E: From<StoreError>,
    F: FnMut(Option<&Room>) -> Result<Apply<T>, E>,
{
    for attempt in 0..=max_retries {
        let current = store.get(id).await?;
        let (snapshot, version) = match &current {
            Some(v) => (Some(&v.room), v.version),
            None => (None, 0),
        };

        match f(snapshot)? {
            Apply::Update(room, out) => {
                let write = if version == 0 {
                    store.insert(room).await
                } else {
                    store.compare_and_swap(id, version, room).await
                };
                match write {
                    Ok(_) => return Ok(out),
                    Err(
                        StoreError::VersionConflict { .. }
                        | StoreError::AlreadyExists(_),
                    ) => {
                        tracing::debug!(
                            room_id = %id,
                            attempt,
                            "write conflict, re-reading"
                        );
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Apply::Remove(out) => {
                store.delete(id).await?;
                return Ok(out);
            }
            Apply::Skip(out) => return Ok(out),
        }
    }

    Err(StoreError::Contention(id.clone()).into())
}
