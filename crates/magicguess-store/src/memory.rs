//! In-process record store backed by tokio channels.
//!
//! Serves two roles: the store used by tests, and the backing for local
//! (same-process) play. Rooms are held under one mutex with versions
//! managed by the store; subscriptions use `watch` channels (last-value
//! snapshot semantics, like a realtime database listener) and chat
//! fan-out uses `broadcast`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use magicguess_model::{ChatMessage, Room, RoomId};
use tokio::sync::{broadcast, watch};

use crate::{RecordStore, StoreError, Versioned};

/// Capacity of each room's chat broadcast channel. A lagging subscriber
/// misses messages rather than blocking appends.
const CHAT_CHANNEL_CAPACITY: usize = 64;

struct RoomEntry {
    room: Room,
    version: u64,
}

struct ChatLog {
    messages: Vec<ChatMessage>,
    tx: broadcast::Sender<ChatMessage>,
}

impl ChatLog {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHAT_CHANNEL_CAPACITY);
        Self { messages: Vec::new(), tx }
    }
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomId, RoomEntry>,
    watches: HashMap<RoomId, watch::Sender<Option<Room>>>,
    chats: HashMap<RoomId, ChatLog>,
}

/// Shared in-memory implementation of [`RecordStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live room watch channels. Diagnostics only.
    pub fn watch_channels(&self) -> usize {
        self.lock().watches.len()
    }

    /// No await ever happens while this guard is held.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(inner: &mut Inner, id: &RoomId, snapshot: Option<Room>) {
        if let Some(tx) = inner.watches.get(id) {
            // Send fails only when every receiver is gone; that's fine.
            let _ = tx.send(snapshot);
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, id: &RoomId) -> Result<Option<Versioned>, StoreError> {
        let inner = self.lock();
        Ok(inner.rooms.get(id).map(|e| Versioned {
            room: e.room.clone(),
            version: e.version,
        }))
    }

    async fn insert(&self, room: Room) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let id = room.id.clone();
        if inner.rooms.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        inner.rooms.insert(
            id.clone(),
            RoomEntry { room: room.clone(), version: 1 },
        );
        Self::notify(&mut inner, &id, Some(room));
        Ok(1)
    }

    async fn compare_and_swap(
        &self,
        id: &RoomId,
        expected: u64,
        room: Room,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let entry = inner
            .rooms
            .get_mut(id)
            .ok_or_else(|| StoreError::NoRecord(id.clone()))?;
        if entry.version != expected {
            return Err(StoreError::VersionConflict {
                room: id.clone(),
                expected,
                found: entry.version,
            });
        }
        entry.version += 1;
        entry.room = room.clone();
        let version = entry.version;
        Self::notify(&mut inner, id, Some(room));
        Ok(version)
    }

    async fn delete(&self, id: &RoomId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.rooms.remove(id).is_some() {
            Self::notify(&mut inner, id, None);
        }
        // Without the record, a watch channel nobody listens to is dead
        // weight; keep it only while receivers are still attached.
        if inner
            .watches
            .get(id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            inner.watches.remove(id);
        }
        Ok(())
    }

    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        let inner = self.lock();
        Ok(inner.rooms.values().map(|e| e.room.clone()).collect())
    }

    async fn subscribe(
        &self,
        id: &RoomId,
    ) -> Result<watch::Receiver<Option<Room>>, StoreError> {
        let mut inner = self.lock();
        let snapshot = inner.rooms.get(id).map(|e| e.room.clone());
        let tx = inner
            .watches
            .entry(id.clone())
            .or_insert_with(|| watch::channel(snapshot).0);
        Ok(tx.subscribe())
    }

    async fn append_chat(
        &self,
        id: &RoomId,
        msg: ChatMessage,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let log = inner.chats.entry(id.clone()).or_insert_with(ChatLog::new);
        log.messages.push(msg.clone());
        // Send fails only when nobody is subscribed yet.
        let _ = log.tx.send(msg);
        Ok(())
    }

    async fn chat_tail(
        &self,
        id: &RoomId,
        n: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.lock();
        Ok(match inner.chats.get(id) {
            Some(log) => {
                let start = log.messages.len().saturating_sub(n);
                log.messages[start..].to_vec()
            }
            None => Vec::new(),
        })
    }

    async fn subscribe_chat(
        &self,
        id: &RoomId,
    ) -> Result<broadcast::Receiver<ChatMessage>, StoreError> {
        let mut inner = self.lock();
        let log = inner.chats.entry(id.clone()).or_insert_with(ChatLog::new);
        Ok(log.tx.subscribe())
    }

    async fn delete_chat(&self, id: &RoomId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.chats.remove(id);
        Ok(())
    }
}
