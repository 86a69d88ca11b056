//! Integration tests for the in-memory record store.

use magicguess_model::{
    ChatMessage, Difficulty, Player, PlayerId, Room, RoomId, RoomStatus,
};
use magicguess_store::{modify_room, Apply, MemoryStore, RecordStore, StoreError};

// =========================================================================
// Helpers
// =========================================================================

fn sample_room(id: &str) -> Room {
    let mut host = Player::new(PlayerId::from("host"), "Hana", "wizard", 5);
    host.is_host = true;
    host.is_ready = true;
    Room {
        id: RoomId::from(id),
        short_code: "4242".to_string(),
        name: "store test".to_string(),
        host_id: host.id.clone(),
        host_name: host.name.clone(),
        players: vec![host],
        max_players: 4,
        difficulty: Difficulty::Easy,
        status: RoomStatus::Waiting,
        game_data: None,
        created_at: 0,
        is_private: false,
        password: None,
    }
}

// =========================================================================
// Record CRUD and versioning
// =========================================================================

#[tokio::test]
async fn test_insert_then_get_roundtrip() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");

    let version = store.insert(room.clone()).await.unwrap();
    assert_eq!(version, 1);

    let read = store.get(&room.id).await.unwrap().unwrap();
    assert_eq!(read.room, room);
    assert_eq!(read.version, 1);
}

#[tokio::test]
async fn test_insert_duplicate_id_fails() {
    let store = MemoryStore::new();
    store.insert(sample_room("r-1")).await.unwrap();

    let result = store.insert(sample_room("r-1")).await;
    assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_cas_succeeds_on_current_version() {
    let store = MemoryStore::new();
    let mut room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    room.name = "renamed".to_string();
    let version = store.compare_and_swap(&room.id, 1, room.clone()).await.unwrap();
    assert_eq!(version, 2);

    let read = store.get(&room.id).await.unwrap().unwrap();
    assert_eq!(read.room.name, "renamed");
}

#[tokio::test]
async fn test_cas_rejects_stale_version() {
    let store = MemoryStore::new();
    let mut room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    room.name = "first writer".to_string();
    store.compare_and_swap(&room.id, 1, room.clone()).await.unwrap();

    // A second writer still holding version 1 must not clobber.
    room.name = "stale writer".to_string();
    let result = store.compare_and_swap(&room.id, 1, room.clone()).await;
    assert!(matches!(
        result,
        Err(StoreError::VersionConflict { expected: 1, found: 2, .. })
    ));

    let read = store.get(&room.id).await.unwrap().unwrap();
    assert_eq!(read.room.name, "first writer");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    store.delete(&room.id).await.unwrap();
    store.delete(&room.id).await.unwrap();
    assert!(store.get(&room.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rooms_returns_full_scan() {
    let store = MemoryStore::new();
    store.insert(sample_room("r-1")).await.unwrap();
    store.insert(sample_room("r-2")).await.unwrap();

    let rooms = store.rooms().await.unwrap();
    assert_eq!(rooms.len(), 2);
}

// =========================================================================
// modify_room
// =========================================================================

#[tokio::test]
async fn test_modify_room_updates_in_place() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let out: Result<usize, StoreError> =
        modify_room(&store, &room.id, 3, |current| {
            let mut updated = current.expect("room exists").clone();
            updated.max_players = 6;
            Ok(Apply::Update(updated, 6))
        })
        .await;
    assert_eq!(out.unwrap(), 6);

    let read = store.get(&room.id).await.unwrap().unwrap();
    assert_eq!(read.room.max_players, 6);
    assert_eq!(read.version, 2);
}

#[tokio::test]
async fn test_modify_room_creates_when_absent() {
    let store = MemoryStore::new();
    let id = RoomId::from("r-new");

    let _: () = modify_room(&store, &id, 3, |current| {
        assert!(current.is_none());
        Ok::<_, StoreError>(Apply::Update(sample_room("r-new"), ()))
    })
    .await
    .unwrap();

    assert!(store.get(&id).await.unwrap().is_some());
}

/// A store whose first `n` conditional writes fail with a version
/// conflict, simulating concurrent writers racing on the same record.
struct ContendedStore {
    inner: MemoryStore,
    conflicts_left: std::sync::atomic::AtomicU32,
}

impl ContendedStore {
    fn new(conflicts: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            conflicts_left: std::sync::atomic::AtomicU32::new(conflicts),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for ContendedStore {
    async fn get(
        &self,
        id: &RoomId,
    ) -> Result<Option<magicguess_store::Versioned>, StoreError> {
        self.inner.get(id).await
    }

    async fn insert(&self, room: Room) -> Result<u64, StoreError> {
        self.inner.insert(room).await
    }

    async fn compare_and_swap(
        &self,
        id: &RoomId,
        expected: u64,
        room: Room,
    ) -> Result<u64, StoreError> {
        use std::sync::atomic::Ordering;
        if self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok()
        {
            return Err(StoreError::VersionConflict {
                room: id.clone(),
                expected,
                found: expected + 1,
            });
        }
        self.inner.compare_and_swap(id, expected, room).await
    }

    async fn delete(&self, id: &RoomId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.inner.rooms().await
    }

    async fn subscribe(
        &self,
        id: &RoomId,
    ) -> Result<tokio::sync::watch::Receiver<Option<Room>>, StoreError> {
        self.inner.subscribe(id).await
    }

    async fn append_chat(
        &self,
        id: &RoomId,
        msg: ChatMessage,
    ) -> Result<(), StoreError> {
        self.inner.append_chat(id, msg).await
    }

    async fn chat_tail(
        &self,
        id: &RoomId,
        n: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        self.inner.chat_tail(id, n).await
    }

    async fn subscribe_chat(
        &self,
        id: &RoomId,
    ) -> Result<tokio::sync::broadcast::Receiver<ChatMessage>, StoreError> {
        self.inner.subscribe_chat(id).await
    }

    async fn delete_chat(&self, id: &RoomId) -> Result<(), StoreError> {
        self.inner.delete_chat(id).await
    }
}

#[tokio::test]
async fn test_modify_room_retries_after_conflict() {
    let store = ContendedStore::new(1);
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let mut attempts = 0;
    let _: () = modify_room(&store, &room.id, 3, |current| {
        attempts += 1;
        let mut updated = current.expect("room exists").clone();
        updated.max_players = 8;
        Ok::<_, StoreError>(Apply::Update(updated, ()))
    })
    .await
    .unwrap();

    // One conflicted attempt, then the retry lands.
    assert_eq!(attempts, 2);
    let read = store.get(&room.id).await.unwrap().unwrap();
    assert_eq!(read.room.max_players, 8);
}

#[tokio::test]
async fn test_modify_room_gives_up_under_contention() {
    let store = ContendedStore::new(u32::MAX);
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let result: Result<(), StoreError> =
        modify_room(&store, &room.id, 2, |current| {
            let mut updated = current.expect("room exists").clone();
            updated.max_players = 8;
            Ok(Apply::Update(updated, ()))
        })
        .await;

    assert!(matches!(result, Err(StoreError::Contention(_))));
}

#[tokio::test]
async fn test_modify_room_skip_leaves_record_untouched() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let _: () = modify_room(&store, &room.id, 3, |_| {
        Ok::<_, StoreError>(Apply::Skip(()))
    })
    .await
    .unwrap();

    let read = store.get(&room.id).await.unwrap().unwrap();
    assert_eq!(read.version, 1);
}

// =========================================================================
// Subscriptions
// =========================================================================

#[tokio::test]
async fn test_subscribe_sees_updates_and_deletion() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let mut rx = store.subscribe(&room.id).await.unwrap();
    assert!(rx.borrow().is_some());

    let mut updated = room.clone();
    updated.name = "changed".to_string();
    store.compare_and_swap(&room.id, 1, updated).await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().as_ref().unwrap().name, "changed");

    store.delete(&room.id).await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_none());
}

#[tokio::test]
async fn test_delete_prunes_abandoned_watch_channels() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let rx = store.subscribe(&room.id).await.unwrap();
    assert_eq!(store.watch_channels(), 1);
    drop(rx);

    store.delete(&room.id).await.unwrap();
    assert_eq!(store.watch_channels(), 0);
}

#[tokio::test]
async fn test_delete_keeps_watch_channel_with_live_receiver() {
    let store = MemoryStore::new();
    let room = sample_room("r-1");
    store.insert(room.clone()).await.unwrap();

    let mut rx = store.subscribe(&room.id).await.unwrap();
    store.delete(&room.id).await.unwrap();

    // The attached receiver still observes the deletion.
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_none());
    assert_eq!(store.watch_channels(), 1);
}

#[tokio::test]
async fn test_subscribe_before_creation_observes_insert() {
    let store = MemoryStore::new();
    let id = RoomId::from("r-later");

    let mut rx = store.subscribe(&id).await.unwrap();
    assert!(rx.borrow().is_none());

    store.insert(sample_room("r-later")).await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_some());
}

// =========================================================================
// Chat log
// =========================================================================

#[tokio::test]
async fn test_chat_tail_returns_last_n_in_order() {
    let store = MemoryStore::new();
    let id = RoomId::from("r-1");

    for i in 0..10 {
        let msg = ChatMessage::system(&format!("m{i}"), &format!("notice {i}"));
        store.append_chat(&id, msg).await.unwrap();
    }

    let tail = store.chat_tail(&id, 3).await.unwrap();
    let texts: Vec<_> = tail.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["notice 7", "notice 8", "notice 9"]);

    // Asking for more than exists returns everything.
    assert_eq!(store.chat_tail(&id, 100).await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_chat_subscription_receives_appends() {
    let store = MemoryStore::new();
    let id = RoomId::from("r-1");

    let mut rx = store.subscribe_chat(&id).await.unwrap();
    store
        .append_chat(&id, ChatMessage::game("m1", "It is Hana's turn"))
        .await
        .unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.message, "It is Hana's turn");
}

#[tokio::test]
async fn test_delete_chat_drops_the_log() {
    let store = MemoryStore::new();
    let id = RoomId::from("r-1");
    store
        .append_chat(&id, ChatMessage::system("m1", "hello"))
        .await
        .unwrap();

    store.delete_chat(&id).await.unwrap();
    assert!(store.chat_tail(&id, 10).await.unwrap().is_empty());
}
