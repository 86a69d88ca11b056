//! The client facade: one handle wiring every coordination component to
//! a shared store.
//!
//! A `GameClient` is what an app embeds. It holds no authority of its
//! own; every instance attached to the same store sees and enforces the
//! same protocol, and any of them may drive turn timeouts or cleanup.

use std::sync::Arc;
use std::time::Duration;

use magicguess_model::{
    now_ms, ChatMessage, Difficulty, PlayerId, Room, RoomId, RoomStatus,
};
use magicguess_round::Feedback;
use magicguess_store::RecordStore;
use magicguess_timer::{remaining, RecurringTask};
use tokio::sync::{broadcast, watch};

use crate::chat::EventLog;
use crate::cleanup::Cleanup;
use crate::config::ClientConfig;
use crate::guess::GuessEngine;
use crate::matchmaking::Matchmaker;
use crate::rooms::{CreatedRoom, PlayerProfile, RoomLifecycle, RoomOptions};
use crate::turns::TurnCoordinator;
use crate::GameError;

/// Handle to a turn-deadline watcher. Call [`TurnWatcher::stop`] to end
/// it; it also ends on its own when the room finishes or disappears.
pub struct TurnWatcher {
    stop_tx: watch::Sender<bool>,
}

impl TurnWatcher {
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// A game client bound to one shared record store.
#[derive(Clone)]
pub struct GameClient {
    store: Arc<dyn RecordStore>,
    config: ClientConfig,
    rooms: RoomLifecycle,
    turns: TurnCoordinator,
    guesses: GuessEngine,
    matchmaker: Matchmaker,
    cleanup: Cleanup,
    events: EventLog,
}

impl GameClient {
    pub fn new(store: Arc<dyn RecordStore>, config: ClientConfig) -> Self {
        let events = EventLog::new(Arc::clone(&store));
        let rooms = RoomLifecycle::new(
            Arc::clone(&store),
            events.clone(),
            config.max_write_retries,
        );
        let turns = TurnCoordinator::new(
            Arc::clone(&store),
            events.clone(),
            config.max_write_retries,
        );
        let guesses = GuessEngine::new(
            Arc::clone(&store),
            events.clone(),
            turns.clone(),
            config.feedback_delay,
            config.max_write_retries,
        );
        let matchmaker = Matchmaker::new(Arc::clone(&store), rooms.clone());
        let cleanup = Cleanup::new(Arc::clone(&store), config.room_max_age);
        Self {
            store,
            config,
            rooms,
            turns,
            guesses,
            matchmaker,
            cleanup,
            events,
        }
    }

    /// A client with default settings.
    pub fn with_defaults(store: Arc<dyn RecordStore>) -> Self {
        Self::new(store, ClientConfig::default())
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    pub async fn create_room(
        &self,
        host_id: &PlayerId,
        profile: &PlayerProfile,
        options: RoomOptions,
    ) -> Result<CreatedRoom, GameError> {
        self.rooms.create_room(host_id, profile, options).await
    }

    pub async fn join_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        profile: &PlayerProfile,
        password: Option<&str>,
    ) -> Result<(), GameError> {
        self.rooms.join_room(room_id, player_id, profile, password).await
    }

    pub async fn join_room_by_code(
        &self,
        short_code: &str,
        player_id: &PlayerId,
        profile: &PlayerProfile,
        password: Option<&str>,
    ) -> Result<RoomId, GameError> {
        self.rooms
            .join_room_by_code(short_code, player_id, profile, password)
            .await
    }

    pub async fn leave_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<(), GameError> {
        self.rooms.leave_room(room_id, player_id).await
    }

    pub async fn toggle_ready(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<(), GameError> {
        self.rooms.toggle_ready(room_id, player_id).await
    }

    /// Starts the game; `caller` must be the host.
    pub async fn start_game(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
    ) -> Result<(), GameError> {
        self.rooms.start_game(room_id, caller).await
    }

    pub async fn get_public_rooms(&self) -> Result<Vec<Room>, GameError> {
        self.rooms.get_public_rooms().await
    }

    /// Current snapshot of a room record.
    pub async fn room(&self, room_id: &RoomId) -> Result<Option<Room>, GameError> {
        Ok(self.store.get(room_id).await?.map(|v| v.room))
    }

    /// Live subscription to a room record. Yields `None` on deletion.
    pub async fn subscribe_room(
        &self,
        room_id: &RoomId,
    ) -> Result<watch::Receiver<Option<Room>>, GameError> {
        Ok(self.store.subscribe(room_id).await?)
    }

    // -----------------------------------------------------------------------
    // Play
    // -----------------------------------------------------------------------

    pub async fn make_guess(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        guess: u32,
    ) -> Result<Feedback, GameError> {
        self.guesses.make_guess(room_id, player_id, guess).await
    }

    /// Rotates the turn immediately; exposed for explicit skips.
    pub async fn advance_turn(&self, room_id: &RoomId) -> Result<(), GameError> {
        self.turns.advance_turn(room_id).await
    }

    /// Advances the turn if the active turn's deadline has passed.
    pub async fn handle_turn_timeout(&self, room_id: &RoomId) -> Result<(), GameError> {
        self.turns.handle_turn_timeout(room_id).await
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    pub async fn send_chat_message(
        &self,
        room_id: &RoomId,
        author: &PlayerId,
        text: &str,
    ) -> Result<(), GameError> {
        self.events.send_player_message(room_id, author, text).await
    }

    /// The trailing window of the room's message log, oldest first.
    pub async fn chat_tail(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, GameError> {
        self.events.tail(room_id, self.config.chat_tail_len).await
    }

    pub async fn subscribe_chat(
        &self,
        room_id: &RoomId,
    ) -> Result<broadcast::Receiver<ChatMessage>, GameError> {
        self.events.subscribe(room_id).await
    }

    // -----------------------------------------------------------------------
    // Matchmaking and maintenance
    // -----------------------------------------------------------------------

    pub async fn find_match(
        &self,
        player_id: &PlayerId,
        profile: &PlayerProfile,
        difficulty: Difficulty,
    ) -> Result<RoomId, GameError> {
        self.matchmaker.find_match(player_id, profile, difficulty).await
    }

    /// One cleanup sweep, on demand. Returns the number of rooms removed.
    pub async fn cleanup_inactive_rooms(&self) -> Result<usize, GameError> {
        self.cleanup.cleanup_inactive_rooms().await
    }

    /// Starts the periodic cleanup sweep with this client's interval.
    pub fn spawn_cleanup(&self) -> RecurringTask {
        self.cleanup.clone().spawn(self.config.cleanup_interval)
    }

    /// Seconds-precision view of the active turn's remaining time.
    pub async fn turn_remaining(&self, room_id: &RoomId) -> Result<Duration, GameError> {
        let Some(room) = self.room(room_id).await? else {
            return Ok(Duration::ZERO);
        };
        let Some(gd) = room.game_data else {
            return Ok(Duration::ZERO);
        };
        Ok(remaining(now_ms(), gd.turn_start_time, gd.turn_time_limit))
    }

    /// Watches a room and fires the turn-timeout handler whenever the
    /// active turn's deadline passes.
    ///
    /// Deadlines are derived from the record's `turn_start_time`, never
    /// from a local countdown, so every watching client computes the
    /// same deadline and the store-level guard picks one winner. The
    /// watcher ends when the room finishes or is deleted.
    pub async fn watch_turns(&self, room_id: &RoomId) -> Result<TurnWatcher, GameError> {
        let mut room_rx = self.store.subscribe(room_id).await?;
        let turns = self.turns.clone();
        let room_id = room_id.clone();
        let (stop_tx, mut stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            loop {
                let snapshot = room_rx.borrow_and_update().clone();
                let Some(room) = snapshot else { break };
                if room.status == RoomStatus::Finished {
                    break;
                }

                let deadline = match (&room.status, &room.game_data) {
                    (RoomStatus::Playing, Some(gd)) => {
                        Some(remaining(now_ms(), gd.turn_start_time, gd.turn_time_limit))
                    }
                    _ => None,
                };

                match deadline {
                    Some(wait) => {
                        tokio::select! {
                            _ = tokio::time::sleep(wait) => {
                                if let Err(err) = turns.handle_turn_timeout(&room_id).await {
                                    tracing::warn!(%room_id, %err, "turn timeout handling failed");
                                }
                                // The advance (ours or a rival's) writes the
                                // record; wait for it before re-arming.
                                tokio::select! {
                                    changed = room_rx.changed() => {
                                        if changed.is_err() {
                                            break;
                                        }
                                    }
                                    _ = stop_rx.changed() => break,
                                }
                            }
                            changed = room_rx.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                            }
                            _ = stop_rx.changed() => break,
                        }
                    }
                    None => {
                        tokio::select! {
                            changed = room_rx.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                            }
                            _ = stop_rx.changed() => break,
                        }
                    }
                }
            }
            tracing::debug!(%room_id, "turn watcher ended");
        });

        Ok(TurnWatcher { stop_tx })
    }
}
