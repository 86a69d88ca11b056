//! The room-scoped chat and event log.
//!
//! One append-only stream per room carries three kinds of entries:
//! player chat, lifecycle notices, and game events. Coordination
//! operations write their audit messages through the same log the UI
//! renders, so every client sees one consistent event history.

use std::sync::Arc;

use magicguess_model::{ChatMessage, PlayerId, RoomId};
use magicguess_store::RecordStore;
use tokio::sync::broadcast;

use crate::keys::push_key;
use crate::GameError;

/// Length of generated message ids.
const MESSAGE_KEY_LEN: usize = 12;

/// Appends to and reads from a room's message stream.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn RecordStore>,
}

impl EventLog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Sends a chat message authored by a room member.
    ///
    /// Fails with [`GameError::NotAMember`] when the author is not in
    /// the room, and [`GameError::RoomNotFound`] when the room is gone.
    pub async fn send_player_message(
        &self,
        room_id: &RoomId,
        author: &PlayerId,
        text: &str,
    ) -> Result<(), GameError> {
        let versioned = self
            .store
            .get(room_id)
            .await?
            .ok_or_else(|| GameError::RoomNotFound(room_id.clone()))?;
        let player = versioned
            .room
            .player(author)
            .ok_or_else(|| GameError::NotAMember(author.clone()))?;

        let msg = ChatMessage::player(
            &push_key(MESSAGE_KEY_LEN),
            author.clone(),
            &player.name,
            text,
        );
        self.store.append_chat(room_id, msg).await?;
        Ok(())
    }

    /// Appends a lifecycle notice (join, departure) from the system id.
    pub async fn system(&self, room_id: &RoomId, text: &str) -> Result<(), GameError> {
        let msg = ChatMessage::system(&push_key(MESSAGE_KEY_LEN), text);
        self.store.append_chat(room_id, msg).await?;
        Ok(())
    }

    /// Appends a game event (turn change, feedback, victory) from the
    /// system id.
    pub async fn game(&self, room_id: &RoomId, text: &str) -> Result<(), GameError> {
        let msg = ChatMessage::game(&push_key(MESSAGE_KEY_LEN), text);
        self.store.append_chat(room_id, msg).await?;
        Ok(())
    }

    /// The last `n` messages, oldest first.
    pub async fn tail(
        &self,
        room_id: &RoomId,
        n: usize,
    ) -> Result<Vec<ChatMessage>, GameError> {
        Ok(self.store.chat_tail(room_id, n).await?)
    }

    /// Live subscription to messages appended after this call.
    pub async fn subscribe(
        &self,
        room_id: &RoomId,
    ) -> Result<broadcast::Receiver<ChatMessage>, GameError> {
        Ok(self.store.subscribe_chat(room_id).await?)
    }
}
