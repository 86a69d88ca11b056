//! Periodic removal of dead rooms.
//!
//! Any client may run the sweep; deleting an already-deleted room is a
//! no-op, so overlapping sweeps from several clients are harmless.

use std::sync::Arc;
use std::time::Duration;

use magicguess_model::{now_ms, Room, RoomId, RoomStatus};
use magicguess_store::RecordStore;
use magicguess_timer::{RecurringConfig, RecurringTask};

use crate::GameError;

/// Sweeps rooms that no one will come back to.
#[derive(Clone)]
pub struct Cleanup {
    store: Arc<dyn RecordStore>,
    max_age: Duration,
}

impl Cleanup {
    pub(crate) fn new(store: Arc<dyn RecordStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    /// Deletes rooms that are abandoned or stale, with their chat logs.
    /// Returns how many were removed.
    ///
    /// A room goes when every player has disconnected, or when it is
    /// older than the age limit and no connected players are mid-game
    /// in it.
    pub async fn cleanup_inactive_rooms(&self) -> Result<usize, GameError> {
        let now = now_ms();
        let max_age_ms = self.max_age.as_millis() as u64;
        let mut removed = 0usize;

        for room in self.store.rooms().await? {
            if !self.should_remove(&room, now, max_age_ms) {
                continue;
            }
            self.remove(&room.id).await?;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(removed, "cleanup sweep done");
        }
        Ok(removed)
    }

    fn should_remove(&self, room: &Room, now: u64, max_age_ms: u64) -> bool {
        let abandoned = room.players.iter().all(|p| !p.is_connected);
        if abandoned {
            return true;
        }
        let over_age = now.saturating_sub(room.created_at) > max_age_ms;
        let live_game = room.status == RoomStatus::Playing
            && room.players.iter().any(|p| p.is_connected);
        over_age && !live_game
    }

    async fn remove(&self, room_id: &RoomId) -> Result<(), GameError> {
        tracing::info!(%room_id, "removing inactive room");
        self.store.delete(room_id).await?;
        self.store.delete_chat(room_id).await?;
        Ok(())
    }

    /// Runs the sweep on an interval until the returned task is stopped
    /// or dropped. First run is jittered so a fleet of clients starting
    /// together does not sweep in lockstep.
    pub fn spawn(self, interval: Duration) -> RecurringTask {
        let jitter = interval / 10;
        RecurringTask::spawn(
            "room-cleanup",
            RecurringConfig::every(interval).with_jitter(jitter),
            move || {
                let cleanup = self.clone();
                async move {
                    if let Err(err) = cleanup.cleanup_inactive_rooms().await {
                        tracing::warn!(%err, "cleanup sweep failed");
                    }
                }
            },
        )
    }
}
