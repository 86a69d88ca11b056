//! Quick-match: drop a player into an open room of the requested
//! difficulty, or open a fresh one.

use std::sync::Arc;

use magicguess_model::{Difficulty, PlayerId, Room, RoomId, RoomStatus};
use magicguess_store::RecordStore;

use crate::rooms::{PlayerProfile, RoomLifecycle, RoomOptions};
use crate::GameError;

/// Room size for auto-created match rooms.
const QUICK_MATCH_SIZE: usize = 4;

/// Finds or creates rooms for quick-match requests.
#[derive(Clone)]
pub struct Matchmaker {
    store: Arc<dyn RecordStore>,
    rooms: RoomLifecycle,
}

impl Matchmaker {
    pub(crate) fn new(store: Arc<dyn RecordStore>, rooms: RoomLifecycle) -> Self {
        Self { store, rooms }
    }

    /// Seats the player in the oldest public waiting room of the given
    /// difficulty with a free slot, creating one when none exists.
    ///
    /// Candidate rooms can fill or start between the scan and the join;
    /// those are skipped, not surfaced. Returns the room joined.
    pub async fn find_match(
        &self,
        player_id: &PlayerId,
        profile: &PlayerProfile,
        difficulty: Difficulty,
    ) -> Result<RoomId, GameError> {
        let mut candidates: Vec<Room> = self
            .store
            .rooms()
            .await?
            .into_iter()
            .filter(|r| {
                r.status == RoomStatus::Waiting
                    && !r.is_private
                    && r.difficulty == difficulty
                    && !r.is_full()
            })
            .collect();
        candidates.sort_by_key(|r| r.created_at);

        for room in candidates {
            match self.rooms.join_room(&room.id, player_id, profile, None).await {
                Ok(()) => {
                    tracing::info!(room_id = %room.id, player = %profile.name, "matched into room");
                    return Ok(room.id);
                }
                // Lost to a concurrent join or start; try the next room.
                Err(GameError::RoomFull(_))
                | Err(GameError::InvalidState(_))
                | Err(GameError::RoomNotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }

        let created = self
            .rooms
            .create_room(
                player_id,
                profile,
                RoomOptions {
                    name: format!("{difficulty} match"),
                    max_players: QUICK_MATCH_SIZE,
                    difficulty,
                    is_private: false,
                    password: None,
                },
            )
            .await?;
        tracing::info!(room_id = %created.room_id, player = %profile.name, "opened new match room");
        Ok(created.room_id)
    }
}
