//! The turn coordinator: who holds the turn, and when it moves on.
//!
//! Turn ownership is transient and protocol-defined: whichever client's
//! action is valid under the preconditions may write the advance. Two
//! clients can race here (a timeout firing on one while the active
//! player's guess lands on another), so every advance goes through the
//! store's conditional-update helper and is additionally guarded by the
//! turn it was observed against: if the record's `turn_start_time` no
//! longer matches, someone else already moved the turn and the advance
//! becomes a no-op.

use std::sync::Arc;

use magicguess_model::{now_ms, PlayerId, RoomId, RoomStatus};
use magicguess_store::{modify_room, Apply, RecordStore};

use crate::chat::EventLog;
use crate::GameError;

/// What an advance attempt actually did.
#[derive(Debug)]
pub(crate) enum AdvanceOutcome {
    /// Turn moved to the named player.
    Advanced { next_name: String },
    /// Fewer than 2 connected players remained; the game is over.
    Finished { winner: Option<(String, u32)> },
    /// The observed turn was stale or the room is no longer playing.
    Skipped,
}

/// Owns the active-player pointer and the advance protocol.
#[derive(Clone)]
pub struct TurnCoordinator {
    store: Arc<dyn RecordStore>,
    events: EventLog,
    retries: u32,
}

impl TurnCoordinator {
    pub(crate) fn new(
        store: Arc<dyn RecordStore>,
        events: EventLog,
        retries: u32,
    ) -> Self {
        Self { store, events, retries }
    }

    /// Moves the turn to the next connected player and announces it.
    pub async fn advance_turn(&self, room_id: &RoomId) -> Result<(), GameError> {
        let outcome = self.advance_from(room_id, None).await?;
        self.announce(room_id, &outcome).await
    }

    /// Fires when a locally scheduled turn deadline expires.
    ///
    /// Re-checks elapsed time against the *current* record before doing
    /// anything, so stale timers from any number of clients are safe:
    /// at most one observes an expired turn matching the record it read,
    /// and the rest no-op on the changed `turn_start_time`.
    pub async fn handle_turn_timeout(&self, room_id: &RoomId) -> Result<(), GameError> {
        let Some(versioned) = self.store.get(room_id).await? else {
            return Ok(());
        };
        let room = versioned.room;
        if room.status != RoomStatus::Playing {
            return Ok(());
        }
        let Some(gd) = &room.game_data else {
            return Ok(());
        };

        let elapsed = now_ms().saturating_sub(gd.turn_start_time);
        if elapsed < gd.turn_time_limit {
            return Ok(());
        }

        let expired_name = room
            .player(&gd.active_player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| gd.active_player_id.to_string());

        let outcome = self.advance_from(room_id, Some(gd.turn_start_time)).await?;
        if !matches!(outcome, AdvanceOutcome::Skipped) {
            tracing::info!(%room_id, player = %expired_name, "turn timed out");
            self.events
                .game(room_id, &format!("Time is up for {expired_name}"))
                .await?;
        }
        self.announce(room_id, &outcome).await
    }

    /// The core advance: selects the next connected player cyclically in
    /// join order, or finishes the room when fewer than 2 remain.
    ///
    /// `observed_turn_start` is the `turn_start_time` the caller based
    /// its decision on; a mismatch against the current record skips the
    /// advance entirely.
    pub(crate) async fn advance_from(
        &self,
        room_id: &RoomId,
        observed_turn_start: Option<u64>,
    ) -> Result<AdvanceOutcome, GameError> {
        modify_room(&*self.store, room_id, self.retries, |current| {
            let Some(room) = current else {
                return Ok(Apply::Skip(AdvanceOutcome::Skipped));
            };
            if room.status != RoomStatus::Playing {
                return Ok(Apply::Skip(AdvanceOutcome::Skipped));
            }
            let Some(gd) = &room.game_data else {
                return Ok(Apply::Skip(AdvanceOutcome::Skipped));
            };
            if let Some(observed) = observed_turn_start {
                if gd.turn_start_time != observed {
                    return Ok(Apply::Skip(AdvanceOutcome::Skipped));
                }
            }

            let connected: Vec<PlayerId> = room
                .connected_players()
                .iter()
                .map(|p| p.id.clone())
                .collect();

            let mut updated = room.clone();
            if connected.len() < 2 {
                updated.status = RoomStatus::Finished;
                let winner = updated
                    .players
                    .iter()
                    .max_by_key(|p| p.score)
                    .map(|p| (p.name.clone(), p.score));
                return Ok(Apply::Update(updated, AdvanceOutcome::Finished { winner }));
            }

            // A disconnected active player has no index among the
            // connected list; rotation then restarts at the front.
            let next_id = connected
                .iter()
                .position(|id| id == &gd.active_player_id)
                .map(|i| connected[(i + 1) % connected.len()].clone())
                .unwrap_or_else(|| connected[0].clone());

            // Strictly later than the previous turn, even under clock
            // stall, so turn transitions stay totally ordered.
            let new_start = now_ms().max(gd.turn_start_time + 1);

            let mut next_name = next_id.to_string();
            if let Some(p) = updated.player_mut(&next_id) {
                p.has_guessed = false;
                p.last_guess = None;
                next_name = p.name.clone();
            }
            if let Some(gd) = updated.game_data.as_mut() {
                gd.active_player_id = next_id;
                gd.turn_start_time = new_start;
            }

            Ok(Apply::Update(updated, AdvanceOutcome::Advanced { next_name }))
        })
        .await
    }

    /// Emits the chat event matching an advance outcome.
    pub(crate) async fn announce(
        &self,
        room_id: &RoomId,
        outcome: &AdvanceOutcome,
    ) -> Result<(), GameError> {
        match outcome {
            AdvanceOutcome::Advanced { next_name } => {
                self.events
                    .game(room_id, &format!("It is {next_name}'s turn"))
                    .await
            }
            AdvanceOutcome::Finished { winner: Some((name, score)) } => {
                tracing::info!(%room_id, winner = %name, score, "game over");
                self.events
                    .game(
                        room_id,
                        &format!("Game over! {name} wins with {score} points"),
                    )
                    .await
            }
            AdvanceOutcome::Finished { winner: None } => {
                self.events.game(room_id, "Game over!").await
            }
            AdvanceOutcome::Skipped => Ok(()),
        }
    }
}
