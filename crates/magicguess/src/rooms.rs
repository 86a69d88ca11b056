//! Room lifecycle: creation, membership, readiness, and game start.
//!
//! Every mutation is a read-modify-write against the versioned store, so
//! two clients acting on the same room at once serialize cleanly: the
//! loser of the write race re-reads and re-validates against the record
//! the winner produced.

use std::collections::HashSet;
use std::sync::Arc;

use magicguess_model::{
    now_ms, Difficulty, GameData, Player, PlayerId, Room, RoomId, RoomStatus,
};
use magicguess_round::RoundConfig;
use magicguess_store::{modify_room, Apply, RecordStore};
use rand::Rng;

use crate::chat::EventLog;
use crate::keys::push_key;
use crate::GameError;

/// Length of generated room ids.
const ROOM_KEY_LEN: usize = 20;

/// Redraw budget for a colliding short code. The code space (9000 codes)
/// dwarfs any realistic lobby count, so exhaustion is not handled beyond
/// accepting the final draw.
const SHORT_CODE_ATTEMPTS: u32 = 16;

/// Bounds on the configurable room size.
const MIN_PLAYERS: usize = 2;
const MAX_PLAYERS_CAP: usize = 8;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The public identity a player carries into a room.
#[derive(Debug, Clone)]
pub struct PlayerProfile {
    pub name: String,
    pub avatar: String,
    pub level: u32,
}

impl PlayerProfile {
    pub fn new(name: &str, avatar: &str, level: u32) -> Self {
        Self {
            name: name.to_string(),
            avatar: avatar.to_string(),
            level,
        }
    }
}

/// Creation parameters for a new room.
#[derive(Debug, Clone)]
pub struct RoomOptions {
    pub name: String,
    pub max_players: usize,
    pub difficulty: Difficulty,
    pub is_private: bool,
    /// Only consulted when `is_private` is set.
    pub password: Option<String>,
}

impl RoomOptions {
    /// A public room with the given name and difficulty, default size.
    pub fn public(name: &str, difficulty: Difficulty) -> Self {
        Self {
            name: name.to_string(),
            max_players: 4,
            difficulty,
            is_private: false,
            password: None,
        }
    }
}

/// What `create_room` hands back for the UI to display and share.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub short_code: String,
}

/// How a departure resolved, for the post-write event messages.
#[derive(Debug)]
enum LeaveOutcome {
    /// Removed from a waiting room; the room survives.
    Removed { name: String },
    /// The room emptied out and was dropped.
    Deleted,
    /// Marked disconnected mid-game; the turn may have moved.
    Disconnected { name: String, handoff: Option<String> },
    /// The player was not in the room, or the room was already gone.
    Skipped,
}

// ---------------------------------------------------------------------------
// RoomLifecycle
// ---------------------------------------------------------------------------

/// Creates rooms and manages membership through to game start.
#[derive(Clone)]
pub struct RoomLifecycle {
    store: Arc<dyn RecordStore>,
    events: EventLog,
    retries: u32,
}

impl RoomLifecycle {
    pub(crate) fn new(
        store: Arc<dyn RecordStore>,
        events: EventLog,
        retries: u32,
    ) -> Self {
        Self { store, events, retries }
    }

    /// Creates a room with the caller as its host.
    pub async fn create_room(
        &self,
        host_id: &PlayerId,
        profile: &PlayerProfile,
        options: RoomOptions,
    ) -> Result<CreatedRoom, GameError> {
        let name = options.name.trim();
        if name.is_empty() {
            return Err(GameError::InvalidParams(
                "room name must not be empty".to_string(),
            ));
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS_CAP).contains(&options.max_players) {
            return Err(GameError::InvalidParams(format!(
                "max players must be between {MIN_PLAYERS} and {MAX_PLAYERS_CAP}"
            )));
        }

        let short_code = self.draw_short_code().await?;
        let room_id = RoomId::from(push_key(ROOM_KEY_LEN).as_str());

        let mut host = Player::new(host_id.clone(), &profile.name, &profile.avatar, profile.level);
        host.is_host = true;
        host.is_ready = true;

        let room = Room {
            id: room_id.clone(),
            short_code: short_code.clone(),
            name: name.to_string(),
            host_id: host_id.clone(),
            host_name: profile.name.clone(),
            players: vec![host],
            max_players: options.max_players,
            difficulty: options.difficulty,
            status: RoomStatus::Waiting,
            game_data: None,
            created_at: now_ms(),
            is_private: options.is_private,
            password: if options.is_private { options.password } else { None },
        };
        self.store.insert(room).await?;

        tracing::info!(%room_id, short_code, host = %profile.name, "room created");
        Ok(CreatedRoom { room_id, short_code })
    }

    /// Adds the player to the room, or reconnects them if they already
    /// have a seat.
    ///
    /// Checks run in a fixed order so callers get a stable error:
    /// existence, then password, then reconnection, then capacity, then
    /// joinable state.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        profile: &PlayerProfile,
        password: Option<&str>,
    ) -> Result<(), GameError> {
        let joined_name = modify_room(&*self.store, room_id, self.retries, |current| {
            let Some(room) = current else {
                return Err(GameError::RoomNotFound(room_id.clone()));
            };
            if room.is_private && room.password.as_deref() != password {
                return Err(GameError::WrongPassword(room_id.clone()));
            }

            let mut updated = room.clone();
            if let Some(p) = updated.player_mut(player_id) {
                // Reconnection restores the existing seat, game or not.
                p.is_connected = true;
                return Ok(Apply::Update(updated, None));
            }

            if room.is_full() {
                return Err(GameError::RoomFull(room_id.clone()));
            }
            if !room.status.is_joinable() {
                return Err(GameError::InvalidState(format!(
                    "room is {}, not accepting players",
                    room.status
                )));
            }

            updated.players.push(Player::new(
                player_id.clone(),
                &profile.name,
                &profile.avatar,
                profile.level,
            ));
            Ok(Apply::Update(updated, Some(profile.name.clone())))
        })
        .await?;

        if let Some(name) = joined_name {
            tracing::info!(%room_id, player = %name, "player joined");
            self.events
                .system(room_id, &format!("{name} joined the room"))
                .await?;
        } else {
            tracing::info!(%room_id, player = %player_id, "player reconnected");
        }
        Ok(())
    }

    /// Resolves a 4-digit short code to the waiting room that holds it.
    pub async fn find_room_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Room, GameError> {
        let rooms = self.store.rooms().await?;
        rooms
            .into_iter()
            .find(|r| r.status == RoomStatus::Waiting && r.short_code == short_code)
            .ok_or_else(|| GameError::CodeNotFound(short_code.to_string()))
    }

    /// Joins via short code, the code-entry path of the lobby UI.
    pub async fn join_room_by_code(
        &self,
        short_code: &str,
        player_id: &PlayerId,
        profile: &PlayerProfile,
        password: Option<&str>,
    ) -> Result<RoomId, GameError> {
        let room = self.find_room_by_short_code(short_code).await?;
        self.join_room(&room.id, player_id, profile, password).await?;
        Ok(room.id)
    }

    /// Removes the player from a waiting room, or marks them
    /// disconnected in a running game.
    ///
    /// Mid-game, the disconnect and any required host transfer and turn
    /// handoff land in one write, so no observer sees a playing room
    /// whose active player is disconnected. A room with no connected
    /// players left is deleted along with its chat log.
    pub async fn leave_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<(), GameError> {
        let outcome = modify_room::<LeaveOutcome, GameError, _>(
            &*self.store,
            room_id,
            self.retries,
            |current| {
                let Some(room) = current else {
                    return Ok(Apply::Skip(LeaveOutcome::Skipped));
                };
                let Some(player) = room.player(player_id) else {
                    return Ok(Apply::Skip(LeaveOutcome::Skipped));
                };
                let name = player.name.clone();
                let was_host = player.is_host;
                let mut updated = room.clone();

                if room.status != RoomStatus::Playing {
                    updated.players.retain(|p| &p.id != player_id);
                    if updated.players.is_empty() {
                        return Ok(Apply::Remove(LeaveOutcome::Deleted));
                    }
                    if was_host {
                        let next_host = updated.players[0].id.clone();
                        updated.promote_host(&next_host);
                    }
                    return Ok(Apply::Update(updated, LeaveOutcome::Removed { name }));
                }

                // Mid-game: keep the seat for reconnection, drop the link.
                if let Some(p) = updated.player_mut(player_id) {
                    p.is_connected = false;
                }

                let remaining: Vec<PlayerId> = updated
                    .connected_players()
                    .iter()
                    .map(|p| p.id.clone())
                    .collect();
                if remaining.is_empty() {
                    return Ok(Apply::Remove(LeaveOutcome::Deleted));
                }
                if was_host {
                    updated.promote_host(&remaining[0]);
                }

                let was_active = updated
                    .game_data
                    .as_ref()
                    .is_some_and(|gd| &gd.active_player_id == player_id);
                let mut handoff = None;
                if was_active {
                    // Hand the turn on directly rather than finishing, even
                    // down to one player: the survivor may still win, and a
                    // reconnect restores rotation.
                    let next_id = remaining[0].clone();
                    if let Some(p) = updated.player_mut(&next_id) {
                        p.has_guessed = false;
                        p.last_guess = None;
                        handoff = Some(p.name.clone());
                    }
                    if let Some(gd) = updated.game_data.as_mut() {
                        gd.active_player_id = next_id;
                        gd.turn_start_time = now_ms().max(gd.turn_start_time + 1);
                    }
                }

                Ok(Apply::Update(updated, LeaveOutcome::Disconnected { name, handoff }))
            },
        )
        .await?;

        match outcome {
            LeaveOutcome::Removed { name } => {
                tracing::info!(%room_id, player = %name, "player left");
                self.events
                    .system(room_id, &format!("{name} left the room"))
                    .await
            }
            LeaveOutcome::Deleted => {
                tracing::info!(%room_id, "room emptied, deleting");
                self.store.delete_chat(room_id).await?;
                Ok(())
            }
            LeaveOutcome::Disconnected { name, handoff, .. } => {
                tracing::info!(%room_id, player = %name, "player disconnected");
                self.events
                    .system(room_id, &format!("{name} disconnected"))
                    .await?;
                if let Some(next) = handoff {
                    self.events
                        .game(room_id, &format!("It is {next}'s turn"))
                        .await?;
                }
                Ok(())
            }
            LeaveOutcome::Skipped => Ok(()),
        }
    }

    /// Flips the caller's ready flag. Hosts are always ready; the flag
    /// is not togglable for them. No-op outside `Waiting`.
    pub async fn toggle_ready(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<(), GameError> {
        modify_room(&*self.store, room_id, self.retries, |current| {
            let Some(room) = current else {
                return Ok(Apply::Skip(()));
            };
            if room.status != RoomStatus::Waiting {
                return Ok(Apply::Skip(()));
            }
            let mut updated = room.clone();
            match updated.player_mut(player_id) {
                Some(p) if !p.is_host => {
                    p.is_ready = !p.is_ready;
                    Ok(Apply::Update(updated, ()))
                }
                _ => Ok(Apply::Skip(())),
            }
        })
        .await
    }

    /// Starts the game. Host only; requires at least two players, all of
    /// them ready.
    ///
    /// The requester-is-host guard lives inside the conditional write
    /// with the other rules, so it is validated against the record the
    /// write commits: a caller acting on a snapshot from before a host
    /// transfer loses the version check and is re-judged on the retry.
    pub async fn start_game(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
    ) -> Result<(), GameError> {
        let (min, max, first) = modify_room(&*self.store, room_id, self.retries, |current| {
            let Some(room) = current else {
                return Err(GameError::RoomNotFound(room_id.clone()));
            };
            if &room.host_id != caller {
                return Err(GameError::NotHost(caller.clone()));
            }
            if room.status != RoomStatus::Waiting {
                return Err(GameError::InvalidState(format!(
                    "cannot start a {} room",
                    room.status
                )));
            }
            if room.players.len() < MIN_PLAYERS {
                return Err(GameError::InvalidState(
                    "need at least 2 players to start".to_string(),
                ));
            }
            if room.players.iter().any(|p| !p.is_ready && !p.is_host) {
                return Err(GameError::InvalidState(
                    "all players must be ready".to_string(),
                ));
            }

            let config = RoundConfig::multiplayer(room.difficulty);
            let target = config
                .draw_target(&mut rand::rng())
                .ok_or_else(|| GameError::InvalidParams("empty guess range".to_string()))?;

            let mut updated = room.clone();
            for p in &mut updated.players {
                p.reset_for_round();
            }
            let now = now_ms();
            updated.status = RoomStatus::Playing;
            updated.game_data = Some(GameData {
                target_number: target,
                start_time: now,
                // The host moves first: deterministic and always valid,
                // since the host is necessarily connected at start.
                active_player_id: updated.host_id.clone(),
                turn_start_time: now,
                turn_time_limit: config.time_limit_ms,
                current_round: 1,
                max_rounds: 1,
            });

            let first = updated.host_name.clone();
            Ok(Apply::Update(
                updated,
                (*config.range.start(), *config.range.end(), first),
            ))
        })
        .await?;

        tracing::info!(%room_id, min, max, "game started");
        self.events
            .game(
                room_id,
                &format!("Game on! Find the number between {min} and {max}"),
            )
            .await?;
        self.events
            .game(room_id, &format!("It is {first}'s turn"))
            .await
    }

    /// Public waiting rooms, newest first, for the lobby list.
    pub async fn get_public_rooms(&self) -> Result<Vec<Room>, GameError> {
        let mut rooms: Vec<Room> = self
            .store
            .rooms()
            .await?
            .into_iter()
            .filter(|r| r.status == RoomStatus::Waiting && !r.is_private)
            .collect();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }

    /// Draws a 4-digit short code not held by any current waiting room.
    async fn draw_short_code(&self) -> Result<String, GameError> {
        let rooms = self.store.rooms().await?;
        let taken: HashSet<String> = rooms
            .into_iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.short_code)
            .collect();

        let mut rng = rand::rng();
        let mut code = String::new();
        for _ in 0..SHORT_CODE_ATTEMPTS {
            code = rng.random_range(1000..10_000u32).to_string();
            if !taken.contains(&code) {
                return Ok(code);
            }
        }
        tracing::warn!(code, "short code redraws exhausted, accepting collision");
        Ok(code)
    }
}
