//! Guess handling: validation, feedback, scoring, and the follow-up
//! turn rotation.
//!
//! A guess is accepted in one conditional write that checks every
//! precondition against the current record. The turn rotation after a
//! wrong guess is deferred by the feedback delay and guarded by the
//! turn it was observed in, so a timeout racing the delayed advance
//! cannot double-rotate.

use std::sync::Arc;
use std::time::Duration;

use magicguess_model::{now_ms, PlayerId, RoomId, RoomStatus};
use magicguess_round::{feedback, score, Feedback, RoundConfig};
use magicguess_store::{modify_room, Apply, RecordStore};

use crate::chat::EventLog;
use crate::turns::TurnCoordinator;
use crate::GameError;

/// What the accepting write recorded, for the follow-up messages.
#[derive(Debug)]
enum GuessOutcome {
    Accepted {
        feedback: Feedback,
        target: u32,
        guess_time_ms: u64,
        player_name: String,
        turn_start: u64,
    },
    /// The turn's budget was already spent when the guess arrived.
    Expired { turn_start: u64 },
}

/// Accepts guesses for running games.
#[derive(Clone)]
pub struct GuessEngine {
    store: Arc<dyn RecordStore>,
    events: EventLog,
    turns: TurnCoordinator,
    feedback_delay: Duration,
    retries: u32,
}

impl GuessEngine {
    pub(crate) fn new(
        store: Arc<dyn RecordStore>,
        events: EventLog,
        turns: TurnCoordinator,
        feedback_delay: Duration,
        retries: u32,
    ) -> Self {
        Self { store, events, turns, feedback_delay, retries }
    }

    /// Submits a guess for the active player.
    ///
    /// Preconditions, checked in order against the live record: a game
    /// is in progress, the caller is a member, it is their turn, they
    /// have not guessed this turn, the guess is in range, and the turn
    /// clock has not run out. A late guess advances the turn and fails
    /// with [`GameError::TurnExpired`].
    ///
    /// A correct guess scores the player and finishes the game. A wrong
    /// guess records the attempt, posts directional feedback, and
    /// rotates the turn after the feedback delay.
    pub async fn make_guess(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        guess: u32,
    ) -> Result<Feedback, GameError> {
        let outcome = modify_room(&*self.store, room_id, self.retries, |current| {
            let Some(room) = current else {
                return Err(GameError::InvalidState("no game in progress".to_string()));
            };
            if room.status != RoomStatus::Playing {
                return Err(GameError::InvalidState("no game in progress".to_string()));
            }
            let Some(gd) = room.game_data.clone() else {
                return Err(GameError::InvalidState("no game in progress".to_string()));
            };
            let Some(player) = room.player(player_id) else {
                return Err(GameError::NotAMember(player_id.clone()));
            };
            if gd.active_player_id != *player_id {
                return Err(GameError::NotYourTurn(player_id.clone()));
            }
            if player.has_guessed {
                return Err(GameError::AlreadyGuessed(player_id.clone()));
            }

            let config = RoundConfig::multiplayer(room.difficulty);
            config
                .validate_guess(guess, &[])
                .map_err(|v| GameError::InvalidParams(v.to_string()))?;

            let elapsed = now_ms().saturating_sub(gd.turn_start_time);
            if elapsed >= gd.turn_time_limit {
                return Ok(Apply::Skip(GuessOutcome::Expired {
                    turn_start: gd.turn_start_time,
                }));
            }

            let fb = feedback(guess, gd.target_number);
            let mut updated = room.clone();
            let mut player_name = player_id.to_string();
            if let Some(p) = updated.player_mut(player_id) {
                p.attempts += 1;
                p.last_guess = Some(guess);
                p.guess_time = elapsed;
                p.has_guessed = true;
                player_name = p.name.clone();
                if fb == Feedback::Correct {
                    p.score += score(elapsed, p.attempts);
                }
            }
            if fb == Feedback::Correct {
                updated.status = RoomStatus::Finished;
            }

            Ok(Apply::Update(
                updated,
                GuessOutcome::Accepted {
                    feedback: fb,
                    target: gd.target_number,
                    guess_time_ms: elapsed,
                    player_name,
                    turn_start: gd.turn_start_time,
                },
            ))
        })
        .await?;

        match outcome {
            GuessOutcome::Expired { turn_start } => {
                tracing::warn!(%room_id, player = %player_id, "guess after turn deadline");
                let advanced = self.turns.advance_from(room_id, Some(turn_start)).await?;
                self.turns.announce(room_id, &advanced).await?;
                Err(GameError::TurnExpired)
            }
            GuessOutcome::Accepted {
                feedback: Feedback::Correct,
                target,
                guess_time_ms,
                player_name,
                ..
            } => {
                let secs = guess_time_ms as f64 / 1000.0;
                tracing::info!(%room_id, player = %player_name, target, "correct guess, game over");
                self.events
                    .game(
                        room_id,
                        &format!("{player_name} found the number {target} in {secs:.2}s!"),
                    )
                    .await?;
                Ok(Feedback::Correct)
            }
            GuessOutcome::Accepted { feedback: fb, player_name, turn_start, .. } => {
                let hint = match fb {
                    Feedback::Higher => "higher",
                    _ => "lower",
                };
                self.events
                    .game(room_id, &format!("{player_name}: {guess}, aim {hint}"))
                    .await?;
                self.schedule_advance(room_id, turn_start).await?;
                Ok(fb)
            }
        }
    }

    /// Rotates the turn after the feedback delay, guarded by the turn
    /// the guess landed in. With a zero delay the rotation is inline,
    /// which keeps tests deterministic.
    async fn schedule_advance(
        &self,
        room_id: &RoomId,
        observed_turn_start: u64,
    ) -> Result<(), GameError> {
        if self.feedback_delay.is_zero() {
            let outcome = self
                .turns
                .advance_from(room_id, Some(observed_turn_start))
                .await?;
            return self.turns.announce(room_id, &outcome).await;
        }

        let turns = self.turns.clone();
        let room_id = room_id.clone();
        let delay = self.feedback_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match turns.advance_from(&room_id, Some(observed_turn_start)).await {
                Ok(outcome) => {
                    if let Err(err) = turns.announce(&room_id, &outcome).await {
                        tracing::warn!(%room_id, %err, "turn announcement failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(%room_id, %err, "delayed turn advance failed");
                }
            }
        });
        Ok(())
    }
}
