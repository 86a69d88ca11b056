//! Clientless multiplayer coordination for the number-guessing game.
//!
//! There is no game server. Every client embeds a [`GameClient`] over a
//! shared versioned record store and applies the same protocol rules:
//! room lifecycle, turn rotation with deadline-driven advancement,
//! guess validation and scoring, matchmaking, chat, and cleanup. All
//! mutations are conditional writes, so concurrent clients acting on
//! the same room serialize instead of clobbering each other.

mod chat;
mod cleanup;
mod client;
mod config;
mod error;
mod guess;
mod keys;
mod matchmaking;
mod rooms;
mod turns;

pub use chat::EventLog;
pub use cleanup::Cleanup;
pub use client::{GameClient, TurnWatcher};
pub use config::ClientConfig;
pub use error::GameError;
pub use guess::GuessEngine;
pub use matchmaking::Matchmaker;
pub use rooms::{CreatedRoom, PlayerProfile, RoomLifecycle, RoomOptions};
pub use turns::TurnCoordinator;
