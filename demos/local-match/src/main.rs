//! A scripted two-player match over the in-memory store.
//!
//! Two clients share one `MemoryStore` the way real clients share a
//! backing store, and play a full game with a simple bisection strategy.
//! Run with `RUST_LOG=debug` to watch the coordination traffic.

use std::sync::Arc;
use std::time::Duration;

use magicguess::{ClientConfig, GameClient, GameError, PlayerProfile, RoomOptions};
use magicguess_model::{Difficulty, PlayerId, RoomStatus};
use magicguess_round::Feedback;
use magicguess_store::MemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), GameError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig {
        feedback_delay: Duration::from_millis(200),
        ..ClientConfig::default()
    };

    // Two independent clients, one shared store.
    let alice_client = GameClient::new(store.clone(), config.clone());
    let bob_client = GameClient::new(store.clone(), config);

    let alice = PlayerId::from("alice");
    let bob = PlayerId::from("bob");

    let created = alice_client
        .create_room(
            &alice,
            &PlayerProfile::new("Alice", "wizard", 5),
            RoomOptions::public("demo duel", Difficulty::Medium),
        )
        .await?;
    let room_id = created.room_id;
    println!("room {} open, code {}", room_id, created.short_code);

    bob_client
        .join_room(&room_id, &bob, &PlayerProfile::new("Bob", "knight", 3), None)
        .await?;
    bob_client.toggle_ready(&room_id, &bob).await?;
    alice_client.start_game(&room_id, &alice).await?;

    // Each client watches the room for expired turns.
    let alice_watch = alice_client.watch_turns(&room_id).await?;
    let bob_watch = bob_client.watch_turns(&room_id).await?;

    let mut chat = alice_client.subscribe_chat(&room_id).await?;
    let printer = tokio::spawn(async move {
        while let Ok(msg) = chat.recv().await {
            println!("[{}] {}", msg.player_name, msg.message);
        }
    });

    // Both players bisect over the shared feedback.
    let (mut lo, mut hi) = (1u32, 100u32);
    'game: loop {
        let Some(room) = alice_client.room(&room_id).await? else {
            break;
        };
        if room.status == RoomStatus::Finished {
            break;
        }
        let Some(gd) = &room.game_data else { break };
        let active = gd.active_player_id.clone();

        let guess = lo + (hi - lo) / 2;
        let client = if active == alice { &alice_client } else { &bob_client };
        match client.make_guess(&room_id, &active, guess).await {
            Ok(Feedback::Higher) => lo = guess + 1,
            Ok(Feedback::Lower) => hi = guess.saturating_sub(1),
            Ok(Feedback::Correct) => break 'game,
            Err(GameError::NotYourTurn(_)) | Err(GameError::TurnExpired) => {}
            Err(err) => return Err(err),
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    if let Some(room) = alice_client.room(&room_id).await? {
        for p in &room.players {
            println!("{}: {} points in {} attempts", p.name, p.score, p.attempts);
        }
    }

    alice_watch.stop();
    bob_watch.stop();
    printer.abort();
    Ok(())
}
