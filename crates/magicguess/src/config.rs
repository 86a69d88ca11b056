//! Client-side coordination settings.

use std::time::Duration;

/// Tunables for a [`GameClient`](crate::GameClient).
///
/// Defaults match the reference behavior; tests shrink the delays.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Pause between wrong-guess feedback and the turn rotation, so the
    /// feedback stays visible. Zero advances immediately.
    pub feedback_delay: Duration,

    /// How often the cleanup sweep runs.
    pub cleanup_interval: Duration,

    /// Rooms older than this are swept unless a game with connected
    /// players is still running in them.
    pub room_max_age: Duration,

    /// Extra attempts for an optimistic room update that keeps losing
    /// the write race.
    pub max_write_retries: u32,

    /// How many trailing chat messages the client keeps in view.
    pub chat_tail_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            feedback_delay: Duration::from_secs(1),
            cleanup_interval: Duration::from_secs(5 * 60),
            room_max_age: Duration::from_secs(30 * 60),
            max_write_retries: 3,
            chat_tail_len: 50,
        }
    }
}
