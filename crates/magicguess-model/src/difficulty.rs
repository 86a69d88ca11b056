//! Difficulty levels and the numeric ranges they map to.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Fixed per-turn time budget for turn-based multiplayer play, in
/// milliseconds. Constant across difficulties — difficulty scales the
/// guess range, not the turn clock.
pub const TURN_TIME_LIMIT_MS: u64 = 15_000;

/// Game difficulty. Each level maps to a guess range and, for the
/// continuous (solo) turn model, a per-game time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The inclusive range the target number is drawn from.
    pub fn range(self) -> RangeInclusive<u32> {
        match self {
            Self::Easy => 1..=50,
            Self::Medium => 1..=100,
            Self::Hard => 1..=500,
        }
    }

    /// Time budget for one continuous (solo) game, in milliseconds.
    pub fn solo_time_limit_ms(self) -> u64 {
        match self {
            Self::Easy => 15_000,
            Self::Medium => 25_000,
            Self::Hard => 50_000,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_widen_with_difficulty() {
        assert_eq!(Difficulty::Easy.range(), 1..=50);
        assert_eq!(Difficulty::Medium.range(), 1..=100);
        assert_eq!(Difficulty::Hard.range(), 1..=500);
    }

    #[test]
    fn test_turn_clock_reachable_from_crate_root() {
        assert_eq!(crate::TURN_TIME_LIMIT_MS, 15_000);
    }

    #[test]
    fn test_difficulty_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Medium).unwrap(),
            "\"medium\""
        );
    }
}
