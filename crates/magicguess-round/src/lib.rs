//! The guessing-round engine: pure rules, no I/O.
//!
//! One engine serves every game mode. A [`RoundConfig`] parameterizes the
//! guess range, the time budget, the turn model (one player guessing
//! continuously, or several players taking bounded turns), and any
//! special rules constraining valid numbers. The coordination layer feeds
//! it timestamps and guesses; it answers with feedback and scores.

mod rules;
mod score;

pub use rules::{EvenOnly, MultipleOf, NoRepeats, OddOnly, Rule, RuleSet, RuleViolation};
pub use score::score;

use std::ops::RangeInclusive;

use magicguess_model::{Difficulty, TURN_TIME_LIMIT_MS};
use rand::Rng;

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// The answer a guess receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// The target is higher than the guess.
    Higher,
    /// The target is lower than the guess.
    Lower,
    Correct,
}

/// Compares a guess to the target.
pub fn feedback(guess: u32, target: u32) -> Feedback {
    use std::cmp::Ordering;
    match guess.cmp(&target) {
        Ordering::Less => Feedback::Higher,
        Ordering::Greater => Feedback::Lower,
        Ordering::Equal => Feedback::Correct,
    }
}

// ---------------------------------------------------------------------------
// RoundConfig
// ---------------------------------------------------------------------------

/// How turns are allocated within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnModel {
    /// One player guesses repeatedly against a per-game clock (solo and
    /// campaign play).
    Continuous,
    /// Players rotate through fixed-length turns, one guess per turn.
    TurnBased,
}

/// Parameters for one guessing round.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// The inclusive range the target is drawn from.
    pub range: RangeInclusive<u32>,
    /// Time budget in ms: per turn for [`TurnModel::TurnBased`], per game
    /// for [`TurnModel::Continuous`].
    pub time_limit_ms: u64,
    pub turn_model: TurnModel,
    /// Special rules the target and every guess must satisfy.
    pub rules: RuleSet,
}

impl RoundConfig {
    /// The standard multiplayer round for a difficulty: turn-based with
    /// the fixed 15-second turn clock and no special rules.
    pub fn multiplayer(difficulty: Difficulty) -> Self {
        Self {
            range: difficulty.range(),
            time_limit_ms: TURN_TIME_LIMIT_MS,
            turn_model: TurnModel::TurnBased,
            rules: RuleSet::none(),
        }
    }

    /// A continuous solo round for a difficulty.
    pub fn solo(difficulty: Difficulty) -> Self {
        Self {
            range: difficulty.range(),
            time_limit_ms: difficulty.solo_time_limit_ms(),
            turn_model: TurnModel::Continuous,
            rules: RuleSet::none(),
        }
    }

    /// Adds special rules to the round (campaign-style constraints).
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Draws a target satisfying the round's rules, uniformly among the
    /// valid candidates of the range.
    ///
    /// Returns `None` when the rules leave no valid candidate — a
    /// misconfigured round, surfaced to the caller rather than looping.
    pub fn draw_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<u32> {
        let candidates: Vec<u32> = self
            .range
            .clone()
            .filter(|n| self.rules.check(*n, &[]).is_ok())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..candidates.len());
        Some(candidates[idx])
    }

    /// Validates a candidate guess against the round's rules, given the
    /// guesses already made this round.
    pub fn validate_guess(
        &self,
        candidate: u32,
        history: &[u32],
    ) -> Result<(), RuleViolation> {
        if !self.range.contains(&candidate) {
            return Err(RuleViolation::OutOfRange {
                candidate,
                min: *self.range.start(),
                max: *self.range.end(),
            });
        }
        self.rules.check(candidate, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_feedback_directions() {
        assert_eq!(feedback(10, 27), Feedback::Higher);
        assert_eq!(feedback(40, 27), Feedback::Lower);
        assert_eq!(feedback(27, 27), Feedback::Correct);
    }

    #[test]
    fn test_multiplayer_config_uses_fixed_turn_clock() {
        let cfg = RoundConfig::multiplayer(Difficulty::Hard);
        assert_eq!(cfg.range, 1..=500);
        assert_eq!(cfg.time_limit_ms, 15_000);
        assert_eq!(cfg.turn_model, TurnModel::TurnBased);
    }

    #[test]
    fn test_solo_config_scales_time_with_difficulty() {
        assert_eq!(RoundConfig::solo(Difficulty::Easy).time_limit_ms, 15_000);
        assert_eq!(RoundConfig::solo(Difficulty::Hard).time_limit_ms, 50_000);
    }

    #[test]
    fn test_draw_target_stays_in_range() {
        let cfg = RoundConfig::multiplayer(Difficulty::Easy);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let target = cfg.draw_target(&mut rng).unwrap();
            assert!((1..=50).contains(&target));
        }
    }

    #[test]
    fn test_draw_target_respects_rules() {
        let cfg = RoundConfig::multiplayer(Difficulty::Easy)
            .with_rules(RuleSet::new().and(EvenOnly).and(MultipleOf(5)));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let target = cfg.draw_target(&mut rng).unwrap();
            assert_eq!(target % 10, 0, "target {target} must be an even multiple of 5");
        }
    }

    #[test]
    fn test_draw_target_with_unsatisfiable_rules() {
        let cfg = RoundConfig::multiplayer(Difficulty::Easy)
            .with_rules(RuleSet::new().and(EvenOnly).and(OddOnly));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(cfg.draw_target(&mut rng), None);
    }

    #[test]
    fn test_validate_guess_rejects_out_of_range() {
        let cfg = RoundConfig::multiplayer(Difficulty::Easy);
        assert!(matches!(
            cfg.validate_guess(51, &[]),
            Err(RuleViolation::OutOfRange { candidate: 51, min: 1, max: 50 })
        ));
        assert!(cfg.validate_guess(50, &[]).is_ok());
    }
}
