//! Special-rule predicates and their conjunction.
//!
//! Campaign levels constrain which numbers are valid (only even numbers,
//! multiples of five, no repeated attempts). Instead of re-validating
//! per mode, each constraint is a [`Rule`] and a round carries one
//! [`RuleSet`] — the conjunction of its rules — applied both when the
//! target is drawn and when a guess is submitted.

use std::fmt;

/// Why a candidate number was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("{candidate} is outside the range {min}–{max}")]
    OutOfRange { candidate: u32, min: u32, max: u32 },

    #[error("{0} is not an even number")]
    NotEven(u32),

    #[error("{0} is not an odd number")]
    NotOdd(u32),

    #[error("{candidate} is not a multiple of {of}")]
    NotMultiple { candidate: u32, of: u32 },

    #[error("{0} was already tried this round")]
    Repeated(u32),
}

/// A predicate over a candidate number and the guesses already made.
pub trait Rule: Send + Sync {
    /// Accepts the candidate or explains the rejection.
    fn check(&self, candidate: u32, history: &[u32]) -> Result<(), RuleViolation>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Only even numbers are valid.
pub struct EvenOnly;

impl Rule for EvenOnly {
    fn check(&self, candidate: u32, _history: &[u32]) -> Result<(), RuleViolation> {
        if candidate % 2 == 0 {
            Ok(())
        } else {
            Err(RuleViolation::NotEven(candidate))
        }
    }

    fn name(&self) -> &'static str {
        "even-only"
    }
}

/// Only odd numbers are valid.
pub struct OddOnly;

impl Rule for OddOnly {
    fn check(&self, candidate: u32, _history: &[u32]) -> Result<(), RuleViolation> {
        if candidate % 2 == 1 {
            Ok(())
        } else {
            Err(RuleViolation::NotOdd(candidate))
        }
    }

    fn name(&self) -> &'static str {
        "odd-only"
    }
}

/// Only multiples of the given number are valid.
pub struct MultipleOf(pub u32);

impl Rule for MultipleOf {
    fn check(&self, candidate: u32, _history: &[u32]) -> Result<(), RuleViolation> {
        if self.0 != 0 && candidate % self.0 == 0 {
            Ok(())
        } else {
            Err(RuleViolation::NotMultiple { candidate, of: self.0 })
        }
    }

    fn name(&self) -> &'static str {
        "multiple-of"
    }
}

/// Each number may only be tried once per round.
pub struct NoRepeats;

impl Rule for NoRepeats {
    fn check(&self, candidate: u32, history: &[u32]) -> Result<(), RuleViolation> {
        if history.contains(&candidate) {
            Err(RuleViolation::Repeated(candidate))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "no-repeats"
    }
}

/// The conjunction of zero or more rules. Empty means everything passes.
///
/// Rules are stateless, so sets share them through `Arc` and clone
/// cheaply along with the round config that carries them.
#[derive(Default, Clone)]
pub struct RuleSet {
    rules: Vec<std::sync::Arc<dyn Rule>>,
}

impl RuleSet {
    /// An empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for [`RuleSet::new`] reading better at call sites.
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a rule to the conjunction.
    pub fn and(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(std::sync::Arc::new(rule));
        self
    }

    /// Checks every rule in insertion order; the first violation wins.
    pub fn check(&self, candidate: u32, history: &[u32]) -> Result<(), RuleViolation> {
        for rule in &self.rules {
            rule.check(candidate, history)?;
        }
        Ok(())
    }

    /// Returns `true` when no rules are attached.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_tuple("RuleSet").field(&names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_only() {
        assert!(EvenOnly.check(4, &[]).is_ok());
        assert_eq!(EvenOnly.check(5, &[]), Err(RuleViolation::NotEven(5)));
    }

    #[test]
    fn test_odd_only() {
        assert!(OddOnly.check(5, &[]).is_ok());
        assert_eq!(OddOnly.check(4, &[]), Err(RuleViolation::NotOdd(4)));
    }

    #[test]
    fn test_multiple_of() {
        assert!(MultipleOf(5).check(20, &[]).is_ok());
        assert_eq!(
            MultipleOf(5).check(21, &[]),
            Err(RuleViolation::NotMultiple { candidate: 21, of: 5 })
        );
        // A zero divisor rejects everything instead of panicking.
        assert!(MultipleOf(0).check(10, &[]).is_err());
    }

    #[test]
    fn test_no_repeats_consults_history() {
        assert!(NoRepeats.check(7, &[3, 5]).is_ok());
        assert_eq!(
            NoRepeats.check(5, &[3, 5]),
            Err(RuleViolation::Repeated(5))
        );
    }

    #[test]
    fn test_conjunction_short_circuits_in_order() {
        let rules = RuleSet::new().and(EvenOnly).and(MultipleOf(5));
        assert!(rules.check(10, &[]).is_ok());
        // Fails the first rule before the second is consulted.
        assert_eq!(rules.check(15, &[]), Err(RuleViolation::NotEven(15)));
        assert_eq!(
            rules.check(4, &[]),
            Err(RuleViolation::NotMultiple { candidate: 4, of: 5 })
        );
    }

    #[test]
    fn test_empty_set_accepts_everything() {
        let rules = RuleSet::none();
        assert!(rules.is_empty());
        assert!(rules.check(0, &[0]).is_ok());
    }
}
