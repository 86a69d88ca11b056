//! Scoring for a correct guess.

/// Base points for finding the number.
const BASE: i64 = 100;
/// Guesses faster than this many ms earn a time bonus.
const BONUS_WINDOW_MS: i64 = 5_000;
/// Points lost per extra attempt before the correct one.
const ATTEMPT_PENALTY: i64 = 5;
/// No correct guess is ever worth less than this.
const FLOOR: i64 = 10;

/// Points awarded for a correct guess.
///
/// `100 + max(0, 5000 − guess_time_ms) / 100 − (attempts − 1) · 5`,
/// floored at 10. Decreases with elapsed time (in 100 ms steps) and with
/// each attempt spent; fast first-try guesses approach 150.
pub fn score(guess_time_ms: u64, attempts: u32) -> u32 {
    let time_bonus = (BONUS_WINDOW_MS - guess_time_ms as i64).max(0) / 100;
    let penalty = (attempts.saturating_sub(1) as i64) * ATTEMPT_PENALTY;
    (BASE + time_bonus - penalty).max(FLOOR) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_first_try_is_maximal() {
        assert_eq!(score(0, 1), 150);
    }

    #[test]
    fn test_score_decreases_with_time() {
        // 100 ms granularity: the bonus decays one point per 100 ms.
        let times = [0u64, 100, 1_000, 2_500, 4_900, 5_000];
        let scores: Vec<u32> = times.iter().map(|&t| score(t, 1)).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "scores must strictly decrease: {scores:?}");
        }
    }

    #[test]
    fn test_no_bonus_past_the_window() {
        assert_eq!(score(5_000, 1), 100);
        assert_eq!(score(14_999, 1), 100);
    }

    #[test]
    fn test_score_decreases_with_attempts() {
        let scores: Vec<u32> = (1..=10).map(|a| score(1_000, a)).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "scores must strictly decrease: {scores:?}");
        }
    }

    #[test]
    fn test_floor_is_ten() {
        // Slow guess after many attempts bottoms out at the floor.
        assert_eq!(score(10_000, 50), 10);
        assert_eq!(score(10_000, 1_000), 10);
    }
}
