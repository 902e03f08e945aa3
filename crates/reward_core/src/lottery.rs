//! Jackpot probability curve
//!
//! Each consecutive losing submission raises the jackpot chance by 0.2 points,
//! from 0.8% up to a 5% cap. A win resets the streak.

use crate::sampler::RandomSource;
use crate::types::{LotteryResult, UserRewardState};
use chrono::{DateTime, Utc};

pub const BASE_PROBABILITY: f64 = 0.008;
pub const STEP_PER_LOSS: f64 = 0.002;
pub const MAX_PROBABILITY: f64 = 0.05;

/// Win probability after `consecutive_loses` losses. Negative counts are treated as 0.
pub fn probability(consecutive_loses: i64) -> f64 {
    let k = consecutive_loses.max(0) as f64;
    (BASE_PROBABILITY + STEP_PER_LOSS * k).min(MAX_PROBABILITY)
}

/// Evaluated jackpot roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotteryDraw {
    pub won: bool,
    pub probability: f64,
}

impl LotteryDraw {
    pub fn result(&self) -> LotteryResult {
        if self.won {
            LotteryResult::Win
        } else {
            LotteryResult::Lose
        }
    }
}

/// Roll once against the curve for the current streak.
pub fn evaluate<S: RandomSource + ?Sized>(bonus_count: u32, rng: &mut S) -> LotteryDraw {
    let probability = probability(bonus_count as i64);
    LotteryDraw { won: rng.next_f64() < probability, probability }
}

/// Reset the streak on a win, extend it on a loss.
pub fn apply_outcome(state: &mut UserRewardState, won: bool, now: DateTime<Utc>) {
    if won {
        state.bonus_count = 0;
        state.jackpot_won_at = Some(now);
    } else {
        state.bonus_count = state.bonus_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::FixedRolls;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_probability_table() {
        assert!(approx(probability(0), 0.008));
        assert!(approx(probability(1), 0.010));
        assert!(approx(probability(10), 0.028));
        assert!(approx(probability(21), 0.05));
        assert!(approx(probability(50), 0.05));
        assert!(approx(probability(-3), 0.008));
        assert!(approx(probability(i64::MIN), 0.008));
        assert!(approx(probability(i64::MAX), 0.05));
    }

    #[test]
    fn test_evaluate_compares_roll_against_probability() {
        let mut rolls = FixedRolls::new(vec![0.0079, 0.008, 0.049]);
        assert!(evaluate(0, &mut rolls).won);
        assert!(!evaluate(0, &mut rolls).won);

        let capped = evaluate(500, &mut rolls);
        assert!(capped.won);
        assert!(approx(capped.probability, MAX_PROBABILITY));
        assert_eq!(capped.result(), LotteryResult::Win);
    }

    #[test]
    fn test_apply_outcome_transitions() {
        let now = Utc::now();
        let mut state = UserRewardState::new("u1");
        state.bonus_count = 10;

        apply_outcome(&mut state, false, now);
        assert_eq!(state.bonus_count, 11);
        assert_eq!(state.jackpot_won_at, None);

        apply_outcome(&mut state, true, now);
        assert_eq!(state.bonus_count, 0);
        assert_eq!(state.jackpot_won_at, Some(now));

        state.bonus_count = u32::MAX;
        apply_outcome(&mut state, false, now);
        assert_eq!(state.bonus_count, u32::MAX);
    }

    proptest! {
        /// Property: the curve stays inside [0.008, 0.05]
        #[test]
        fn prop_probability_bounded(k in any::<i64>()) {
            let p = probability(k);
            prop_assert!(p >= BASE_PROBABILITY - 1e-12);
            prop_assert!(p <= MAX_PROBABILITY + 1e-12);
        }

        /// Property: the curve never decreases as losses accumulate
        #[test]
        fn prop_probability_monotonic(k in 0i64..10_000) {
            prop_assert!(probability(k + 1) >= probability(k));
        }
    }
}
