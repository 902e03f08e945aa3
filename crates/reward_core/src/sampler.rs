//! Weighted discrete sampling and the injectable uniform random source.
//!
//! Every random decision in the reward engine (rarity tier, category coin flip,
//! uniform pool pick, title pick, jackpot roll) goes through [`RandomSource`], so a
//! test can swap in [`FixedRolls`] or a seeded [`RngSource`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Uniform `[0, 1)` generator.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        let scaled = (self.next_f64() * len as f64) as usize;
        scaled.min(len.saturating_sub(1))
    }

    /// Fair coin, `true` with p = 0.5.
    fn coin_flip(&mut self) -> bool {
        self.next_f64() < 0.5
    }
}

/// Adapter from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ChaCha8Rng> {
    /// Deterministic source, same seed = same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of rolls, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct FixedRolls {
    rolls: Vec<f64>,
    cursor: usize,
}

impl FixedRolls {
    pub fn new(rolls: Vec<f64>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// Number of rolls consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for FixedRolls {
    fn next_f64(&mut self) -> f64 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        roll.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Weighted choice over `(key, weight)` pairs.
///
/// Draws `u * total` and returns the first key whose cumulative weight meets or
/// exceeds the draw. Negative or NaN weights count as zero and zero-weight keys are
/// never selected while some key has positive weight. When the total weight is zero
/// the last key is returned. `None` only for an empty slice.
pub fn pick<K: Clone, S: RandomSource + ?Sized>(items: &[(K, f64)], rng: &mut S) -> Option<K> {
    let last = items.last()?;

    let total: f64 = items.iter().map(|(_, w)| effective_weight(*w)).sum();
    if total <= 0.0 {
        debug!(items = items.len(), "all weights are zero, falling back to last key");
        return Some(last.0.clone());
    }

    let draw = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for (key, weight) in items {
        let weight = effective_weight(*weight);
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        if cumulative >= draw {
            return Some(key.clone());
        }
    }

    // Float rounding can leave `cumulative` a hair under `draw`
    items.iter().rev().find(|(_, w)| effective_weight(*w) > 0.0).map(|(k, _)| k.clone())
}

fn effective_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}
