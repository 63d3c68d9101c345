//! Deterministic random number generation stored inside battle state.
//!
//! ## Key Features
//!
//! - **Explicit state**: the whole generator is one `u64` seed
//! - **One transition per draw**: every draw maps `seed -> (seed', value)`
//! - **Replayable**: same initial seed and call order give the same draws
//!
//! ## Usage
//!
//! ```
//! use rpg_battle::core::BattleRng;
//!
//! let mut rng = BattleRng::new(42);
//! let first = rng.next_f64();
//!
//! let mut replay = BattleRng::new(42);
//! assert_eq!(replay.next_f64(), first);
//! assert_eq!(rng.seed(), replay.seed());
//! ```

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded RNG carried by [`BattleState`](super::BattleState).
///
/// Uses ChaCha8 as the mixing function: each draw seeds a fresh stream from
/// the current seed, reads one value, and takes the next word as the new
/// seed. There is no hidden stream position, so serializing the seed alone
/// captures the generator completely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleRng {
    seed: u64,
}

impl BattleRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Current seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Pure transition: `seed -> (seed', value in [0, 1))`.
    #[must_use]
    pub fn step(seed: u64) -> (u64, f64) {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        let value = inner.gen::<f64>();
        (inner.next_u64(), value)
    }

    /// Draw a uniform value in `[0, 1)`, advancing the seed once.
    pub fn next_f64(&mut self) -> f64 {
        let (next, value) = Self::step(self.seed);
        tracing::trace!(seed = self.seed, next, value, "rng draw");
        self.seed = next;
        value
    }

    /// Draw an index in `0..len`. One draw; `len == 0` yields 0 without drawing.
    pub fn gen_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let idx = (self.next_f64() * len as f64) as usize;
        idx.min(len - 1)
    }

    /// Draw `true` with the given probability. One draw.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Choose a random index with weighted probability.
    ///
    /// Weights do not need to sum to 1.0. Non-positive weights are never
    /// chosen. Returns `None` without drawing if no weight is positive.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return None;
        }

        let mut threshold = self.next_f64() * total;

        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            threshold -= weight;
            if threshold < 0.0 {
                return Some(i);
            }
        }

        // Floating point edge case - return last positive weight
        weights.iter().rposition(|w| *w > 0.0)
    }
}
