//! Injectable randomness for synthetic delays and suggestions.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniformly distributed integers.
///
/// The lookup pipeline takes one of these instead of reaching for a global
/// generator, so tests can pin the synthetic delay.
pub trait RandomSource: Send + Sync + std::fmt::Debug {
    /// A uniform integer in `low..=high`. Bounds are swapped if reversed.
    fn next_in_range(&self, low: u32, high: u32) -> u32;
}

/// [`RandomSource`] backed by a seedable [`StdRng`].
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Deterministic generator for a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generator seeded from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Use `seed` when present, OS entropy otherwise.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::from_seed)
    }
}

impl RandomSource for SeededRandom {
    fn next_in_range(&self, low: u32, high: u32) -> u32 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(low..=high)
    }
}
