//! Seeded random source for filename tokens.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound (inclusive) of generated tokens; every token has nine digits.
const TOKEN_MIN: u32 = 100_000_000;
/// Upper bound (exclusive) of generated tokens.
const TOKEN_MAX: u32 = 200_000_000;

/// Shared random source producing numeric filename tokens.
///
/// Seeded once and shared by every worker of a client through `Clone`, so a
/// fixed seed reproduces the same token sequence for a serial run.
#[derive(Debug, Clone)]
pub struct TokenSource {
    rng: Arc<Mutex<StdRng>>,
}

impl TokenSource {
    /// Creates a source with a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Creates a source seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Returns the next nine-digit token.
    #[must_use]
    pub fn next_token(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(TOKEN_MIN..TOKEN_MAX).to_string()
    }
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}
