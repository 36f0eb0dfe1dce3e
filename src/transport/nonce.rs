//! Tie-break nonce generation

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Produces the single-byte nonces used to break negotiation ties
pub trait NonceSource: Send {
    /// Draw a fresh nonce
    fn next_nonce(&mut self) -> u8;
}

/// [`NonceSource`] backed by a random number generator
#[derive(Debug, Clone)]
pub struct RandomNonces<R = StdRng> {
    rng: R,
}

impl RandomNonces<StdRng> {
    /// Seed from OS entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for reproducible runs
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: RngCore> RandomNonces<R> {
    /// Wrap an existing generator
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl Default for RandomNonces<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: RngCore + Send> NonceSource for RandomNonces<R> {
    fn next_nonce(&mut self) -> u8 {
        self.rng.r#gen()
    }
}
