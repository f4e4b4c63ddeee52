//! Uniform sampling of challenge vectors

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::params::P;

/// Uniform sampler over F_P
pub struct ChallengeSampler {
    rng: ChaCha20Rng,
}

impl ChallengeSampler {
    /// Create a sampler seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Create a seeded sampler for reproducibility
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Sample one element uniformly from `[0, P)`
    pub fn sample(&mut self) -> u64 {
        self.rng.gen_range(0..P)
    }

    /// Sample a challenge vector of length n
    pub fn sample_vec(&mut self, n: usize) -> Vec<u64> {
        (0..n).map(|_| self.sample()).collect()
    }
}

impl Default for ChallengeSampler {
    fn default() -> Self {
        Self::new()
    }
}
