//! Mini-batch sampling.
//!
//! Every call draws a fresh batch: a uniform random permutation of `[0, split_size)`
//! truncated to `batch_size` entries. No epoch-level shuffle state is kept between calls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct BatchSampler {
    rng: StdRng,
}

impl BatchSampler {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Draw `batch_size` distinct indices in `[0, split_size)`.
    pub fn sample(&mut self, split_size: usize, batch_size: usize) -> Result<Vec<usize>> {
        sample_with_rng(&mut self.rng, split_size, batch_size)
    }
}

/// [`BatchSampler::sample`] with a caller-provided RNG.
///
/// Rejects `batch_size == 0` and `batch_size > split_size` before drawing anything.
pub fn sample_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    split_size: usize,
    batch_size: usize,
) -> Result<Vec<usize>> {
    if batch_size == 0 || batch_size > split_size {
        return Err(Error::InvalidBatch {
            batch_size,
            split_size,
        });
    }
    Ok(rand::seq::index::sample(rng, split_size, batch_size).into_vec())
}
