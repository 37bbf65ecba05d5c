//! Seedable particle RNG backed by `rand`'s `StdRng`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random source owned by each emitter.
///
/// Cloning an emitter clones its RNG state, so pooled copies should be
/// reseeded (see `Effect::reseed`) to avoid identical particle streams.
#[derive(Debug, Clone)]
pub struct ParticleRng {
    inner: StdRng,
}

impl ParticleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from the operating system's entropy source
    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.gen()
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Returns a float between `min` and `max`. Reversed or empty ranges are allowed.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns a float in [0, max)
    pub fn up_to(&mut self, max: f32) -> f32 {
        self.next_f32() * max
    }

    /// Returns an index in [0, len). `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
