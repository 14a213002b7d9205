//! Deterministic per-actor RNG.
//!
//! The engine itself never draws random numbers.  `ActorRng` exists for the
//! drivers and tests that inject real-time jitter between requests to show
//! that the virtual-time trace does not depend on thread timing.
//!
//! # Seeding
//!
//!   seed = run_seed XOR (actor_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive actor IDs uniformly across the seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ActorId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-actor deterministic RNG.
///
/// Each actor thread owns its own instance; nothing is shared.
pub struct ActorRng(SmallRng);

impl ActorRng {
    /// Seed deterministically from the run's seed and an actor ID.
    pub fn new(run_seed: u64, actor: ActorId) -> Self {
        let seed = run_seed ^ (actor.0 as u64).wrapping_mul(MIXING_CONSTANT);
        ActorRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
