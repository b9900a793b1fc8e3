//! Injectable randomness.
//!
//! Every roll the engine makes (crits, hopper duplication, golden roses,
//! maintenance, card draws) goes through [`RandomSource`], so a host can
//! seed it and a test can script it.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Default seed used when no explicit seed is provided.
const DEFAULT_SEED: u64 = 42;

/// Deterministic production RNG.
#[derive(Clone, Debug)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RandomSource for SimRng {
    fn next_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of samples, then repeats `fallback` forever.
///
/// `ScriptedRandom::constant(0.99)` suppresses every low-probability roll
/// (crits, duplication, spawns); `constant(0.0)` forces all of them.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    queue: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            queue: values.into_iter().map(clamp_unit).collect(),
            fallback: clamp_unit(fallback),
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::empty(), value)
    }

    /// Queue more samples behind the ones not yet consumed.
    pub fn push(&mut self, value: f64) {
        self.queue.push_back(clamp_unit(value));
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

/// Keep scripted samples inside `[0, 1)` so index math can't overflow a bag.
fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
