//! Randomness seam used by the upgrade state machine.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws consumed by upgrade ticks and failure resolution.
pub trait UpgradeDice {
    /// Draws a value uniformly from `[0, 1)`.
    ///
    /// Draws are double precision so that per-tick risks far below
    /// `f32::EPSILON` still compare correctly.
    fn unit(&mut self) -> f64;

    /// Draws a value uniformly from the half-open range `[min, max)`.
    ///
    /// The result is narrowed to `f32`, which can round a draw just below
    /// `max` up to `max` itself. Returns `min` without drawing when the
    /// range is empty.
    fn in_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        (f64::from(min) + f64::from(max - min) * self.unit()) as f32
    }
}

/// Deterministic dice backed by a seeded ChaCha stream.
#[derive(Clone, Debug)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    /// Creates dice whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl UpgradeDice for SeededDice {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Dice replaying a fixed script of draws, used to force specific outcomes.
///
/// Once the script is exhausted every draw returns the fallback value.
#[derive(Clone, Debug)]
pub struct ScriptedDice {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedDice {
    /// Creates dice that replay `draws` and then return `fallback` forever.
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Creates dice that always return `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            draws: VecDeque::new(),
            fallback: value,
        }
    }

    /// Number of scripted draws not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl UpgradeDice for ScriptedDice {
    fn unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}
