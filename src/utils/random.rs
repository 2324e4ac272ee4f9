//! # Random Sources
//!
//! Every random decision in the core (maze carving, NPC placement, encounter
//! rolls, monster selection, escape rolls, item drops) goes through
//! [`RandomSource`], so callers can seed it or script it outright.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of the two kinds of random decisions the core makes.
pub trait RandomSource: std::fmt::Debug {
    /// Returns `true` with the given probability (clamped to `0.0..=1.0`).
    fn chance(&mut self, probability: f64) -> bool;

    /// Returns a uniformly chosen index in `0..upper`. `upper` must be non-zero.
    fn below(&mut self, upper: usize) -> usize;
}

impl RandomSource for StdRng {
    fn chance(&mut self, probability: f64) -> bool {
        self.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn below(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }
}

/// Creates a seeded random source.
///
/// # Examples
///
/// ```
/// use drapon::{seeded_random, RandomSource};
///
/// let mut a = seeded_random(7);
/// let mut b = seeded_random(7);
/// assert_eq!(a.below(1000), b.below(1000));
/// ```
pub fn seeded_random(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A canned outcome for [`ScriptedRandom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    /// Answer for the next `chance` call
    Chance(bool),
    /// Answer for the next `below` call (reduced modulo `upper`)
    Index(usize),
}

/// Random source that replays a queue of outcomes.
///
/// When the queue runs dry, `chance` answers `false` and `below` answers `0`,
/// so a scripted game never rolls an unplanned encounter.
///
/// # Examples
///
/// ```
/// use drapon::{RandomSource, Scripted, ScriptedRandom};
///
/// let mut rng = ScriptedRandom::new([Scripted::Chance(true), Scripted::Index(5)]);
/// assert!(rng.chance(0.01));
/// assert_eq!(rng.below(3), 2);
/// assert!(!rng.chance(0.99));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    outcomes: VecDeque<Scripted>,
}

impl ScriptedRandom {
    /// Creates a scripted source from an ordered list of outcomes.
    pub fn new(outcomes: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }

    /// Appends one more outcome.
    pub fn push(&mut self, outcome: Scripted) {
        self.outcomes.push_back(outcome);
    }

    /// Number of outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn chance(&mut self, _probability: f64) -> bool {
        match self.outcomes.pop_front() {
            Some(Scripted::Chance(hit)) => hit,
            Some(Scripted::Index(index)) => index != 0,
            None => false,
        }
    }

    fn below(&mut self, upper: usize) -> usize {
        match self.outcomes.pop_front() {
            Some(Scripted::Index(index)) => index % upper,
            Some(Scripted::Chance(_)) | None => 0,
        }
    }
}
