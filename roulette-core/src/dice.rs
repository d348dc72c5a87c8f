//! Randomness for the engine.
//!
//! Every probability check and every index draw goes through a
//! [`RandomSource`], so tests can script outcomes and simulations can be
//! seeded.

use rand::rngs::ThreadRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of randomness consumed by the engine.
pub trait RandomSource {
    /// Uniform real in `[0, 1)`.
    fn chance(&mut self) -> f64;

    /// Uniform integer in `0..n`. Returns 0 when `n == 0`.
    fn below(&mut self, n: usize) -> usize;

    /// `true` with the given probability.
    fn roll(&mut self, probability: f64) -> bool {
        self.chance() < probability
    }

    /// A single six-sided die.
    fn d6(&mut self) -> u8 {
        self.below(6) as u8 + 1
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn chance(&mut self) -> f64 {
        (**self).chance()
    }

    fn below(&mut self, n: usize) -> usize {
        (**self).below(n)
    }
}

/// Adapter from any `rand` generator to a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R: RngCore> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ChaCha8Rng> {
    /// Reproducible source for simulations and statistical tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn chance(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }
}

/// In-place Fisher–Yates shuffle, walking from the back.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// Cumulative-weight selection. Weights need not be normalized.
///
/// Returns `None` when the table is empty or every weight is zero.
pub fn weighted_index<R: RandomSource + ?Sized>(weights: &[u32], rng: &mut R) -> Option<usize> {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return None;
    }
    let mut r = rng.chance() * f64::from(total);
    for (i, &weight) in weights.iter().enumerate() {
        let weight = f64::from(weight);
        if r < weight {
            return Some(i);
        }
        r -= weight;
    }
    // Floating point slop on the last bucket.
    weights.iter().rposition(|&w| w > 0)
}

/// Two six-sided dice, as rolled for turn order.
pub fn roll_2d6<R: RandomSource + ?Sized>(rng: &mut R) -> u8 {
    rng.d6() + rng.d6()
}

/// A wager in the Sic Bo sub-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SicBoBet {
    /// Total of 11 to 17.
    Big,
    /// Total of 4 to 10.
    Small,
}

impl fmt::Display for SicBoBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SicBoBet::Big => write!(f, "big"),
            SicBoBet::Small => write!(f, "small"),
        }
    }
}

/// Three dice thrown for Sic Bo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SicBoRoll {
    pub dice: [u8; 3],
}

impl SicBoRoll {
    pub fn roll_with_rng<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        Self {
            dice: [rng.d6(), rng.d6(), rng.d6()],
        }
    }

    pub fn total(&self) -> u8 {
        self.dice.iter().sum()
    }

    pub fn is_triple(&self) -> bool {
        self.dice[0] == self.dice[1] && self.dice[1] == self.dice[2]
    }

    /// Which side of the table the total lands on.
    pub fn outcome(&self) -> SicBoBet {
        if (11..=17).contains(&self.total()) {
            SicBoBet::Big
        } else {
            SicBoBet::Small
        }
    }
}

impl fmt::Display for SicBoRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.dice;
        write!(f, "{a}-{b}-{c} = {}", self.total())
    }
}
