//! Seeded random number generation.
//!
//! The simulation owns exactly one [SeededRandom] and threads it through
//! every component that needs randomness. Each draw is a pure function of
//! the seed and the call order, which is what makes runs reproducible.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A deterministic random source built from a single integer seed.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Creates a new generator from the given seed.
    pub fn new(seed: u64) -> Self {
        debug!("random generator initialized with seed {}", seed);
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a uniform value in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Draws a uniform value in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.uniform() * (max - min)
    }

    /// Draws a uniform integer in `[min, max)`.
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.range(min as f64, max as f64).floor() as i64
    }

    /// Draws `true` with the given probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.uniform() < probability
    }

    /// Chooses an element uniformly at random.
    ///
    /// # Panics
    /// Panics if `items` is empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "cannot choose from an empty slice");
        &items[self.int_range(0, items.len() as i64) as usize]
    }

    /// Chooses an element with probability proportional to its weight.
    ///
    /// The scan subtracts weights from a single uniform draw; the final
    /// choice is the fallback when floating-point rounding leaves a
    /// remainder.
    ///
    /// # Panics
    /// Panics if `choices` is empty or the lengths differ.
    pub fn weighted_choice<'a, T>(&mut self, choices: &'a [T], weights: &[f64]) -> &'a T {
        assert!(!choices.is_empty(), "cannot choose from an empty slice");
        assert_eq!(
            choices.len(),
            weights.len(),
            "choices and weights must have the same length"
        );

        let total: f64 = weights.iter().sum();
        let mut remaining = self.uniform() * total;

        for (choice, weight) in choices.iter().zip(weights) {
            remaining -= weight;
            if remaining <= 0.0 {
                return choice;
            }
        }
        &choices[choices.len() - 1]
    }

    /// Draws from a normal distribution via the Box-Muller transform.
    ///
    /// Consumes exactly two uniform draws.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform();
        let u2 = self.uniform();
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        z0 * std_dev + mean
    }

    /// Draws from an exponential distribution with rate `lambda`.
    pub fn exponential(&mut self, lambda: f64) -> f64 {
        -(1.0 - self.uniform()).ln() / lambda
    }

    /// Draws from a Poisson distribution with mean `lambda`.
    ///
    /// Uses the direct multiplication method below a mean of 30 and a
    /// rounded, clamped normal approximation above it.
    pub fn poisson(&mut self, lambda: f64) -> u64 {
        if lambda < 30.0 {
            let limit = (-lambda).exp();
            let mut k: u64 = 0;
            let mut p = 1.0;
            loop {
                k += 1;
                p *= self.uniform();
                if p <= limit {
                    break;
                }
            }
            k - 1
        } else {
            self.normal(lambda, lambda.sqrt()).round().max(0.0) as u64
        }
    }
}
