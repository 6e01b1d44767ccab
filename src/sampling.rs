//! Thread-local randomness and weighted categorical sampling.

use crate::error::PolysomeError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Reseed the current thread's generator. Draws are deterministic afterwards.
pub fn seed(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Uniform draw from `[0, 1)`.
pub fn random() -> f64 {
    RNG.with(|rng| rng.borrow_mut().gen::<f64>())
}

/// Index `i` with probability `weights[i] / Σ weights`, by a single uniform
/// draw over `[0, Σ weights)` and linear accumulation.
pub fn weighted_choice_index(weights: &[f64]) -> Result<usize, PolysomeError> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 {
        return Err(PolysomeError::EmptyOrZeroSum);
    }
    let u = random() * total;
    let mut cumsum = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumsum += weight;
        if u <= cumsum {
            return Ok(index);
        }
    }
    Ok(weights.len() - 1)
}

/// Uniform choice over `items` (all weights equal).
pub fn choice<T>(items: &[T]) -> Result<&T, PolysomeError> {
    if items.is_empty() {
        return Err(PolysomeError::EmptyOrZeroSum);
    }
    let index = weighted_choice_index(&vec![1.0; items.len()])?;
    Ok(&items[index])
}
