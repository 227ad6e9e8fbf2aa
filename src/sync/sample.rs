//! Uniform sampling without replacement.

use crate::{Error, Result};
use rand::seq::index;

/// Picks `amount` elements at distinct positions of `population`.
///
/// Positions are drawn uniformly without replacement using `rng`, so a
/// seeded generator makes the result reproducible. Duplicated values in
/// `population` may still appear more than once.
///
/// # Errors
///
/// Returns [`Error::InsufficientData`] if `population` has fewer than
/// `amount` elements.
pub fn sample<T, R>(population: &[T], amount: usize, rng: &mut R) -> Result<Vec<T>>
where
    T: Clone,
    R: rand::Rng + ?Sized,
{
    if population.len() < amount {
        return Err(Error::InsufficientData {
            requested: amount,
            available: population.len(),
        });
    }

    Ok(index::sample(rng, population.len(), amount)
        .into_iter()
        .map(|i| population[i].clone())
        .collect())
}
