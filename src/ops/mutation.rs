//! Mutation operators that perturb an offspring in place.

use super::{random_unit, OperatorError};
use crate::core::validate_bounds;
use rand::RngCore;
use std::sync::Arc;

/// Perturbs a child's genes in place.
///
/// # Examples
/// ```
/// use moead_stm::ops::MutationOperator;
///
/// struct AddOne;
///
/// impl MutationOperator for AddOne {
///     fn mutate(&self, genes: &mut [f64], _rng: &mut dyn rand::RngCore) {
///         genes.iter_mut().for_each(|gene| *gene += 1.0);
///     }
/// }
///
/// let mut genes = vec![0.0, 1.0];
/// AddOne.mutate(&mut genes, &mut rand::thread_rng());
/// assert_eq!(genes, vec![1.0, 2.0]);
/// ```
pub trait MutationOperator: Send + Sync {
    /// Mutates the genes in place.
    fn mutate(&self, genes: &mut [f64], rng: &mut dyn RngCore);
}

impl<T: MutationOperator + ?Sized> MutationOperator for Box<T> {
    fn mutate(&self, genes: &mut [f64], rng: &mut dyn RngCore) {
        (**self).mutate(genes, rng);
    }
}

impl<T: MutationOperator + ?Sized> MutationOperator for Arc<T> {
    fn mutate(&self, genes: &mut [f64], rng: &mut dyn RngCore) {
        (**self).mutate(genes, rng);
    }
}

/// Polynomial mutation operator that respects problem bounds.
#[derive(Debug, Clone)]
pub struct PolynomialMutation {
    distribution_index: f64,
    probability: f64,
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
}

impl PolynomialMutation {
    /// Creates a new polynomial mutation operator.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when the distribution index or probability is
    /// invalid, or when the bound vectors are inconsistent.
    pub fn new(
        lower_bounds: Vec<f64>,
        upper_bounds: Vec<f64>,
        distribution_index: f64,
        probability: f64,
    ) -> Result<Self, OperatorError> {
        if !(distribution_index.is_finite() && distribution_index > 0.0) {
            return Err(OperatorError::InvalidDistributionIndex {
                operator: "polynomial mutation",
                value: distribution_index,
            });
        }
        if !(probability.is_finite() && (0.0..=1.0).contains(&probability)) {
            return Err(OperatorError::InvalidProbability {
                operator: "polynomial mutation",
                value: probability,
            });
        }
        validate_bounds(&lower_bounds, &upper_bounds)?;
        Ok(Self {
            distribution_index,
            probability,
            lower_bounds,
            upper_bounds,
        })
    }

    fn perturb(&self, gene: f64, lower: f64, upper: f64, rng: &mut dyn RngCore) -> f64 {
        let range = upper - lower;
        if range.abs() < f64::EPSILON {
            return lower;
        }
        let exponent = self.distribution_index + 1.0;
        let delta1 = (gene - lower) / range;
        let delta2 = (upper - gene) / range;
        let u = random_unit(rng);
        let delta_q = if u <= 0.5 {
            let term = 2.0 * u + (1.0 - 2.0 * u) * (1.0 - delta1).powf(exponent);
            term.powf(1.0 / exponent) - 1.0
        } else {
            let term = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * (1.0 - delta2).powf(exponent);
            1.0 - term.powf(1.0 / exponent)
        };
        let delta_q = if delta_q.is_finite() { delta_q } else { 0.0 };
        (gene + delta_q * range).clamp(lower, upper)
    }
}

impl MutationOperator for PolynomialMutation {
    fn mutate(&self, genes: &mut [f64], rng: &mut dyn RngCore) {
        for ((gene, &lower), &upper) in genes
            .iter_mut()
            .zip(&self.lower_bounds)
            .zip(&self.upper_bounds)
        {
            if random_unit(rng) < self.probability {
                *gene = self.perturb(*gene, lower, upper, rng);
            }
        }
    }
}
