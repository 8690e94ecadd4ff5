//! Crossover operators that recombine parent genes into one offspring.

use super::{random_index, random_unit, OperatorError};
use rand::RngCore;
use std::sync::Arc;

/// Produces one offspring from a fixed number of parents.
///
/// When an operator needs three parents, the optimizer passes the two
/// mating-selected parents first and the subproblem's current representative
/// last.
///
/// # Examples
/// ```
/// use moead_stm::ops::CrossoverOperator;
///
/// struct Midpoint;
///
/// impl CrossoverOperator for Midpoint {
///     fn parents_required(&self) -> usize { 2 }
///
///     fn crossover(&self, parents: &[&[f64]], _rng: &mut dyn rand::RngCore) -> Vec<f64> {
///         parents[0].iter().zip(parents[1]).map(|(a, b)| 0.5 * (a + b)).collect()
///     }
/// }
///
/// let child = Midpoint.crossover(&[&[0.0, 2.0], &[2.0, 4.0]], &mut rand::thread_rng());
/// assert_eq!(child, vec![1.0, 3.0]);
/// ```
pub trait CrossoverOperator: Send + Sync {
    /// Number of parent gene slices consumed by [`Self::crossover`].
    fn parents_required(&self) -> usize;

    /// Recombines the parents into one child.
    fn crossover(&self, parents: &[&[f64]], rng: &mut dyn RngCore) -> Vec<f64>;
}

impl<T: CrossoverOperator + ?Sized> CrossoverOperator for Box<T> {
    fn parents_required(&self) -> usize {
        (**self).parents_required()
    }

    fn crossover(&self, parents: &[&[f64]], rng: &mut dyn RngCore) -> Vec<f64> {
        (**self).crossover(parents, rng)
    }
}

impl<T: CrossoverOperator + ?Sized> CrossoverOperator for Arc<T> {
    fn parents_required(&self) -> usize {
        (**self).parents_required()
    }

    fn crossover(&self, parents: &[&[f64]], rng: &mut dyn RngCore) -> Vec<f64> {
        (**self).crossover(parents, rng)
    }
}

/// Differential-evolution crossover, `rand/1/bin` variant.
///
/// With parents `[r1, r2, current]` the mutant is
/// `current + F * (r1 - r2)`, and each gene is taken from the mutant with
/// probability `CR` (one randomly chosen gene always is).
#[derive(Debug, Clone)]
pub struct DifferentialEvolutionCrossover {
    crossover_rate: f64,
    scale_factor: f64,
}

impl DifferentialEvolutionCrossover {
    /// Creates a DE operator with crossover rate `CR` and scale factor `F`.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when `CR` lies outside `[0, 1]` or `F` is
    /// negative or not finite.
    pub fn new(crossover_rate: f64, scale_factor: f64) -> Result<Self, OperatorError> {
        if !(crossover_rate.is_finite() && (0.0..=1.0).contains(&crossover_rate)) {
            return Err(OperatorError::InvalidProbability {
                operator: "differential evolution",
                value: crossover_rate,
            });
        }
        if !(scale_factor.is_finite() && scale_factor >= 0.0) {
            return Err(OperatorError::InvalidParameter {
                operator: "differential evolution",
                parameter: "F",
                value: scale_factor,
            });
        }
        Ok(Self {
            crossover_rate,
            scale_factor,
        })
    }
}

impl CrossoverOperator for DifferentialEvolutionCrossover {
    fn parents_required(&self) -> usize {
        3
    }

    fn crossover(&self, parents: &[&[f64]], rng: &mut dyn RngCore) -> Vec<f64> {
        let (r1, r2, current) = (parents[0], parents[1], parents[2]);
        let forced = random_index(current.len(), rng);
        current
            .iter()
            .enumerate()
            .map(|(idx, &base)| {
                if idx == forced || random_unit(rng) < self.crossover_rate {
                    base + self.scale_factor * (r1[idx] - r2[idx])
                } else {
                    base
                }
            })
            .collect()
    }
}

/// Simulated Binary Crossover (SBX) following Deb & Agrawal. Only the first
/// of the two SBX children is returned.
#[derive(Debug, Clone)]
pub struct SimulatedBinaryCrossover {
    distribution_index: f64,
}

impl SimulatedBinaryCrossover {
    /// Creates a new SBX operator.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidDistributionIndex`] when the provided
    /// distribution index is non-positive or not finite.
    pub fn new(distribution_index: f64) -> Result<Self, OperatorError> {
        if !(distribution_index.is_finite() && distribution_index > 0.0) {
            return Err(OperatorError::InvalidDistributionIndex {
                operator: "sbx",
                value: distribution_index,
            });
        }
        Ok(Self { distribution_index })
    }

    fn crossover_gene(&self, value_a: f64, value_b: f64, rng: &mut dyn RngCore) -> f64 {
        if (value_a - value_b).abs() < f64::EPSILON {
            return value_a;
        }
        let u = random_unit(rng);
        let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (self.distribution_index + 1.0))
        } else {
            (2.0 * (1.0 - u)).powf(-1.0 / (self.distribution_index + 1.0))
        };
        0.5 * ((1.0 + beta) * value_a + (1.0 - beta) * value_b)
    }
}

impl CrossoverOperator for SimulatedBinaryCrossover {
    fn parents_required(&self) -> usize {
        2
    }

    fn crossover(&self, parents: &[&[f64]], rng: &mut dyn RngCore) -> Vec<f64> {
        parents[0]
            .iter()
            .zip(parents[1])
            .map(|(&value_a, &value_b)| self.crossover_gene(value_a, value_b, rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn de_with_zero_scale_returns_current() {
        let operator = DifferentialEvolutionCrossover::new(1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let child = operator.crossover(&[&[5.0, 5.0], &[-5.0, 1.0], &[0.5, 0.25]], &mut rng);
        assert_eq!(child, vec![0.5, 0.25]);
    }

    #[test]
    fn de_full_rate_applies_difference_everywhere() {
        let operator = DifferentialEvolutionCrossover::new(1.0, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let child = operator.crossover(&[&[1.0, 2.0], &[0.0, 0.0], &[0.0, 1.0]], &mut rng);
        assert_eq!(child, vec![0.5, 2.0]);
    }

    #[test]
    fn de_zero_rate_still_changes_one_gene() {
        let operator = DifferentialEvolutionCrossover::new(0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let current = [0.0, 0.0, 0.0];
        let child = operator.crossover(&[&[1.0, 1.0, 1.0], &[0.0, 0.0, 0.0], &current], &mut rng);
        let changed = child.iter().filter(|&&gene| gene != 0.0).count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn de_rejects_invalid_rate() {
        assert!(DifferentialEvolutionCrossover::new(1.5, 0.5).is_err());
        assert!(DifferentialEvolutionCrossover::new(0.5, f64::NAN).is_err());
    }

    #[test]
    fn sbx_respects_identical_parents() {
        let operator = SimulatedBinaryCrossover::new(15.0).unwrap();
        let parent = [1.0, 2.0];
        let mut rng = StdRng::seed_from_u64(2);
        let child = operator.crossover(&[&parent, &parent], &mut rng);
        assert_eq!(child, parent);
    }
}
