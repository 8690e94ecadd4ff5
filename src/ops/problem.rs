//! Problem abstractions consumed by the optimizer.
//!
//! The engine never looks inside decision variables; it only needs the
//! search-space bounds, the number of objectives, and an evaluation routine
//! that maps genes to an objective vector.

use crate::core::Solution;
use async_trait::async_trait;
use std::sync::Arc;

/// Convenience alias used by the problem traits.
pub type ProblemResult<T> = Result<T, ProblemError>;

/// Errors produced when a candidate solution is incompatible with a problem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProblemError {
    /// The candidate contains the wrong number of decision variables.
    #[error("candidate has {found} decision variables but problem expects {expected}")]
    DimensionMismatch {
        /// Number of variables expected by the problem.
        expected: usize,
        /// Number of variables provided by the candidate solution.
        found: usize,
    },
    /// The lower and upper bounds do not align with the expected dimensionality.
    #[error(
        "bounds lengths ({lower}, {upper}) do not match problem dimensionality ({expected})"
    )]
    BoundsLengthMismatch {
        /// Expected dimensionality of the problem.
        expected: usize,
        /// Number of lower bounds provided.
        lower: usize,
        /// Number of upper bounds provided.
        upper: usize,
    },
    /// Problem-specific evaluation failure.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Search-space metadata shared by synchronous and asynchronous problems.
pub trait ProblemBounds {
    /// Returns the number of decision variables handled by the problem.
    fn dimensions(&self) -> usize;

    /// Returns the lower bounds of the decision variables.
    fn lower_bounds(&self) -> &[f64];

    /// Returns the upper bounds of the decision variables.
    fn upper_bounds(&self) -> &[f64];

    /// Ensures that all bound arrays match the reported dimensionality.
    ///
    /// # Errors
    /// Returns [`ProblemError::BoundsLengthMismatch`] when the bound vectors
    /// do not align with [`Self::dimensions`].
    fn validate_bounds(&self) -> ProblemResult<()> {
        let expected = self.dimensions();
        let lower = self.lower_bounds().len();
        let upper = self.upper_bounds().len();
        if expected != lower || expected != upper {
            return Err(ProblemError::BoundsLengthMismatch {
                expected,
                lower,
                upper,
            });
        }
        Ok(())
    }

    /// Ensures that a candidate with the provided length is valid for the problem.
    ///
    /// # Errors
    /// Returns [`ProblemError::DimensionMismatch`] when the candidate contains
    /// the wrong number of decision variables.
    fn validate_candidate_length(&self, candidate_len: usize) -> ProblemResult<()> {
        let expected = self.dimensions();
        if candidate_len != expected {
            return Err(ProblemError::DimensionMismatch {
                expected,
                found: candidate_len,
            });
        }
        Ok(())
    }

    /// Clamps the provided genes to the feasible domain.
    fn clamp_to_domain(&self, genes: &mut [f64]) {
        for (value, (lower, upper)) in genes
            .iter_mut()
            .zip(self.lower_bounds().iter().zip(self.upper_bounds()))
        {
            *value = value.clamp(*lower, *upper);
        }
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for &mut T {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn lower_bounds(&self) -> &[f64] {
        (**self).lower_bounds()
    }

    fn upper_bounds(&self) -> &[f64] {
        (**self).upper_bounds()
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for Box<T> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn lower_bounds(&self) -> &[f64] {
        (**self).lower_bounds()
    }

    fn upper_bounds(&self) -> &[f64] {
        (**self).upper_bounds()
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for Arc<T> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn lower_bounds(&self) -> &[f64] {
        (**self).lower_bounds()
    }

    fn upper_bounds(&self) -> &[f64] {
        (**self).upper_bounds()
    }
}

/// Synchronous multi-objective problem. All objectives are minimized.
///
/// # Examples
/// ```
/// use moead_stm::ops::{MultiObjectiveProblem, ProblemBounds, ProblemResult};
/// use moead_stm::Solution;
///
/// struct LinearFront;
///
/// impl ProblemBounds for LinearFront {
///     fn dimensions(&self) -> usize { 1 }
///     fn lower_bounds(&self) -> &[f64] { &[0.0] }
///     fn upper_bounds(&self) -> &[f64] { &[1.0] }
/// }
///
/// impl MultiObjectiveProblem for LinearFront {
///     fn objectives(&self) -> usize { 2 }
///     fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
///         Ok(vec![genes[0], 1.0 - genes[0]])
///     }
/// }
///
/// let mut problem = LinearFront;
/// let mut solution = Solution::new(vec![0.25]);
/// problem.evaluate_solution(&mut solution).unwrap();
/// assert_eq!(solution.objectives(), &[0.25, 0.75]);
/// ```
pub trait MultiObjectiveProblem: ProblemBounds {
    /// Returns the number of objectives `M`.
    fn objectives(&self) -> usize;

    /// Computes the objective vector for the provided genes.
    ///
    /// # Errors
    /// Implementations may return [`ProblemError`] to describe domain issues.
    fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>>;

    /// Returns the aggregated constraint violation of the genes. Zero means
    /// feasible; unconstrained problems keep the default.
    ///
    /// # Errors
    /// Implementations may return [`ProblemError`] to describe domain issues.
    fn evaluate_constraints(&mut self, _genes: &[f64]) -> ProblemResult<f64> {
        Ok(0.0)
    }

    /// Evaluates a [`Solution`] in place, filling objectives and constraint
    /// violation.
    ///
    /// # Errors
    /// Propagates any [`ProblemError`] reported by the evaluation routines.
    fn evaluate_solution(&mut self, solution: &mut Solution) -> ProblemResult<()> {
        let objectives = self.evaluate(solution.genes())?;
        let violation = self.evaluate_constraints(solution.genes())?;
        solution.set_objectives(objectives);
        solution.set_constraint_violation(violation);
        Ok(())
    }
}

impl<T: MultiObjectiveProblem + ?Sized> MultiObjectiveProblem for &mut T {
    fn objectives(&self) -> usize {
        (**self).objectives()
    }

    fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
        (**self).evaluate(genes)
    }

    fn evaluate_constraints(&mut self, genes: &[f64]) -> ProblemResult<f64> {
        (**self).evaluate_constraints(genes)
    }
}

impl<T: MultiObjectiveProblem + ?Sized> MultiObjectiveProblem for Box<T> {
    fn objectives(&self) -> usize {
        (**self).objectives()
    }

    fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
        (**self).evaluate(genes)
    }

    fn evaluate_constraints(&mut self, genes: &[f64]) -> ProblemResult<f64> {
        (**self).evaluate_constraints(genes)
    }
}

/// Multi-objective problem evaluated asynchronously, e.g. by a simulator or a
/// remote service.
#[async_trait]
pub trait AsyncMultiObjectiveProblem: ProblemBounds + Send + Sync {
    /// Returns the number of objectives `M`.
    fn objectives(&self) -> usize;

    /// Computes the objective vector asynchronously.
    async fn evaluate_async(&self, genes: &[f64]) -> ProblemResult<Vec<f64>>;

    /// Returns the aggregated constraint violation asynchronously.
    async fn evaluate_constraints_async(&self, _genes: &[f64]) -> ProblemResult<f64> {
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    struct Shifted {
        lower: Vec<f64>,
        upper: Vec<f64>,
    }

    impl Shifted {
        fn new() -> Self {
            Self {
                lower: vec![-1.0, -1.0],
                upper: vec![1.0, 1.0],
            }
        }
    }

    impl ProblemBounds for Shifted {
        fn dimensions(&self) -> usize {
            2
        }

        fn lower_bounds(&self) -> &[f64] {
            &self.lower
        }

        fn upper_bounds(&self) -> &[f64] {
            &self.upper
        }
    }

    impl MultiObjectiveProblem for Shifted {
        fn objectives(&self) -> usize {
            2
        }

        fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
            self.validate_candidate_length(genes.len())?;
            Ok(vec![genes[0] + 1.0, genes[1] + 1.0])
        }

        fn evaluate_constraints(&mut self, genes: &[f64]) -> ProblemResult<f64> {
            Ok((genes[0] + genes[1]).max(0.0))
        }
    }

    #[async_trait]
    impl AsyncMultiObjectiveProblem for Shifted {
        fn objectives(&self) -> usize {
            2
        }

        async fn evaluate_async(&self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
            Ok(genes.iter().map(|value| value * 2.0).collect())
        }
    }

    #[test]
    fn clamp_to_domain_bounds_values() {
        let problem = Shifted::new();
        let mut genes = vec![-2.0, 2.0];
        problem.clamp_to_domain(&mut genes);
        assert_eq!(genes, vec![-1.0, 1.0]);
    }

    #[test]
    fn evaluate_solution_fills_objectives_and_violation() {
        let mut problem = Shifted::new();
        let mut solution = Solution::new(vec![0.5, 0.25]);
        problem.evaluate_solution(&mut solution).unwrap();
        assert_eq!(solution.objectives(), &[1.5, 1.25]);
        assert!((solution.constraint_violation() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn wrong_candidate_length_is_reported() {
        let mut problem = Shifted::new();
        let err = problem.evaluate(&[0.0]).unwrap_err();
        assert_eq!(
            err,
            ProblemError::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn async_default_constraints_are_feasible() {
        let problem = Shifted::new();
        let objectives = block_on(problem.evaluate_async(&[1.0, 2.0])).unwrap();
        assert_eq!(objectives, vec![2.0, 4.0]);
        let violation = block_on(problem.evaluate_constraints_async(&[1.0, 2.0])).unwrap();
        assert_eq!(violation, 0.0);
    }
}
