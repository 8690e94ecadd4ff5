//! Variation operators, selection operators, and problem abstractions.
//!
//! These are the capabilities the optimizer consumes from the outside world:
//! a problem to evaluate, a crossover and a mutation to produce offspring, and
//! a selection operator used when choosing which subproblems get offspring.

pub mod crossover;
pub mod mutation;
pub mod problem;
pub mod selection;

pub use crossover::{CrossoverOperator, DifferentialEvolutionCrossover, SimulatedBinaryCrossover};
pub use mutation::{MutationOperator, PolynomialMutation};
pub use problem::{
    AsyncMultiObjectiveProblem, MultiObjectiveProblem, ProblemBounds, ProblemError, ProblemResult,
};
pub use selection::{SelectionOperator, UtilityTournament};

/// Errors reported when an operator is constructed with invalid parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    /// A distribution index was non-positive or not finite.
    #[error("{operator} distribution index must be positive (received {value})")]
    InvalidDistributionIndex {
        /// Operator reporting the error.
        operator: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A probability was outside `[0, 1]`.
    #[error("{operator} probability must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Operator reporting the error.
        operator: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Any other operator parameter failed validation.
    #[error("{operator} parameter {parameter} was invalid (received {value})")]
    InvalidParameter {
        /// Operator reporting the error.
        operator: &'static str,
        /// Name of the invalid parameter.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Bounds supplied to the operator were inconsistent.
    #[error(transparent)]
    Bounds(#[from] crate::core::BoundsError),
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn random_unit(rng: &mut dyn rand::RngCore) -> f64 {
    let value = (rng.next_u64() >> 11) as f64;
    value / (1_u64 << 53) as f64
}

pub(crate) fn random_index(len: usize, rng: &mut dyn rand::RngCore) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let scaled = (random_unit(rng) * len as f64) as usize;
    scaled % len.max(1)
}
