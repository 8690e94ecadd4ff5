//! Core solution and population primitives.
//!
//! The optimizer treats every candidate as a value: it reads objective values,
//! writes a scalar fitness, and copies solutions between population slots
//! instead of sharing them. The types here carry exactly that state and keep
//! the decision variables opaque to the selection engine.

pub mod experiment;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// A candidate solution: decision variables, objective values, and the
/// scalar fitness most recently assigned by a scalarizing function.
///
/// # Examples
/// ```
/// use moead_stm::Solution;
/// let solution = Solution::with_objectives(vec![0.25], vec![0.25, 0.75]);
/// assert_eq!(solution.objectives(), &[0.25, 0.75]);
/// assert_eq!(solution.number_of_objectives(), 2);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    genes: Vec<f64>,
    objectives: Vec<f64>,
    fitness: f64,
    constraint_violation: f64,
}

impl Solution {
    /// Creates an unevaluated solution from raw decision variables.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::Solution;
    /// let solution = Solution::new(vec![0.0, 1.0]);
    /// assert!(!solution.is_evaluated());
    /// ```
    #[must_use]
    pub fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            objectives: Vec::new(),
            fitness: 0.0,
            constraint_violation: 0.0,
        }
    }

    /// Creates a solution whose objectives are already known.
    #[must_use]
    pub fn with_objectives(genes: Vec<f64>, objectives: Vec<f64>) -> Self {
        Self {
            genes,
            objectives,
            fitness: 0.0,
            constraint_violation: 0.0,
        }
    }

    /// Samples decision variables uniformly within the provided bounds.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::Solution;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    /// let solution = Solution::random_with_bounds(&[0.0, -1.0], &[1.0, 1.0], &mut rng).unwrap();
    /// assert_eq!(solution.genes().len(), 2);
    /// ```
    ///
    /// # Errors
    /// Returns [`BoundsError`] when the bounds have mismatched lengths or when
    /// any lower bound exceeds the corresponding upper bound.
    pub fn random_with_bounds(
        lower_bounds: &[f64],
        upper_bounds: &[f64],
        rng: &mut impl Rng,
    ) -> Result<Self, BoundsError> {
        validate_bounds(lower_bounds, upper_bounds)?;
        let mut genes = Vec::with_capacity(lower_bounds.len());
        for (idx, (&lower, &upper)) in lower_bounds.iter().zip(upper_bounds).enumerate() {
            if !(lower.is_finite() && upper.is_finite()) {
                return Err(BoundsError::InvalidRange {
                    dimension: idx,
                    lower,
                    upper,
                });
            }
            let sampler = Uniform::new_inclusive(lower, upper);
            genes.push(sampler.sample(rng).clamp(lower, upper));
        }
        Ok(Self::new(genes))
    }

    /// Returns the decision variables.
    #[must_use]
    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    /// Returns the objective vector. Empty until the solution is evaluated.
    #[must_use]
    pub fn objectives(&self) -> &[f64] {
        &self.objectives
    }

    /// Returns the number of objective values stored on the solution.
    #[must_use]
    pub fn number_of_objectives(&self) -> usize {
        self.objectives.len()
    }

    /// Indicates whether objective values have been assigned.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        !self.objectives.is_empty()
    }

    /// Replaces the objective vector.
    pub fn set_objectives(&mut self, objectives: Vec<f64>) {
        self.objectives = objectives;
    }

    /// Returns the last scalar fitness assigned to the solution. Lower is better.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Assigns a scalar fitness.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::Solution;
    /// let mut solution = Solution::new(vec![0.0]);
    /// solution.set_fitness(2.5);
    /// assert_eq!(solution.fitness(), 2.5);
    /// ```
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Returns the aggregated constraint violation reported by the problem.
    #[must_use]
    pub fn constraint_violation(&self) -> f64 {
        self.constraint_violation
    }

    /// Stores the aggregated constraint violation.
    pub fn set_constraint_violation(&mut self, violation: f64) {
        self.constraint_violation = violation;
    }
}

/// Ordered, fixed-size collection of solutions, one slot per subproblem.
///
/// # Examples
/// ```
/// use moead_stm::{Population, Solution};
/// let mut population = Population::empty();
/// population.push(Solution::with_objectives(vec![0.0], vec![0.0, 1.0]));
/// assert_eq!(population.len(), 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Population {
    solutions: Vec<Solution>,
}

impl Population {
    /// Creates an empty population.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            solutions: Vec::new(),
        }
    }

    /// Creates an empty population with room for `capacity` solutions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            solutions: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of solutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Indicates whether the population is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Appends a solution.
    pub fn push(&mut self, solution: Solution) {
        self.solutions.push(solution);
    }

    /// Returns the solution stored at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Solution> {
        self.solutions.get(index)
    }

    /// Returns the solutions as a slice.
    #[must_use]
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Returns the solutions mutably.
    pub fn solutions_mut(&mut self) -> &mut [Solution] {
        &mut self.solutions
    }

    /// Iterates over the solutions in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Solution> {
        self.solutions.iter()
    }

    /// Builds the union pool of this population followed by `offspring`.
    ///
    /// Solutions are copied so the pool never aliases population slots.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::{Population, Solution};
    /// let population: Population = vec![Solution::new(vec![0.0])].into();
    /// let pool = population.union(&[Solution::new(vec![1.0])]);
    /// assert_eq!(pool.len(), 2);
    /// ```
    #[must_use]
    pub fn union(&self, offspring: &[Solution]) -> Vec<Solution> {
        let mut pool = Vec::with_capacity(self.solutions.len() + offspring.len());
        pool.extend_from_slice(&self.solutions);
        pool.extend_from_slice(offspring);
        pool
    }

    /// Returns the objective vectors of every solution, in slot order.
    #[must_use]
    pub fn objectives(&self) -> Vec<Vec<f64>> {
        self.solutions
            .iter()
            .map(|solution| solution.objectives().to_vec())
            .collect()
    }
}

impl From<Vec<Solution>> for Population {
    fn from(solutions: Vec<Solution>) -> Self {
        Self { solutions }
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Solution;
    type IntoIter = std::slice::Iter<'a, Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}

/// Error returned when invalid decision-variable bounds are provided.
///
/// # Examples
/// ```
/// use moead_stm::Solution;
/// let mut rng = rand::thread_rng();
/// let err = Solution::random_with_bounds(&[0.0, 0.0], &[1.0], &mut rng).unwrap_err();
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    /// The number of bounds entries does not match the expected dimensionality.
    #[error("dimension mismatch: expected {expected} bounds entries but found {found}")]
    DimensionMismatch {
        /// Number of dimensions specified by the caller.
        expected: usize,
        /// Number of bounds entries actually provided.
        found: usize,
    },
    /// One of the dimensions has an invalid lower/upper pairing.
    #[error("invalid bounds for dimension {dimension} (lower: {lower}, upper: {upper})")]
    InvalidRange {
        /// The index of the problematic dimension.
        dimension: usize,
        /// The invalid lower bound value.
        lower: f64,
        /// The invalid upper bound value.
        upper: f64,
    },
}

pub(crate) fn validate_bounds(
    lower_bounds: &[f64],
    upper_bounds: &[f64],
) -> Result<(), BoundsError> {
    if lower_bounds.len() != upper_bounds.len() {
        return Err(BoundsError::DimensionMismatch {
            expected: lower_bounds.len(),
            found: upper_bounds.len(),
        });
    }
    for (idx, (lower, upper)) in lower_bounds.iter().zip(upper_bounds.iter()).enumerate() {
        if lower > upper {
            return Err(BoundsError::InvalidRange {
                dimension: idx,
                lower: *lower,
                upper: *upper,
            });
        }
    }
    Ok(())
}
