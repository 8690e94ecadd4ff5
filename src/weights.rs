//! Weight vectors and the neighborhood table built from them.
//!
//! One weight vector defines one subproblem; slot `i` of the population is
//! always aligned with weight `i`. Both structures are built once before the
//! first generation and never change afterwards.

use std::ops::Index;

/// Errors raised while building weight vectors or neighborhoods.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    /// No weight vectors were supplied.
    #[error("at least one weight vector is required")]
    Empty,
    /// A weight vector has the wrong number of components.
    #[error("weight vector {index} has {found} components but {expected} objectives are configured")]
    DimensionMismatch {
        /// Index of the offending vector.
        index: usize,
        /// Number of objectives expected.
        expected: usize,
        /// Number of components found.
        found: usize,
    },
    /// A component was negative or not finite.
    #[error("weight vector {index} component {component} must be finite and non-negative (received {value})")]
    InvalidComponent {
        /// Index of the offending vector.
        index: usize,
        /// Index of the offending component.
        component: usize,
        /// Offending value.
        value: f64,
    },
    /// A line of a weight file could not be parsed.
    #[error("line {line}: could not parse `{token}` as a number")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Token that failed to parse.
        token: String,
    },
    /// The uniform generator was asked for a degenerate lattice.
    #[error("uniform weights need at least one objective and one division (objectives: {objectives}, divisions: {divisions})")]
    InvalidLattice {
        /// Requested number of objectives.
        objectives: usize,
        /// Requested number of divisions.
        divisions: usize,
    },
    /// The neighborhood is larger than the number of subproblems.
    #[error("neighborhood size {size} exceeds the {subproblems} available subproblems")]
    NeighborhoodTooLarge {
        /// Requested neighborhood size `T`.
        size: usize,
        /// Number of subproblems `N`.
        subproblems: usize,
    },
}

/// The fixed set of `N` weight vectors of dimension `M`.
///
/// # Examples
/// ```
/// use moead_stm::WeightVectors;
/// let weights = WeightVectors::uniform(2, 4).unwrap();
/// assert_eq!(weights.len(), 5);
/// assert_eq!(&weights[0], &[0.0, 1.0]);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVectors {
    vectors: Vec<Vec<f64>>,
    objectives: usize,
}

impl WeightVectors {
    /// Validates and wraps `vectors`, each of which must have `objectives`
    /// finite, non-negative components.
    ///
    /// # Errors
    /// Returns [`WeightError`] when the set is empty, a vector has the wrong
    /// dimension, or a component is negative or not finite.
    pub fn new(vectors: Vec<Vec<f64>>, objectives: usize) -> Result<Self, WeightError> {
        if vectors.is_empty() {
            return Err(WeightError::Empty);
        }
        for (index, vector) in vectors.iter().enumerate() {
            if vector.len() != objectives {
                return Err(WeightError::DimensionMismatch {
                    index,
                    expected: objectives,
                    found: vector.len(),
                });
            }
            if let Some((component, &value)) = vector
                .iter()
                .enumerate()
                .find(|(_, value)| !(value.is_finite() && **value >= 0.0))
            {
                return Err(WeightError::InvalidComponent {
                    index,
                    component,
                    value,
                });
            }
        }
        Ok(Self {
            vectors,
            objectives,
        })
    }

    /// Generates the Das-Dennis simplex lattice with `divisions` steps per
    /// axis: `C(H + M - 1, M - 1)` evenly spaced vectors summing to one.
    ///
    /// For `M = 2` the first vector is `[0, 1]` and the last `[1, 0]`.
    ///
    /// # Errors
    /// Returns [`WeightError::InvalidLattice`] when `objectives` or
    /// `divisions` is zero.
    pub fn uniform(objectives: usize, divisions: usize) -> Result<Self, WeightError> {
        if objectives == 0 || divisions == 0 {
            return Err(WeightError::InvalidLattice {
                objectives,
                divisions,
            });
        }
        let mut vectors = Vec::new();
        let mut current = vec![0.0; objectives];
        lattice(divisions, 0, divisions, &mut current, &mut vectors);
        Self::new(vectors, objectives)
    }

    /// Parses whitespace-separated weight vectors, one per line. Blank lines
    /// and lines starting with `#` are skipped.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::WeightVectors;
    /// let weights = WeightVectors::parse("0.0 1.0\n0.5 0.5\n1.0 0.0\n", 2).unwrap();
    /// assert_eq!(weights.len(), 3);
    /// ```
    ///
    /// # Errors
    /// Returns [`WeightError::Parse`] for malformed numbers and any error
    /// from [`Self::new`].
    pub fn parse(text: &str, objectives: usize) -> Result<Self, WeightError> {
        let mut vectors = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let vector = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| WeightError::Parse {
                        line: line_idx + 1,
                        token: token.to_owned(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            vectors.push(vector);
        }
        Self::new(vectors, objectives)
    }

    /// Number of weight vectors `N`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always `false` for a constructed set; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension `M` of every vector.
    #[must_use]
    pub fn objectives(&self) -> usize {
        self.objectives
    }

    /// Returns weight `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        self.vectors.get(index).map(Vec::as_slice)
    }

    /// Iterates over the vectors in subproblem order.
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.vectors.iter().map(Vec::as_slice)
    }

    /// Returns the vectors as owned rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<f64>] {
        &self.vectors
    }
}

impl Index<usize> for WeightVectors {
    type Output = [f64];

    fn index(&self, index: usize) -> &Self::Output {
        &self.vectors[index]
    }
}

#[allow(clippy::cast_precision_loss)]
fn lattice(
    divisions: usize,
    depth: usize,
    remaining: usize,
    current: &mut Vec<f64>,
    out: &mut Vec<Vec<f64>>,
) {
    if depth + 1 == current.len() {
        current[depth] = remaining as f64 / divisions as f64;
        out.push(current.clone());
        return;
    }
    for step in 0..=remaining {
        current[depth] = step as f64 / divisions as f64;
        lattice(divisions, depth + 1, remaining - step, current, out);
    }
}

/// For each subproblem, the `T` subproblems closest in weight space.
///
/// Rows are sorted by ascending Euclidean distance; equal distances keep the
/// lower index first, so a subproblem always lists itself before any
/// duplicate of its own weight.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    table: Vec<Vec<usize>>,
}

impl Neighborhood {
    /// Builds the neighborhood table of size `size` (`T`).
    ///
    /// # Examples
    /// ```
    /// use moead_stm::{Neighborhood, WeightVectors};
    /// let weights = WeightVectors::uniform(2, 4).unwrap();
    /// let neighborhood = Neighborhood::build(&weights, 3).unwrap();
    /// assert_eq!(neighborhood.of(2), &[2, 1, 3]);
    /// ```
    ///
    /// # Errors
    /// Returns [`WeightError::NeighborhoodTooLarge`] when `size > N`.
    pub fn build(weights: &WeightVectors, size: usize) -> Result<Self, WeightError> {
        let subproblems = weights.len();
        if size > subproblems {
            return Err(WeightError::NeighborhoodTooLarge { size, subproblems });
        }
        let table = weights
            .iter()
            .map(|origin| {
                let distances: Vec<f64> = weights
                    .iter()
                    .map(|other| euclidean(origin, other))
                    .collect();
                let mut order: Vec<usize> = (0..subproblems).collect();
                // sort_by is stable, so equal distances keep index order
                order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));
                order.truncate(size);
                order
            })
            .collect();
        Ok(Self { table })
    }

    /// Neighbor indices of `subproblem`, nearest first.
    ///
    /// # Panics
    /// Panics when `subproblem` is out of range.
    #[must_use]
    pub fn of(&self, subproblem: usize) -> &[usize] {
        &self.table[subproblem]
    }

    /// Neighborhood size `T`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.table.first().map_or(0, Vec::len)
    }

    /// Number of rows, one per subproblem.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Indicates whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
