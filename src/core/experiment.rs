//! Run statistics and the experiment payload returned by the engine.
//!
//! The optimizer records one entry per generation so callers can inspect how
//! the reference points tightened and how the population spread out over the
//! run without attaching their own hooks.

/// Time-series metrics captured once per generation.
///
/// # Examples
/// ```
/// use moead_stm::RunStats;
/// let stats = RunStats::new();
/// assert_eq!(stats.generations(), 0);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Ideal point after each generation.
    pub ideal_point: Vec<Vec<f64>>,
    /// Nadir point after each generation.
    pub nadir_point: Vec<Vec<f64>>,
    /// Mean scalarized fitness of the population against its own subproblems.
    pub mean_fitness: Vec<f64>,
    /// Spread of the population in objective space.
    pub objective_diversity: Vec<f64>,
    /// Cumulative evaluation count at the end of each generation.
    pub evaluations: Vec<usize>,
}

impl RunStats {
    /// Creates an empty set of run statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of generations tracked.
    #[must_use]
    pub fn generations(&self) -> usize {
        self.evaluations.len()
    }

    pub(crate) fn record(&mut self, entry: GenerationRecord<'_>) {
        self.ideal_point.push(entry.ideal.to_vec());
        self.nadir_point.push(entry.nadir.to_vec());
        self.mean_fitness.push(entry.mean_fitness);
        self.objective_diversity.push(entry.diversity);
        self.evaluations.push(entry.evaluations);
    }
}

pub(crate) struct GenerationRecord<'a> {
    pub(crate) ideal: &'a [f64],
    pub(crate) nadir: &'a [f64],
    pub(crate) mean_fitness: f64,
    pub(crate) diversity: f64,
    pub(crate) evaluations: usize,
}

/// Metadata describing an executed run.
///
/// # Examples
/// ```
/// use moead_stm::ExperimentMetadata;
/// let metadata = ExperimentMetadata::new(10, 1_200, Some(7), "StdRng");
/// assert_eq!(metadata.generations, 10);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ExperimentMetadata {
    /// Number of generations executed.
    pub generations: usize,
    /// Number of objective evaluations performed, including initialization.
    pub evaluations: usize,
    /// Optional RNG seed recorded by the caller.
    pub rng_seed: Option<u64>,
    /// Human readable description of the RNG used for the run.
    pub rng_description: String,
}

impl ExperimentMetadata {
    /// Creates a new metadata record.
    #[must_use]
    pub fn new(
        generations: usize,
        evaluations: usize,
        rng_seed: Option<u64>,
        rng_description: impl Into<String>,
    ) -> Self {
        Self {
            generations,
            evaluations,
            rng_seed,
            rng_description: rng_description.into(),
        }
    }
}

/// Detached copy of a solution's decision variables and objectives.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionSnapshot {
    /// Decision variables.
    pub genes: Vec<f64>,
    /// Objective values.
    pub objectives: Vec<f64>,
}

impl SolutionSnapshot {
    /// Creates a snapshot from genes and objectives.
    #[must_use]
    pub fn new(genes: Vec<f64>, objectives: Vec<f64>) -> Self {
        Self { genes, objectives }
    }
}

impl From<&crate::core::Solution> for SolutionSnapshot {
    fn from(solution: &crate::core::Solution) -> Self {
        Self::new(solution.genes().to_vec(), solution.objectives().to_vec())
    }
}

/// Complete experiment payload.
///
/// # Examples
/// ```
/// use moead_stm::{ExperimentMetadata, ExperimentResult, RunStats, SolutionSnapshot};
/// let result = ExperimentResult {
///     final_population: vec![SolutionSnapshot::new(vec![0.0], vec![0.0, 1.0])],
///     knee: None,
///     stats: RunStats::new(),
///     metadata: ExperimentMetadata::new(1, 10, None, "rng"),
/// };
/// assert_eq!(result.final_population.len(), 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    /// Final population, slot `i` matched to subproblem `i`.
    pub final_population: Vec<SolutionSnapshot>,
    /// Knee solution of the final population, when one could be identified.
    pub knee: Option<SolutionSnapshot>,
    /// Per-generation metrics.
    pub stats: RunStats,
    /// Execution metadata.
    pub metadata: ExperimentMetadata,
}

/// Root-mean-square deviation of the rows returned by `at` from their centroid.
pub(crate) fn diversity_by<'a, F>(size: usize, mut at: F) -> f64
where
    F: FnMut(usize) -> &'a [f64],
{
    if size == 0 {
        return 0.0;
    }
    let dimensions = at(0).len();
    if dimensions == 0 {
        return 0.0;
    }
    let mut means = vec![0.0; dimensions];
    #[allow(clippy::cast_precision_loss)]
    let count = size as f64;
    for idx in 0..size {
        for (dimension, value) in at(idx).iter().enumerate() {
            means[dimension] += *value;
        }
    }
    for mean in &mut means {
        *mean /= count;
    }
    let mut total_variance = 0.0;
    for idx in 0..size {
        for (dimension, value) in at(idx).iter().enumerate() {
            let diff = value - means[dimension];
            total_variance += (diff * diff) / count;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let per_dimension = total_variance / dimensions as f64;
    per_dimension.sqrt()
}
