//! MOEA/D with stable-matching environmental selection.
//!
//! The [`MoeadStm`] engine decomposes a multi-objective problem into one
//! scalar subproblem per weight vector. Each generation a utility-driven
//! subset of subproblems produces one offspring each; the offspring and the
//! current population form a pool from which a stable matching between
//! subproblems and pool members picks the next population.
//!
//! The engine is configured through [`MoeadStmBuilder`], which defaults to
//! differential-evolution crossover and polynomial mutation.

use crate::core::experiment::{
    diversity_by, ExperimentMetadata, ExperimentResult, GenerationRecord, RunStats,
};
use crate::core::{BoundsError, Population, Solution};
use crate::evaluation::{EvaluationError, ObjectiveEvaluator};
use crate::knee::knee_point;
use crate::matching::{MatchingError, StableMatchingSelector};
use crate::mating::MatingSelector;
use crate::ops::{
    CrossoverOperator, DifferentialEvolutionCrossover, MutationOperator, OperatorError,
    PolynomialMutation, ProblemError, UtilityTournament,
};
use crate::reference::ReferencePoints;
use crate::scalarize::Scalarization;
use crate::utility::UtilityTracker;
use crate::weights::{Neighborhood, WeightError, WeightVectors};
use rand::Rng;
use tracing::{debug, info};

const DEFAULT_DE_CROSSOVER_RATE: f64 = 1.0;
const DEFAULT_DE_SCALE_FACTOR: f64 = 0.5;
const DEFAULT_POLY_ETA: f64 = 20.0;
const DEFAULT_POPULATION_SIZE: usize = 100;
const DEFAULT_NEIGHBORHOOD_SIZE: usize = 20;

/// Tunable parameters of a run. The population size is not part of the
/// configuration: it always equals the number of weight vectors.
///
/// # Examples
/// ```
/// use moead_stm::{MoeadStmConfig, Scalarization};
/// let config = MoeadStmConfig {
///     scalarization: Scalarization::pbi(),
///     max_evaluations: 2_000,
///     ..MoeadStmConfig::default()
/// };
/// assert_eq!(config.neighborhood_size, 20);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MoeadStmConfig {
    /// Neighborhood size `T`.
    pub neighborhood_size: usize,
    /// Probability `δ` of mating within the neighborhood.
    pub neighborhood_probability: f64,
    /// Candidates drawn per utility tournament.
    pub tournament_depth: usize,
    /// Generations between utility recomputations (`K`).
    pub utility_period: usize,
    /// Evaluation budget; the run stops after the first generation that
    /// exceeds it.
    pub max_evaluations: usize,
    /// Scalarizing function shared by every subproblem.
    pub scalarization: Scalarization,
    /// Share of subproblems that receive an offspring each generation.
    pub selection_fraction: f64,
}

impl Default for MoeadStmConfig {
    fn default() -> Self {
        Self {
            neighborhood_size: DEFAULT_NEIGHBORHOOD_SIZE,
            neighborhood_probability: 0.9,
            tournament_depth: 10,
            utility_period: 30,
            max_evaluations: 10_000,
            scalarization: Scalarization::default(),
            selection_fraction: 0.2,
        }
    }
}

/// Errors produced by the [`MoeadStm`] engine.
#[derive(Debug, thiserror::Error)]
pub enum MoeadStmError {
    /// The population is too small for the configured operators.
    #[error("population size {0} is too small for the configured crossover")]
    InvalidPopulationSize(usize),
    /// No weight vectors were configured and none can be derived.
    #[error("weight vectors must be supplied for {objectives} objectives")]
    MissingWeights {
        /// Number of objectives of the problem.
        objectives: usize,
    },
    /// The number of weight vectors differs from the requested population size.
    #[error("expected {expected} weight vectors but {found} were supplied")]
    WeightCountMismatch {
        /// Requested population size.
        expected: usize,
        /// Number of weight vectors supplied.
        found: usize,
    },
    /// A weight vector's dimension differs from the number of objectives.
    #[error("weight vector {index} has {found} components but the problem has {expected} objectives")]
    WeightDimensionMismatch {
        /// Index of the offending vector.
        index: usize,
        /// Number of objectives.
        expected: usize,
        /// Number of components found.
        found: usize,
    },
    /// A weight component was negative or not finite.
    #[error("weight vector {index} component {component} is invalid ({value})")]
    InvalidWeight {
        /// Index of the offending vector.
        index: usize,
        /// Index of the offending component.
        component: usize,
        /// Offending value.
        value: f64,
    },
    /// Weight vectors could not be generated or parsed.
    #[error(transparent)]
    Weights(WeightError),
    /// The neighborhood size was zero.
    #[error("neighborhood size must be positive (received {0})")]
    InvalidNeighborhoodSize(usize),
    /// The neighborhood is larger than the population.
    #[error("neighborhood size {size} exceeds the {subproblems} subproblems")]
    NeighborhoodTooLarge {
        /// Requested neighborhood size `T`.
        size: usize,
        /// Number of subproblems `N`.
        subproblems: usize,
    },
    /// A probability-like parameter was outside `[0, 1]`.
    #[error("{parameter} must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Name of the parameter.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The tournament depth was zero.
    #[error("tournament depth must be positive (received {0})")]
    InvalidTournamentDepth(usize),
    /// The utility period was zero.
    #[error("utility period must be positive (received {0})")]
    InvalidUtilityPeriod(usize),
    /// The evaluation budget was zero.
    #[error("evaluation budget must be positive (received {0})")]
    InvalidEvaluationBudget(usize),
    /// The PBI penalty was negative or not finite.
    #[error("PBI penalty must be finite and non-negative (received {0})")]
    InvalidPenalty(f64),
    /// A default operator rejected its parameters.
    #[error(transparent)]
    Operator(#[from] OperatorError),
    /// The problem reported inconsistent bounds.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    /// A subproblem could not be matched during selection.
    #[error("subproblem {subproblem} could not be matched to any solution")]
    UnmatchedSubproblem {
        /// Index of the unmatched subproblem.
        subproblem: usize,
    },
    /// The selection pool had fewer members than subproblems.
    #[error("selection pool of {pool} solutions is smaller than the {subproblems} subproblems")]
    PoolTooSmall {
        /// Pool size.
        pool: usize,
        /// Number of subproblems.
        subproblems: usize,
    },
    /// The problem reported an error.
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// The problem returned a different number of objectives than advertised.
    #[error("problem reported {found} objectives but advertised {expected}")]
    ObjectiveCountMismatch {
        /// Number of objectives advertised by the problem.
        expected: usize,
        /// Number of objectives returned by the evaluator.
        found: usize,
    },
    /// The evaluator returned a different number of results than candidates.
    #[error("evaluator returned {found} results for a batch of {expected} candidates")]
    EvaluationCountMismatch {
        /// Number of candidates in the batch.
        expected: usize,
        /// Number of evaluations returned.
        found: usize,
    },
    /// The evaluation backend failed.
    #[error(transparent)]
    Evaluation(EvaluationError),
}

impl From<WeightError> for MoeadStmError {
    fn from(err: WeightError) -> Self {
        match err {
            WeightError::DimensionMismatch {
                index,
                expected,
                found,
            } => Self::WeightDimensionMismatch {
                index,
                expected,
                found,
            },
            WeightError::InvalidComponent {
                index,
                component,
                value,
            } => Self::InvalidWeight {
                index,
                component,
                value,
            },
            WeightError::NeighborhoodTooLarge { size, subproblems } => {
                Self::NeighborhoodTooLarge { size, subproblems }
            }
            other => Self::Weights(other),
        }
    }
}

impl From<MatchingError> for MoeadStmError {
    fn from(err: MatchingError) -> Self {
        match err {
            MatchingError::PoolTooSmall { pool, subproblems } => {
                Self::PoolTooSmall { pool, subproblems }
            }
            MatchingError::UnmatchedSubproblem { subproblem }
            | MatchingError::PreferenceOutOfRange { subproblem, .. } => {
                Self::UnmatchedSubproblem { subproblem }
            }
        }
    }
}

impl From<EvaluationError> for MoeadStmError {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::Problem(err) => Self::Problem(err),
            other => Self::Evaluation(other),
        }
    }
}

/// Report returned by [`MoeadStm::run`].
///
/// # Examples
/// ```
/// use moead_stm::{MoeadStm, MultiObjectiveProblem};
/// use moead_stm::ops::{ProblemBounds, ProblemResult};
/// use rand::SeedableRng;
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
///
///     fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
///         Ok(vec![genes[0], 1.0 - genes[0]])
///     }
/// }
///
/// let mut engine = MoeadStm::builder(LinearFront)
///     .uniform_weights(9)
///     .max_evaluations(200)
///     .build()
///     .unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let report = engine.run(&mut rng).unwrap();
/// assert_eq!(report.population.len(), 10);
/// assert!(report.evaluations > 200);
/// ```
#[derive(Debug, Clone)]
pub struct MoeadStmReport {
    /// Final population; slot `i` is matched to subproblem `i`.
    pub population: Population,
    /// Knee solution of the final population.
    pub knee: Option<Solution>,
    /// Ideal and nadir points at termination.
    pub reference_points: ReferencePoints,
    /// Number of generations executed.
    pub generations: usize,
    /// Number of evaluations consumed, initial population included.
    pub evaluations: usize,
    /// Per-generation statistics.
    pub stats: RunStats,
}

impl MoeadStmReport {
    /// Detaches the report into an [`ExperimentResult`], tagging it with the
    /// RNG used for the run.
    #[must_use]
    pub fn into_experiment(
        self,
        rng_seed: Option<u64>,
        rng_description: impl Into<String>,
    ) -> ExperimentResult {
        ExperimentResult {
            final_population: self.population.iter().map(Into::into).collect(),
            knee: self.knee.as_ref().map(Into::into),
            stats: self.stats,
            metadata: ExperimentMetadata::new(
                self.generations,
                self.evaluations,
                rng_seed,
                rng_description,
            ),
        }
    }
}

enum WeightSource {
    Default,
    Vectors(Vec<Vec<f64>>),
    Uniform(usize),
}

/// Builder used to configure a [`MoeadStm`] engine.
pub struct MoeadStmBuilder<E> {
    evaluator: E,
    weights: WeightSource,
    population_size: Option<usize>,
    config: MoeadStmConfig,
    neighborhood_explicit: bool,
    crossover: Option<Box<dyn CrossoverOperator>>,
    mutation: Option<Box<dyn MutationOperator>>,
}

impl<E> MoeadStmBuilder<E>
where
    E: ObjectiveEvaluator,
{
    /// Supplies the weight vectors explicitly; one subproblem per vector.
    #[must_use]
    pub fn weights(mut self, vectors: Vec<Vec<f64>>) -> Self {
        self.weights = WeightSource::Vectors(vectors);
        self
    }

    /// Generates Das-Dennis weight vectors with `divisions` steps per axis.
    #[must_use]
    pub fn uniform_weights(mut self, divisions: usize) -> Self {
        self.weights = WeightSource::Uniform(divisions);
        self
    }

    /// Sets the population size. With explicit weights it must match their
    /// count; without them a bi-objective problem gets an evenly spaced set.
    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Sets the neighborhood size `T`.
    #[must_use]
    pub fn neighborhood_size(mut self, size: usize) -> Self {
        self.config.neighborhood_size = size;
        self.neighborhood_explicit = true;
        self
    }

    /// Sets the probability `δ` of mating within the neighborhood.
    #[must_use]
    pub fn neighborhood_probability(mut self, probability: f64) -> Self {
        self.config.neighborhood_probability = probability;
        self
    }

    /// Sets the utility tournament depth.
    #[must_use]
    pub fn tournament_depth(mut self, depth: usize) -> Self {
        self.config.tournament_depth = depth;
        self
    }

    /// Sets the number of generations between utility recomputations.
    #[must_use]
    pub fn utility_period(mut self, generations: usize) -> Self {
        self.config.utility_period = generations;
        self
    }

    /// Sets the evaluation budget.
    #[must_use]
    pub fn max_evaluations(mut self, evaluations: usize) -> Self {
        self.config.max_evaluations = evaluations;
        self
    }

    /// Selects the scalarizing function.
    #[must_use]
    pub fn scalarization(mut self, scheme: Scalarization) -> Self {
        self.config.scalarization = scheme;
        self
    }

    /// Sets the share of subproblems that receive an offspring each generation.
    #[must_use]
    pub fn selection_fraction(mut self, fraction: f64) -> Self {
        self.config.selection_fraction = fraction;
        self
    }

    /// Replaces every tunable parameter at once.
    ///
    /// The neighborhood size is taken as given: unlike the builder default,
    /// a size larger than the population fails [`build`](Self::build) with
    /// [`MoeadStmError::NeighborhoodTooLarge`] instead of being clamped.
    #[must_use]
    pub fn config(mut self, config: MoeadStmConfig) -> Self {
        self.neighborhood_explicit = true;
        self.config = config;
        self
    }

    /// Replaces the crossover operator.
    #[must_use]
    pub fn crossover(mut self, operator: impl CrossoverOperator + 'static) -> Self {
        self.crossover = Some(Box::new(operator));
        self
    }

    /// Replaces the mutation operator.
    #[must_use]
    pub fn mutation(mut self, operator: impl MutationOperator + 'static) -> Self {
        self.mutation = Some(Box::new(operator));
        self
    }

    /// Finalizes the builder into a [`MoeadStm`] engine.
    ///
    /// # Errors
    /// Returns [`MoeadStmError`] when the configuration is invalid, when the
    /// weight vectors do not fit the problem, or when the default operators
    /// fail validation.
    pub fn build(self) -> Result<MoeadStm<E>, MoeadStmError> {
        let evaluator = self.evaluator;
        evaluator.validate_bounds()?;
        let objectives = evaluator.number_of_objectives();
        if objectives == 0 {
            return Err(MoeadStmError::ObjectiveCountMismatch {
                expected: 1,
                found: 0,
            });
        }

        let weights = match self.weights {
            WeightSource::Vectors(vectors) => WeightVectors::new(vectors, objectives)?,
            WeightSource::Uniform(divisions) => WeightVectors::uniform(objectives, divisions)?,
            WeightSource::Default if objectives == 2 => {
                let size = self.population_size.unwrap_or(DEFAULT_POPULATION_SIZE);
                if size < 2 {
                    return Err(MoeadStmError::InvalidPopulationSize(size));
                }
                WeightVectors::uniform(2, size - 1)?
            }
            WeightSource::Default => return Err(MoeadStmError::MissingWeights { objectives }),
        };
        let subproblems = weights.len();
        if let Some(expected) = self.population_size {
            if expected != subproblems {
                return Err(MoeadStmError::WeightCountMismatch {
                    expected,
                    found: subproblems,
                });
            }
        }

        let mut config = self.config;
        validate_config(&config)?;
        if !self.neighborhood_explicit {
            config.neighborhood_size = config.neighborhood_size.min(subproblems);
        }
        let neighborhood = Neighborhood::build(&weights, config.neighborhood_size)?;

        let crossover: Box<dyn CrossoverOperator> = match self.crossover {
            Some(operator) => operator,
            None => Box::new(DifferentialEvolutionCrossover::new(
                DEFAULT_DE_CROSSOVER_RATE,
                DEFAULT_DE_SCALE_FACTOR,
            )?),
        };
        let mutation: Box<dyn MutationOperator> = if let Some(operator) = self.mutation {
            operator
        } else {
            let dimensions = evaluator.dimensions();
            #[allow(clippy::cast_precision_loss)]
            let probability = if dimensions == 0 {
                1.0
            } else {
                1.0 / dimensions as f64
            };
            Box::new(PolynomialMutation::new(
                evaluator.lower_bounds().to_vec(),
                evaluator.upper_bounds().to_vec(),
                DEFAULT_POLY_ETA,
                probability,
            )?)
        };
        let parents_drawn = drawn_parents(crossover.parents_required());
        if subproblems < parents_drawn.max(1) {
            return Err(MoeadStmError::InvalidPopulationSize(subproblems));
        }

        let tournament = UtilityTournament::new(config.tournament_depth)
            .ok_or(MoeadStmError::InvalidTournamentDepth(config.tournament_depth))?;
        let mating = MatingSelector::new(
            tournament,
            config.neighborhood_probability,
            config.selection_fraction,
        );
        let selector = StableMatchingSelector::new(config.scalarization);

        Ok(MoeadStm {
            evaluator,
            objectives,
            weights,
            neighborhood,
            config,
            crossover,
            mutation,
            mating,
            selector,
        })
    }
}

fn validate_config(config: &MoeadStmConfig) -> Result<(), MoeadStmError> {
    if config.neighborhood_size == 0 {
        return Err(MoeadStmError::InvalidNeighborhoodSize(0));
    }
    for (parameter, value) in [
        ("neighborhood probability", config.neighborhood_probability),
        ("selection fraction", config.selection_fraction),
    ] {
        if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
            return Err(MoeadStmError::InvalidProbability { parameter, value });
        }
    }
    if config.tournament_depth == 0 {
        return Err(MoeadStmError::InvalidTournamentDepth(0));
    }
    if config.utility_period == 0 {
        return Err(MoeadStmError::InvalidUtilityPeriod(0));
    }
    if config.max_evaluations == 0 {
        return Err(MoeadStmError::InvalidEvaluationBudget(0));
    }
    if let Scalarization::Pbi { theta } = config.scalarization {
        if !(theta.is_finite() && theta >= 0.0) {
            return Err(MoeadStmError::InvalidPenalty(theta));
        }
    }
    Ok(())
}

/// Parents drawn by mating selection. Three-parent operators take the
/// subproblem's own representative as the last parent.
fn drawn_parents(required: usize) -> usize {
    if required >= 3 {
        required - 1
    } else {
        required
    }
}

/// MOEA/D-STM engine for multi-objective real-coded optimization.
pub struct MoeadStm<E> {
    evaluator: E,
    objectives: usize,
    weights: WeightVectors,
    neighborhood: Neighborhood,
    config: MoeadStmConfig,
    crossover: Box<dyn CrossoverOperator>,
    mutation: Box<dyn MutationOperator>,
    mating: MatingSelector<UtilityTournament>,
    selector: StableMatchingSelector,
}

impl<E> MoeadStm<E>
where
    E: ObjectiveEvaluator,
{
    /// Creates a builder used to configure the engine.
    #[must_use]
    pub fn builder(evaluator: E) -> MoeadStmBuilder<E> {
        MoeadStmBuilder {
            evaluator,
            weights: WeightSource::Default,
            population_size: None,
            config: MoeadStmConfig::default(),
            neighborhood_explicit: false,
            crossover: None,
            mutation: None,
        }
    }

    /// Effective configuration, with the neighborhood size already clamped.
    #[must_use]
    pub fn config(&self) -> &MoeadStmConfig {
        &self.config
    }

    /// Weight vectors, one per subproblem.
    #[must_use]
    pub fn weights(&self) -> &WeightVectors {
        &self.weights
    }

    /// Neighborhood table built from the weights.
    #[must_use]
    pub fn neighborhood(&self) -> &Neighborhood {
        &self.neighborhood
    }

    /// Runs until the evaluation budget is exceeded.
    ///
    /// # Errors
    /// Returns [`MoeadStmError`] when evaluation fails, when the problem
    /// returns the wrong number of objectives, or when stable matching cannot
    /// assign every subproblem.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Result<MoeadStmReport, MoeadStmError> {
        let subproblems = self.weights.len();
        let scheme = self.config.scalarization;
        info!(
            subproblems,
            objectives = self.objectives,
            neighborhood = self.config.neighborhood_size,
            scheme = %scheme,
            max_evaluations = self.config.max_evaluations,
            "starting MOEA/D-STM run"
        );

        let mut population = self.initialize_population(rng)?;
        let mut evaluations = population.len();
        let mut points = ReferencePoints::from_solutions(self.objectives, &population);
        for (idx, solution) in population.solutions_mut().iter_mut().enumerate() {
            let fitness = scheme.fitness(solution.objectives(), &self.weights[idx], &points);
            solution.set_fitness(fitness);
        }
        let mut utility = UtilityTracker::new(&population);
        let mut stats = RunStats::new();
        let parents_drawn = drawn_parents(self.crossover.parents_required());
        let include_current = self.crossover.parents_required() >= 3;
        let mut generation = 0_usize;

        loop {
            let order = self.mating.select_subproblems(utility.values(), self.objectives, rng);
            let mut candidates = Vec::with_capacity(order.len());
            for &subproblem in &order {
                let mode = self.mating.choose_mode(rng);
                let mut parents =
                    self.mating
                        .mating_selection(subproblem, parents_drawn, mode, &self.neighborhood, rng);
                if include_current {
                    parents.push(subproblem);
                }
                let parent_genes: Vec<&[f64]> = parents
                    .iter()
                    .map(|&idx| population.solutions()[idx].genes())
                    .collect();
                let mut child = self.crossover.crossover(&parent_genes, rng);
                self.mutation.mutate(&mut child, rng);
                self.evaluator.clamp_to_domain(&mut child);
                candidates.push(child);
            }

            let offspring = self.evaluate(candidates)?;
            evaluations += offspring.len();
            for child in &offspring {
                points.update(child.objectives());
            }

            let pool = population.union(&offspring);
            population = self.selector.select(pool, &self.weights, &points)?;
            generation += 1;

            if generation % self.config.utility_period == 0 {
                utility.recompute(&population, &self.weights, &scheme, &points);
                let saturated = utility.values().iter().filter(|&&u| u >= 1.0).count();
                debug!(generation, saturated, mean = utility.mean(), "recomputed utilities");
            }

            stats.record(GenerationRecord {
                ideal: points.ideal(),
                nadir: points.nadir(),
                mean_fitness: mean_fitness(&population),
                diversity: objective_diversity(&population),
                evaluations,
            });
            debug!(
                generation,
                evaluations,
                selected = order.len(),
                ideal = ?points.ideal(),
                "generation complete"
            );

            if evaluations > self.config.max_evaluations {
                break;
            }
        }

        let knee = knee_point(population.solutions())
            .and_then(|idx| population.get(idx))
            .cloned();
        info!(generations = generation, evaluations, "MOEA/D-STM run finished");
        Ok(MoeadStmReport {
            population,
            knee,
            reference_points: points,
            generations: generation,
            evaluations,
            stats,
        })
    }

    fn initialize_population<R: Rng>(&mut self, rng: &mut R) -> Result<Population, MoeadStmError> {
        let mut candidates = Vec::with_capacity(self.weights.len());
        for _ in 0..self.weights.len() {
            let solution = Solution::random_with_bounds(
                self.evaluator.lower_bounds(),
                self.evaluator.upper_bounds(),
                rng,
            )?;
            candidates.push(solution.genes().to_vec());
        }
        Ok(self.evaluate(candidates)?.into())
    }

    fn evaluate(&mut self, candidates: Vec<Vec<f64>>) -> Result<Vec<Solution>, MoeadStmError> {
        let evaluations = self.evaluator.evaluate_batch(&candidates)?;
        if evaluations.len() != candidates.len() {
            return Err(MoeadStmError::EvaluationCountMismatch {
                expected: candidates.len(),
                found: evaluations.len(),
            });
        }
        let mut solutions = Vec::with_capacity(candidates.len());
        for (genes, evaluation) in candidates.into_iter().zip(evaluations) {
            if evaluation.objectives.len() != self.objectives {
                return Err(MoeadStmError::ObjectiveCountMismatch {
                    expected: self.objectives,
                    found: evaluation.objectives.len(),
                });
            }
            let mut solution = Solution::with_objectives(genes, evaluation.objectives);
            solution.set_constraint_violation(evaluation.constraint_violation);
            solutions.push(solution);
        }
        Ok(solutions)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_fitness(population: &Population) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(Solution::fitness).sum::<f64>() / population.len() as f64
}

fn objective_diversity(population: &Population) -> f64 {
    let solutions = population.solutions();
    diversity_by(solutions.len(), move |idx| solutions[idx].objectives())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{Evaluation, EvaluationResult};
    use crate::ops::{
        MultiObjectiveProblem, ProblemBounds, ProblemResult, SimulatedBinaryCrossover,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct LinearFront;

    impl ProblemBounds for LinearFront {
        fn dimensions(&self) -> usize {
            1
        }

        fn lower_bounds(&self) -> &[f64] {
            &[0.0]
        }

        fn upper_bounds(&self) -> &[f64] {
            &[1.0]
        }
    }

    impl MultiObjectiveProblem for LinearFront {
        fn objectives(&self) -> usize {
            2
        }

        fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
            Ok(vec![genes[0], 1.0 - genes[0]])
        }
    }

    struct WrongArity;

    impl ProblemBounds for WrongArity {
        fn dimensions(&self) -> usize {
            1
        }

        fn lower_bounds(&self) -> &[f64] {
            &[0.0]
        }

        fn upper_bounds(&self) -> &[f64] {
            &[1.0]
        }
    }

    impl MultiObjectiveProblem for WrongArity {
        fn objectives(&self) -> usize {
            2
        }

        fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
            Ok(vec![genes[0]])
        }
    }

    /// Evaluator that loses the last candidate of every batch.
    struct ShortBatch;

    impl ProblemBounds for ShortBatch {
        fn dimensions(&self) -> usize {
            1
        }

        fn lower_bounds(&self) -> &[f64] {
            &[0.0]
        }

        fn upper_bounds(&self) -> &[f64] {
            &[1.0]
        }
    }

    impl ObjectiveEvaluator for ShortBatch {
        fn number_of_objectives(&self) -> usize {
            2
        }

        fn evaluate_batch(&mut self, batch: &[Vec<f64>]) -> EvaluationResult<Vec<Evaluation>> {
            let keep = batch.len().saturating_sub(1);
            Ok(batch[..keep]
                .iter()
                .map(|genes| Evaluation {
                    objectives: vec![genes[0], 1.0 - genes[0]],
                    constraint_violation: 0.0,
                })
                .collect())
        }
    }

    #[test]
    fn default_neighborhood_is_clamped_to_population() {
        let engine = MoeadStm::builder(LinearFront).uniform_weights(9).build().unwrap();
        assert_eq!(engine.weights().len(), 10);
        assert_eq!(engine.config().neighborhood_size, 10);
        assert_eq!(engine.neighborhood().size(), 10);
    }

    #[test]
    fn explicit_oversized_neighborhood_is_rejected() {
        let err = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .neighborhood_size(11)
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MoeadStmError::NeighborhoodTooLarge {
                size: 11,
                subproblems: 10
            }
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let probability = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .neighborhood_probability(1.5)
            .build()
            .err()
            .unwrap();
        assert!(matches!(probability, MoeadStmError::InvalidProbability { .. }));

        let period = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .utility_period(0)
            .build()
            .err()
            .unwrap();
        assert!(matches!(period, MoeadStmError::InvalidUtilityPeriod(0)));

        let penalty = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .scalarization(Scalarization::Pbi { theta: -1.0 })
            .build()
            .err()
            .unwrap();
        assert!(matches!(penalty, MoeadStmError::InvalidPenalty(_)));
    }

    #[test]
    fn weight_problems_surface_as_configuration_errors() {
        let dimension = MoeadStm::builder(LinearFront)
            .weights(vec![vec![0.5, 0.5], vec![1.0, 0.0, 0.0]])
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            dimension,
            MoeadStmError::WeightDimensionMismatch { index: 1, .. }
        ));

        let count = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .population_size(12)
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            count,
            MoeadStmError::WeightCountMismatch {
                expected: 12,
                found: 10
            }
        ));
    }

    #[test]
    fn population_size_alone_spaces_bi_objective_weights() {
        let engine = MoeadStm::builder(LinearFront).population_size(6).build().unwrap();
        assert_eq!(engine.weights().len(), 6);
        assert_eq!(&engine.weights()[5], &[1.0, 0.0]);
    }

    #[test]
    fn run_respects_budget_rule_and_keeps_population_size() {
        let mut engine = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .max_evaluations(100)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let report = engine.run(&mut rng).unwrap();
        // 10 initial evaluations, then 2 offspring per generation
        assert_eq!(report.evaluations, 102);
        assert_eq!(report.generations, 46);
        assert_eq!(report.population.len(), 10);
        assert_eq!(report.stats.generations(), report.generations);
        assert!(report.knee.is_some());
    }

    #[test]
    fn two_parent_crossover_is_supported() {
        let mut engine = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .max_evaluations(50)
            .crossover(SimulatedBinaryCrossover::new(15.0).unwrap())
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let report = engine.run(&mut rng).unwrap();
        assert_eq!(report.population.len(), 10);
    }

    #[test]
    fn wrong_objective_count_is_reported() {
        let mut engine = MoeadStm::builder(WrongArity)
            .uniform_weights(3)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine.run(&mut rng).unwrap_err();
        assert!(matches!(
            err,
            MoeadStmError::ObjectiveCountMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn short_evaluation_batches_are_reported() {
        let mut engine = MoeadStm::builder(ShortBatch)
            .uniform_weights(9)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine.run(&mut rng).unwrap_err();
        assert!(matches!(
            err,
            MoeadStmError::EvaluationCountMismatch {
                expected: 10,
                found: 9
            }
        ));
    }

    #[test]
    fn configured_neighborhood_is_not_clamped() {
        let config = MoeadStmConfig {
            neighborhood_size: 20,
            ..MoeadStmConfig::default()
        };
        let err = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .config(config)
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MoeadStmError::NeighborhoodTooLarge {
                size: 20,
                subproblems: 10
            }
        ));

        let fitting = MoeadStmConfig {
            neighborhood_size: 5,
            ..MoeadStmConfig::default()
        };
        let engine = MoeadStm::builder(LinearFront)
            .uniform_weights(9)
            .config(fitting)
            .build()
            .unwrap();
        assert_eq!(engine.neighborhood().size(), 5);
    }

    #[test]
    fn report_detaches_into_experiment() {
        let mut engine = MoeadStm::builder(LinearFront)
            .uniform_weights(4)
            .max_evaluations(20)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let report = engine.run(&mut rng).unwrap();
        let generations = report.generations;
        let experiment = report.into_experiment(Some(9), "StdRng");
        assert_eq!(experiment.final_population.len(), 5);
        assert_eq!(experiment.metadata.generations, generations);
        assert_eq!(experiment.metadata.rng_seed, Some(9));
        assert!(experiment.knee.is_some());
    }
}
