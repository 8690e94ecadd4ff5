#![warn(missing_docs)]

/*! A decomposition-based multi-objective evolutionary optimizer (MOEA/D) with
stable-matching environmental selection.

The problem is split into one scalar subproblem per weight vector. Every
generation, subproblems that are still improving produce offspring from
parents in their neighborhood, and a Gale–Shapley matching between
subproblems and the pooled parents and offspring chooses who survives.

```
use moead_stm::{MoeadStm, MultiObjectiveProblem, Scalarization};
use moead_stm::ops::{ProblemBounds, ProblemResult};
use rand::SeedableRng;

struct Schaffer;

impl ProblemBounds for Schaffer {
    fn dimensions(&self) -> usize { 1 }
    fn lower_bounds(&self) -> &[f64] { &[-2.0] }
    fn upper_bounds(&self) -> &[f64] { &[2.0] }
}

impl MultiObjectiveProblem for Schaffer {
    fn objectives(&self) -> usize { 2 }
    fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
        Ok(vec![genes[0].powi(2), (genes[0] - 2.0).powi(2)])
    }
}

let mut engine = MoeadStm::builder(Schaffer)
    .uniform_weights(19)
    .scalarization(Scalarization::Tchebycheff)
    .max_evaluations(500)
    .build()
    .unwrap();
let report = engine.run(&mut rand::rngs::StdRng::seed_from_u64(1)).unwrap();
assert_eq!(report.population.len(), 20);
```
!*/

pub mod core;
pub mod evaluation;
pub mod knee;
pub mod matching;
pub mod mating;
pub mod moead_stm;
pub mod ops;
pub mod reference;
pub mod scalarize;
pub mod utility;
pub mod weights;

pub use crate::core::experiment::{ExperimentMetadata, ExperimentResult, RunStats, SolutionSnapshot};
pub use crate::core::{BoundsError, Population, Solution};
pub use evaluation::{
    AsyncBatchEvaluator, AsyncEvaluatorError, Evaluation, EvaluationError, EvaluationResult,
    ObjectiveEvaluator,
};
pub use knee::knee_point;
pub use matching::{
    is_stable, stable_matching, MatchingError, PreferenceTables, StableMatchingSelector,
};
pub use mating::{MatingMode, MatingSelector};
pub use moead_stm::{MoeadStm, MoeadStmBuilder, MoeadStmConfig, MoeadStmError, MoeadStmReport};
pub use ops::{AsyncMultiObjectiveProblem, MultiObjectiveProblem};
pub use reference::ReferencePoints;
pub use scalarize::{Scalarization, ScalarizationParseError};
pub use utility::UtilityTracker;
pub use weights::{Neighborhood, WeightError, WeightVectors};
