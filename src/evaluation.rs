//! Batch evaluation of offspring, synchronously or on a Tokio runtime.
//!
//! The optimizer hands every generation's offspring to an
//! [`ObjectiveEvaluator`] in one batch. Synchronous
//! [`MultiObjectiveProblem`]s evaluate the batch in order;
//! [`AsyncBatchEvaluator`] spawns one Tokio task per candidate and reassembles
//! the results in input order, so folding them into the reference points is
//! deterministic regardless of completion order.

use crate::ops::{AsyncMultiObjectiveProblem, MultiObjectiveProblem, ProblemBounds, ProblemError};
use std::sync::Arc;
use std::thread;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// Result type produced by [`ObjectiveEvaluator`] implementations.
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors reported by evaluation backends.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// The problem rejected a candidate.
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// A spawned task failed or panicked before producing objectives.
    #[error("evaluation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors that can occur while building an [`AsyncBatchEvaluator`].
#[derive(Debug, thiserror::Error)]
pub enum AsyncEvaluatorError {
    /// The requested concurrency level was zero.
    #[error("max concurrency must be at least one for async evaluation")]
    InvalidConcurrency,
    /// Tokio runtime initialization failed.
    #[error("failed to initialize Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Objective vector, one value per objective.
    pub objectives: Vec<f64>,
    /// Aggregated constraint violation; zero when feasible.
    pub constraint_violation: f64,
}

/// Evaluates batches of decision vectors.
pub trait ObjectiveEvaluator: ProblemBounds {
    /// Number of objectives `M` every evaluation yields.
    fn number_of_objectives(&self) -> usize;

    /// Evaluates `batch`, returning one [`Evaluation`] per candidate in the
    /// same order.
    ///
    /// # Errors
    /// Implementations return [`EvaluationError`] when the underlying
    /// problem reports [`ProblemError`] or when task execution fails.
    fn evaluate_batch(&mut self, batch: &[Vec<f64>]) -> EvaluationResult<Vec<Evaluation>>;
}

impl<T> ObjectiveEvaluator for T
where
    T: MultiObjectiveProblem,
{
    fn number_of_objectives(&self) -> usize {
        MultiObjectiveProblem::objectives(self)
    }

    fn evaluate_batch(&mut self, batch: &[Vec<f64>]) -> EvaluationResult<Vec<Evaluation>> {
        let mut evaluations = Vec::with_capacity(batch.len());
        for genes in batch {
            let objectives = self.evaluate(genes)?;
            let constraint_violation = self.evaluate_constraints(genes)?;
            evaluations.push(Evaluation {
                objectives,
                constraint_violation,
            });
        }
        Ok(evaluations)
    }
}

/// Evaluates [`AsyncMultiObjectiveProblem`] implementations in parallel
/// Tokio tasks.
pub struct AsyncBatchEvaluator<P>
where
    P: AsyncMultiObjectiveProblem + 'static,
{
    problem: Arc<P>,
    runtime: Runtime,
    max_tasks: usize,
}

impl<P> AsyncBatchEvaluator<P>
where
    P: AsyncMultiObjectiveProblem + 'static,
{
    /// Creates a batch evaluator sized to the machine's available parallelism.
    ///
    /// # Errors
    /// Returns [`AsyncEvaluatorError::Runtime`] when the Tokio runtime cannot
    /// be initialized.
    pub fn new(problem: P) -> Result<Self, AsyncEvaluatorError> {
        let parallelism = thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self::with_max_concurrency(problem, parallelism)
    }

    /// Creates a batch evaluator with at most `max_tasks` evaluations in
    /// flight.
    ///
    /// # Errors
    /// Returns [`AsyncEvaluatorError::InvalidConcurrency`] when `max_tasks` is
    /// zero or [`AsyncEvaluatorError::Runtime`] if the Tokio runtime fails to
    /// initialize.
    pub fn with_max_concurrency(problem: P, max_tasks: usize) -> Result<Self, AsyncEvaluatorError> {
        if max_tasks == 0 {
            return Err(AsyncEvaluatorError::InvalidConcurrency);
        }
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(AsyncEvaluatorError::Runtime)?;
        Ok(Self {
            problem: Arc::new(problem),
            runtime,
            max_tasks,
        })
    }

    /// Maximum number of concurrently running evaluations.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_tasks
    }

    async fn run_batch(&self, batch: &[Vec<f64>]) -> EvaluationResult<Vec<Evaluation>> {
        let mut pending: Vec<JoinHandle<Result<(usize, Evaluation), ProblemError>>> = Vec::new();
        let mut results: Vec<Option<Evaluation>> = vec![None; batch.len()];
        for (idx, candidate) in batch.iter().enumerate() {
            let problem = Arc::clone(&self.problem);
            let genes = candidate.clone();
            pending.push(tokio::spawn(async move {
                let objectives = problem.evaluate_async(&genes).await?;
                let constraint_violation = problem.evaluate_constraints_async(&genes).await?;
                Ok((
                    idx,
                    Evaluation {
                        objectives,
                        constraint_violation,
                    },
                ))
            }));
            if pending.len() >= self.max_tasks {
                Self::resolve_handles(&mut pending, &mut results).await?;
            }
        }
        Self::resolve_handles(&mut pending, &mut results).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn resolve_handles(
        pending: &mut Vec<JoinHandle<Result<(usize, Evaluation), ProblemError>>>,
        results: &mut [Option<Evaluation>],
    ) -> EvaluationResult<()> {
        while let Some(handle) = pending.pop() {
            let (idx, evaluation) = handle.await??;
            results[idx] = Some(evaluation);
        }
        Ok(())
    }
}

impl<P> ProblemBounds for AsyncBatchEvaluator<P>
where
    P: AsyncMultiObjectiveProblem + 'static,
{
    fn dimensions(&self) -> usize {
        self.problem.dimensions()
    }

    fn lower_bounds(&self) -> &[f64] {
        self.problem.lower_bounds()
    }

    fn upper_bounds(&self) -> &[f64] {
        self.problem.upper_bounds()
    }
}

impl<P> ObjectiveEvaluator for AsyncBatchEvaluator<P>
where
    P: AsyncMultiObjectiveProblem + 'static,
{
    fn number_of_objectives(&self) -> usize {
        self.problem.objectives()
    }

    fn evaluate_batch(&mut self, batch: &[Vec<f64>]) -> EvaluationResult<Vec<Evaluation>> {
        self.runtime.block_on(self.run_batch(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::ProblemResult;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct SlowLinear {
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl ProblemBounds for SlowLinear {
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

    #[async_trait]
    impl AsyncMultiObjectiveProblem for SlowLinear {
        fn objectives(&self) -> usize {
            2
        }

        async fn evaluate_async(&self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
            // later candidates finish first
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let delay = ((1.0 - genes[0]) * 20.0) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.calls.lock().expect("lock poisoned").push(genes.len());
            Ok(vec![genes[0], 1.0 - genes[0]])
        }

        async fn evaluate_constraints_async(&self, genes: &[f64]) -> ProblemResult<f64> {
            Ok((genes[0] - 0.5).max(0.0))
        }
    }

    struct Failing;

    impl ProblemBounds for Failing {
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

    impl MultiObjectiveProblem for Failing {
        fn objectives(&self) -> usize {
            2
        }

        fn evaluate(&mut self, _genes: &[f64]) -> ProblemResult<Vec<f64>> {
            Err(ProblemError::Evaluation("simulator offline".into()))
        }
    }

    #[test]
    fn synchronous_problems_implement_evaluator_trait() {
        struct Sum;

        impl ProblemBounds for Sum {
            fn dimensions(&self) -> usize {
                2
            }

            fn lower_bounds(&self) -> &[f64] {
                &[-1.0, -1.0]
            }

            fn upper_bounds(&self) -> &[f64] {
                &[1.0, 1.0]
            }
        }

        impl MultiObjectiveProblem for Sum {
            fn objectives(&self) -> usize {
                2
            }

            fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
                Ok(vec![genes[0] + genes[1], genes[0] * genes[1]])
            }
        }

        let mut problem = Sum;
        assert_eq!(problem.number_of_objectives(), 2);
        let batch = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let evaluations = problem.evaluate_batch(&batch).unwrap();
        assert_eq!(evaluations[0].objectives, vec![3.0, 2.0]);
        assert_eq!(evaluations[1].objectives, vec![7.0, 12.0]);
        assert!(evaluations.iter().all(|e| e.constraint_violation == 0.0));
    }

    #[test]
    fn problem_errors_surface_from_batches() {
        let mut problem = Failing;
        let err = problem.evaluate_batch(&[vec![0.5]]).unwrap_err();
        assert!(matches!(err, EvaluationError::Problem(ProblemError::Evaluation(_))));
    }

    #[test]
    fn async_results_keep_input_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let problem = SlowLinear {
            calls: Arc::clone(&calls),
        };
        let mut evaluator = AsyncBatchEvaluator::with_max_concurrency(problem, 3).unwrap();
        let batch = vec![vec![0.0], vec![0.25], vec![0.75], vec![1.0]];
        let evaluations = evaluator.evaluate_batch(&batch).unwrap();
        let firsts: Vec<f64> = evaluations.iter().map(|e| e.objectives[0]).collect();
        assert_eq!(firsts, vec![0.0, 0.25, 0.75, 1.0]);
        assert_eq!(evaluations[3].constraint_violation, 0.5);
        assert_eq!(calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let problem = SlowLinear {
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        assert!(matches!(
            AsyncBatchEvaluator::with_max_concurrency(problem, 0),
            Err(AsyncEvaluatorError::InvalidConcurrency)
        ));
    }
}
