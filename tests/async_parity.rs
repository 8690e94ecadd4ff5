use async_trait::async_trait;
use moead_stm::ops::{ProblemBounds, ProblemResult};
use moead_stm::{AsyncBatchEvaluator, AsyncMultiObjectiveProblem, MoeadStm, MultiObjectiveProblem};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

fn schaffer(x: f64) -> Vec<f64> {
    vec![x * x, (x - 2.0).powi(2)]
}

struct SyncSchaffer;

impl ProblemBounds for SyncSchaffer {
    fn dimensions(&self) -> usize {
        1
    }

    fn lower_bounds(&self) -> &[f64] {
        &[-2.0]
    }

    fn upper_bounds(&self) -> &[f64] {
        &[2.0]
    }
}

impl MultiObjectiveProblem for SyncSchaffer {
    fn objectives(&self) -> usize {
        2
    }

    fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
        Ok(schaffer(genes[0]))
    }
}

struct RemoteSchaffer;

impl ProblemBounds for RemoteSchaffer {
    fn dimensions(&self) -> usize {
        1
    }

    fn lower_bounds(&self) -> &[f64] {
        &[-2.0]
    }

    fn upper_bounds(&self) -> &[f64] {
        &[2.0]
    }
}

#[async_trait]
impl AsyncMultiObjectiveProblem for RemoteSchaffer {
    fn objectives(&self) -> usize {
        2
    }

    async fn evaluate_async(&self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(schaffer(genes[0]))
    }
}

#[test]
fn async_evaluation_matches_synchronous_run() {
    let mut sync_engine = MoeadStm::builder(SyncSchaffer)
        .uniform_weights(9)
        .max_evaluations(120)
        .build()
        .unwrap();
    let sync_report = sync_engine.run(&mut StdRng::seed_from_u64(8)).unwrap();

    let evaluator = AsyncBatchEvaluator::with_max_concurrency(RemoteSchaffer, 4).unwrap();
    let mut async_engine = MoeadStm::builder(evaluator)
        .uniform_weights(9)
        .max_evaluations(120)
        .build()
        .unwrap();
    let async_report = async_engine.run(&mut StdRng::seed_from_u64(8)).unwrap();

    assert_eq!(sync_report.evaluations, async_report.evaluations);
    assert_eq!(sync_report.generations, async_report.generations);
    assert_eq!(sync_report.population, async_report.population);
}
