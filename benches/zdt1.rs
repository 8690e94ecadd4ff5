use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use moead_stm::ops::{MultiObjectiveProblem, ProblemBounds, ProblemError, ProblemResult};
use moead_stm::{
    stable_matching, MoeadStm, PreferenceTables, ReferencePoints, Scalarization, Solution,
    WeightVectors,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Zdt1 {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Zdt1 {
    fn new(dimensions: usize) -> Self {
        assert!(
            dimensions >= 2,
            "ZDT1 requires at least two decision variables"
        );
        Self {
            lower: vec![0.0; dimensions],
            upper: vec![1.0; dimensions],
        }
    }
}

impl ProblemBounds for Zdt1 {
    fn dimensions(&self) -> usize {
        self.lower.len()
    }

    fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }
}

impl MultiObjectiveProblem for Zdt1 {
    fn objectives(&self) -> usize {
        2
    }

    fn evaluate(&mut self, genes: &[f64]) -> ProblemResult<Vec<f64>> {
        self.validate_candidate_length(genes.len())?;
        let dims = self.dimensions();
        if dims < 2 {
            return Err(ProblemError::DimensionMismatch {
                expected: 2,
                found: dims,
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let g = 1.0 + 9.0 * genes[1..].iter().sum::<f64>() / (dims - 1) as f64;
        let f1 = genes[0];
        Ok(vec![f1, g * (1.0 - (f1 / g).sqrt())])
    }
}

fn zdt1_benchmark(c: &mut Criterion) {
    c.bench_function("zdt1-moead-stm", |b| {
        b.iter_batched(
            || Zdt1::new(30),
            |problem| {
                let mut engine = MoeadStm::builder(problem)
                    .population_size(100)
                    .max_evaluations(20_000)
                    .build()
                    .expect("valid MOEA/D-STM configuration");
                let mut rng = StdRng::seed_from_u64(777);
                engine.run(&mut rng).expect("optimization to succeed");
            },
            BatchSize::SmallInput,
        );
    });
}

fn matching_benchmark(c: &mut Criterion) {
    let weights = WeightVectors::uniform(2, 99).expect("valid lattice");
    let mut rng = StdRng::seed_from_u64(31);
    let pool: Vec<Solution> = (0..120)
        .map(|_| {
            let x: f64 = rng.gen();
            let g = 1.0 + rng.gen::<f64>();
            Solution::with_objectives(vec![x], vec![x, g * (1.0 - (x / g).sqrt())])
        })
        .collect();
    let points = ReferencePoints::from_solutions(2, &pool);

    c.bench_function("stable-matching-100x120", |b| {
        b.iter(|| {
            let tables =
                PreferenceTables::build(&pool, &weights, &Scalarization::Tchebycheff, &points);
            stable_matching(&tables.subproblems, &tables.solutions).expect("complete matching")
        });
    });
}

criterion_group!(benches, zdt1_benchmark, matching_benchmark);
criterion_main!(benches);
