use moead_stm::ops::{ProblemBounds, ProblemResult};
use moead_stm::{MoeadStm, MultiObjectiveProblem, Scalarization};
use rand::SeedableRng;
use std::error::Error;

/// Two conflicting objectives whose Pareto front is the segment `f1 + f2 = 1`.
struct LinearFront {
    lower: [f64; 1],
    upper: [f64; 1],
}

impl LinearFront {
    fn new() -> Self {
        Self {
            lower: [0.0],
            upper: [1.0],
        }
    }
}

impl ProblemBounds for LinearFront {
    fn dimensions(&self) -> usize {
        1
    }

    fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    fn upper_bounds(&self) -> &[f64] {
        &self.upper
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

fn main() -> Result<(), Box<dyn Error>> {
    let scheme: Scalarization = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "TCH".to_string())
        .parse()?;
    let mut engine = MoeadStm::builder(LinearFront::new())
        .uniform_weights(9)
        .scalarization(scheme)
        .max_evaluations(1_000)
        .build()?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(1234);
    let report = engine.run(&mut rng)?;

    println!(
        "{} generations, {} evaluations using {}",
        report.generations, report.evaluations, scheme
    );
    for (slot, solution) in report.population.iter().enumerate() {
        let weight = &engine.weights()[slot];
        println!(
            "subproblem {slot:>2} {weight:?} => f1 {:.4}, f2 {:.4}",
            solution.objectives()[0],
            solution.objectives()[1]
        );
    }
    if let Some(knee) = &report.knee {
        println!("knee point: {:?}", knee.objectives());
    }

    Ok(())
}
