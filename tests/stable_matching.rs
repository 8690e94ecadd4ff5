use moead_stm::{
    is_stable, stable_matching, PreferenceTables, ReferencePoints, Scalarization, Solution,
    StableMatchingSelector, WeightVectors,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn shuffled(len: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

#[test]
fn random_preferences_always_yield_stable_matchings() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let subproblems = rng.gen_range(1..12);
        let pool = subproblems + rng.gen_range(0..12);
        let subproblem_prefs: Vec<Vec<usize>> =
            (0..subproblems).map(|_| shuffled(pool, &mut rng)).collect();
        let solution_prefs: Vec<Vec<usize>> =
            (0..pool).map(|_| shuffled(subproblems, &mut rng)).collect();

        let matching = stable_matching(&subproblem_prefs, &solution_prefs).unwrap();
        assert_eq!(matching.len(), subproblems);
        let mut members = matching.clone();
        members.sort_unstable();
        members.dedup();
        assert_eq!(members.len(), subproblems, "a member was matched twice");
        assert!(is_stable(&matching, &subproblem_prefs, &solution_prefs));
    }
}

#[test]
fn selection_from_a_random_pool_is_stable_and_full() {
    let mut rng = StdRng::seed_from_u64(4);
    let weights = WeightVectors::uniform(2, 9).unwrap();
    let pool: Vec<Solution> = (0..25)
        .map(|_| {
            let x: f64 = rng.gen();
            let noise: f64 = rng.gen_range(0.0..0.3);
            Solution::with_objectives(vec![x], vec![x + noise, 1.0 - x + noise])
        })
        .collect();
    let points = ReferencePoints::from_solutions(2, &pool);

    let tables = PreferenceTables::build(&pool, &weights, &Scalarization::Tchebycheff, &points);
    assert_eq!(tables.niche_counts.iter().sum::<usize>(), pool.len());
    let matching = stable_matching(&tables.subproblems, &tables.solutions).unwrap();
    assert!(is_stable(&matching, &tables.subproblems, &tables.solutions));

    let selector = StableMatchingSelector::new(Scalarization::Tchebycheff);
    let population = selector.select(pool.clone(), &weights, &points).unwrap();
    assert_eq!(population.len(), weights.len());
    for (slot, &member) in matching.iter().enumerate() {
        assert_eq!(population.get(slot).map(Solution::genes), Some(pool[member].genes()));
    }
}

#[test]
fn pool_smaller_than_subproblems_is_fatal() {
    let weights = WeightVectors::uniform(2, 3).unwrap();
    let pool = vec![
        Solution::with_objectives(vec![0.0], vec![0.0, 1.0]),
        Solution::with_objectives(vec![1.0], vec![1.0, 0.0]),
    ];
    let points = ReferencePoints::from_solutions(2, &pool);
    let err = StableMatchingSelector::default()
        .select(pool, &weights, &points)
        .unwrap_err();
    assert_eq!(
        err,
        moead_stm::MatchingError::PoolTooSmall {
            pool: 2,
            subproblems: 4
        }
    );
}
