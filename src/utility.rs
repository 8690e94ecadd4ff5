//! Adaptive per-subproblem utility.

use crate::core::Population;
use crate::reference::ReferencePoints;
use crate::scalarize::Scalarization;
use crate::weights::WeightVectors;

/// Improvement above which a subproblem's utility resets to one.
pub const IMPROVEMENT_THRESHOLD: f64 = 0.001;

/// Tracks how much each subproblem has improved since the last recomputation.
///
/// Utilities start at `1.0`. A recomputation compares every representative
/// against the snapshot taken at the previous recomputation and then
/// replaces the snapshot with the current objective vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityTracker {
    utilities: Vec<f64>,
    snapshot: Vec<Vec<f64>>,
}

impl UtilityTracker {
    /// Creates a tracker whose snapshot is the objectives of `population`.
    #[must_use]
    pub fn new(population: &Population) -> Self {
        Self {
            utilities: vec![1.0; population.len()],
            snapshot: population.objectives(),
        }
    }

    /// Current utility of every subproblem, indexed like the population.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.utilities
    }

    /// Objective vectors recorded at the last recomputation.
    #[must_use]
    pub fn snapshot(&self) -> &[Vec<f64>] {
        &self.snapshot
    }

    /// Recomputes every utility from the improvement of slot `i` under weight
    /// `i`, then snapshots `population`.
    ///
    /// Fitness values for both the current and the recorded representative
    /// are computed with the reference points as they are now.
    pub fn recompute(
        &mut self,
        population: &Population,
        weights: &WeightVectors,
        scheme: &Scalarization,
        points: &ReferencePoints,
    ) {
        self.utilities.resize(population.len(), 1.0);
        for (idx, (utility, solution)) in self.utilities.iter_mut().zip(population).enumerate() {
            let Some(previous) = self.snapshot.get(idx) else {
                continue;
            };
            let weight = &weights[idx];
            let current = scheme.fitness(solution.objectives(), weight, points);
            let before = scheme.fitness(previous, weight, points);
            *utility = next_utility(before - current, *utility);
        }
        self.snapshot = population.objectives();
    }

    /// Mean utility, used for per-generation diagnostics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.utilities.is_empty() {
            return 0.0;
        }
        self.utilities.iter().sum::<f64>() / self.utilities.len() as f64
    }
}

/// Applies one utility step given the fitness improvement `delta`.
///
/// The result stays within `[0, 1]`. A representative that got worse, even
/// infinitely so, bottoms out at zero and can still win a tournament
/// against other zero-utility subproblems.
///
/// # Examples
/// ```
/// use moead_stm::utility::next_utility;
/// assert!((next_utility(0.0005, 1.0) - 0.975).abs() < 1e-12);
/// assert_eq!(next_utility(0.01, 0.2), 1.0);
/// assert_eq!(next_utility(f64::NEG_INFINITY, 0.5), 0.0);
/// ```
#[must_use]
pub fn next_utility(delta: f64, utility: f64) -> f64 {
    let next = if delta > IMPROVEMENT_THRESHOLD {
        1.0
    } else if delta.is_nan() {
        // both fitness values infinite: no measurable progress
        0.95 * utility
    } else {
        (0.95 + 0.05 * delta / IMPROVEMENT_THRESHOLD) * utility
    };
    if next.is_nan() {
        0.0
    } else {
        next.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Solution;

    fn population(objectives: &[[f64; 2]]) -> Population {
        objectives
            .iter()
            .map(|values| Solution::with_objectives(vec![0.0], values.to_vec()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn small_improvement_decays() {
        assert!((next_utility(0.0005, 1.0) - 0.975).abs() < 1e-12);
        assert!((next_utility(0.0, 0.5) - 0.475).abs() < 1e-12);
    }

    #[test]
    fn large_improvement_resets() {
        assert_eq!(next_utility(0.5, 0.1), 1.0);
    }

    #[test]
    fn utility_never_exceeds_one() {
        assert!(next_utility(0.001, 1.0) <= 1.0);
        assert!(next_utility(f64::NAN, 1.0) < 1.0);
    }

    #[test]
    fn worsening_bottoms_out_at_zero() {
        assert_eq!(next_utility(f64::NEG_INFINITY, 0.5), 0.0);
        assert_eq!(next_utility(f64::NEG_INFINITY, 0.0), 0.0);
        assert_eq!(next_utility(-1.0, 1.0), 0.0);
        assert!((next_utility(-0.001, 1.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn recompute_compares_against_snapshot_and_refreshes_it() {
        let weights = WeightVectors::new(vec![vec![0.5, 0.5], vec![0.5, 0.5]], 2).unwrap();
        let before = population(&[[1.0, 1.0], [1.0, 1.0]]);
        let mut tracker = UtilityTracker::new(&before);
        let mut points = ReferencePoints::new(2);
        points.update(&[0.0, 0.0]);

        let after = population(&[[0.5, 0.5], [1.0, 1.0]]);
        tracker.recompute(&after, &weights, &Scalarization::Tchebycheff, &points);
        assert_eq!(tracker.values()[0], 1.0);
        assert!((tracker.values()[1] - 0.95).abs() < 1e-12);
        assert_eq!(tracker.snapshot(), after.objectives().as_slice());
        assert!((tracker.mean() - 0.975).abs() < 1e-12);
    }
}
