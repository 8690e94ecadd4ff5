//! Knee-point extraction from a final population.

use crate::core::Solution;
use tracing::warn;

/// Returns the index of the knee solution among `solutions`.
///
/// The two extremes are the members with the largest first and the largest
/// second objective. The knee is the member farthest from the line through
/// both extremes, measured in the plane of the first two objectives. Ties keep
/// the lowest index.
///
/// Returns `None` for an empty slice or fewer than two objectives. When both
/// extremes coincide the distance is undefined and the extreme itself is
/// returned.
///
/// # Examples
/// ```
/// use moead_stm::{knee_point, Solution};
/// let front = vec![
///     Solution::with_objectives(vec![], vec![0.0, 1.0]),
///     Solution::with_objectives(vec![], vec![0.2, 0.2]),
///     Solution::with_objectives(vec![], vec![1.0, 0.0]),
/// ];
/// assert_eq!(knee_point(&front), Some(1));
/// ```
#[must_use]
pub fn knee_point(solutions: &[Solution]) -> Option<usize> {
    let first = solutions.first()?;
    if first.number_of_objectives() < 2 {
        return None;
    }
    let f1_extreme = argmax(solutions, 0);
    let f2_extreme = argmax(solutions, 1);
    let a = planar(&solutions[f1_extreme]);
    let b = planar(&solutions[f2_extreme]);
    let length = (b.0 - a.0).hypot(b.1 - a.1);
    if f1_extreme == f2_extreme || length == 0.0 || !length.is_finite() {
        warn!(
            f1_extreme,
            f2_extreme, "extreme solutions coincide, knee falls back to the extreme"
        );
        return Some(f1_extreme);
    }

    let mut best = 0;
    let mut best_distance = f64::NEG_INFINITY;
    for (idx, solution) in solutions.iter().enumerate() {
        let p = planar(solution);
        let area = (b.0 - a.0) * (a.1 - p.1) - (a.0 - p.0) * (b.1 - a.1);
        let distance = area.abs() / length;
        if distance > best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    Some(best)
}

fn planar(solution: &Solution) -> (f64, f64) {
    let objectives = solution.objectives();
    (
        objectives.first().copied().unwrap_or(f64::NAN),
        objectives.get(1).copied().unwrap_or(f64::NAN),
    )
}

fn argmax(solutions: &[Solution], objective: usize) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (idx, solution) in solutions.iter().enumerate() {
        let value = solution.objectives().get(objective).copied().unwrap_or(f64::NAN);
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front(points: &[[f64; 2]]) -> Vec<Solution> {
        points
            .iter()
            .map(|p| Solution::with_objectives(Vec::new(), p.to_vec()))
            .collect()
    }

    #[test]
    fn convex_bulge_is_the_knee() {
        let solutions = front(&[[1.0, 0.0], [0.7, 0.1], [0.3, 0.3], [0.1, 0.7], [0.0, 1.0]]);
        assert_eq!(knee_point(&solutions), Some(2));
    }

    #[test]
    fn linear_front_keeps_first_on_ties() {
        let solutions = front(&[[0.0, 1.0], [0.5, 0.5], [1.0, 0.0]]);
        // every member lies on the extreme line
        assert_eq!(knee_point(&solutions), Some(0));
    }

    #[test]
    fn coincident_extremes_return_the_extreme() {
        let solutions = front(&[[0.1, 0.1], [2.0, 2.0], [0.5, 0.2]]);
        assert_eq!(knee_point(&solutions), Some(1));
    }

    #[test]
    fn degenerate_inputs_have_no_knee() {
        assert_eq!(knee_point(&[]), None);
        let single = vec![Solution::with_objectives(Vec::new(), vec![1.0])];
        assert_eq!(knee_point(&single), None);
    }
}
