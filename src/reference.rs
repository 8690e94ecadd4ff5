//! Ideal and nadir point tracking.

use crate::core::Solution;

/// Component-wise best (ideal) and worst (nadir) objective values seen over
/// every evaluated solution.
///
/// Both points only move outward: the ideal never increases and the nadir
/// never decreases. A fresh tracker starts at `+∞` / `-∞` so the first
/// update adopts the observed values directly.
///
/// # Examples
/// ```
/// use moead_stm::ReferencePoints;
/// let mut points = ReferencePoints::new(2);
/// points.update(&[1.0, 3.0]);
/// points.update(&[2.0, 0.5]);
/// assert_eq!(points.ideal(), &[1.0, 0.5]);
/// assert_eq!(points.nadir(), &[2.0, 3.0]);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoints {
    ideal: Vec<f64>,
    nadir: Vec<f64>,
}

impl ReferencePoints {
    /// Creates an empty tracker for `objectives` objectives.
    #[must_use]
    pub fn new(objectives: usize) -> Self {
        Self {
            ideal: vec![f64::INFINITY; objectives],
            nadir: vec![f64::NEG_INFINITY; objectives],
        }
    }

    /// Creates a tracker already folded over `solutions`.
    #[must_use]
    pub fn from_solutions<'a>(
        objectives: usize,
        solutions: impl IntoIterator<Item = &'a Solution>,
    ) -> Self {
        let mut points = Self::new(objectives);
        for solution in solutions {
            points.update(solution.objectives());
        }
        points
    }

    /// Lowers the ideal point component-wise. NaN components are ignored.
    pub fn update_ideal(&mut self, objectives: &[f64]) {
        for (ideal, &value) in self.ideal.iter_mut().zip(objectives) {
            if value < *ideal {
                *ideal = value;
            }
        }
    }

    /// Raises the nadir point component-wise. NaN components are ignored.
    pub fn update_nadir(&mut self, objectives: &[f64]) {
        for (nadir, &value) in self.nadir.iter_mut().zip(objectives) {
            if value > *nadir {
                *nadir = value;
            }
        }
    }

    /// Folds one evaluated objective vector into both points.
    pub fn update(&mut self, objectives: &[f64]) {
        self.update_ideal(objectives);
        self.update_nadir(objectives);
    }

    /// Current ideal point `z`.
    #[must_use]
    pub fn ideal(&self) -> &[f64] {
        &self.ideal
    }

    /// Current nadir point `nz`.
    #[must_use]
    pub fn nadir(&self) -> &[f64] {
        &self.nadir
    }

    /// Number of objectives tracked.
    #[must_use]
    pub fn objectives(&self) -> usize {
        self.ideal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_move_only_outward() {
        let mut points = ReferencePoints::new(2);
        points.update(&[0.5, 0.5]);
        points.update(&[0.7, 0.6]);
        assert_eq!(points.ideal(), &[0.5, 0.5]);
        assert_eq!(points.nadir(), &[0.7, 0.6]);
        points.update(&[0.6, 0.55]);
        assert_eq!(points.ideal(), &[0.5, 0.5]);
        assert_eq!(points.nadir(), &[0.7, 0.6]);
    }

    #[test]
    fn nan_does_not_poison_the_points() {
        let mut points = ReferencePoints::new(2);
        points.update(&[1.0, 1.0]);
        points.update(&[f64::NAN, 0.0]);
        assert_eq!(points.ideal(), &[1.0, 0.0]);
        assert_eq!(points.nadir(), &[1.0, 1.0]);
    }

    #[test]
    fn from_solutions_folds_every_member() {
        let solutions = vec![
            Solution::with_objectives(vec![0.0], vec![0.0, 1.0]),
            Solution::with_objectives(vec![1.0], vec![1.0, 0.0]),
        ];
        let points = ReferencePoints::from_solutions(2, &solutions);
        assert_eq!(points.ideal(), &[0.0, 0.0]);
        assert_eq!(points.nadir(), &[1.0, 1.0]);
        assert_eq!(points.objectives(), 2);
    }
}
