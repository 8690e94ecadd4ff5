//! Selection operators that pick one index by score.

use rand::seq::index;
use rand::RngCore;
use std::sync::Arc;

/// Selects one index from a score slice. Higher scores are better.
///
/// # Examples
/// ```
/// use moead_stm::ops::SelectionOperator;
///
/// struct BestOnly;
///
/// impl SelectionOperator for BestOnly {
///     fn select_index(&self, scores: &[f64], _rng: &mut dyn rand::RngCore) -> Option<usize> {
///         scores
///             .iter()
///             .enumerate()
///             .max_by(|(_, a), (_, b)| a.total_cmp(b))
///             .map(|(idx, _)| idx)
///     }
/// }
///
/// let idx = BestOnly.select_index(&[0.1, 0.9, 0.5], &mut rand::thread_rng());
/// assert_eq!(idx, Some(1));
/// ```
pub trait SelectionOperator: Send + Sync {
    /// Returns the selected index, or `None` when `scores` is empty.
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize>;
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for Box<T> {
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(scores, rng)
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for Arc<T> {
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(scores, rng)
    }
}

/// Tournament over subproblem utilities.
///
/// Draws `depth` distinct candidates uniformly at random (all of them when
/// fewer remain) and returns the one with the highest score. Ties keep the
/// earliest draw.
#[derive(Debug, Clone)]
pub struct UtilityTournament {
    depth: usize,
}

impl UtilityTournament {
    /// Creates a tournament of the given depth. Returns `None` when `depth`
    /// is zero.
    #[must_use]
    pub fn new(depth: usize) -> Option<Self> {
        (depth > 0).then_some(Self { depth })
    }

    /// Returns the tournament depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl SelectionOperator for UtilityTournament {
    fn select_index(&self, scores: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        if scores.is_empty() {
            return None;
        }
        let amount = self.depth.min(scores.len());
        let mut best: Option<usize> = None;
        for idx in index::sample(rng, scores.len(), amount) {
            best = match best {
                Some(current) if scores[idx] <= scores[current] => Some(current),
                _ => Some(idx),
            };
        }
        best
    }
}
