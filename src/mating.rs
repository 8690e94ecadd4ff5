//! Choosing which subproblems receive offspring, and their parents.

use crate::ops::selection::SelectionOperator;
use crate::ops::{random_index, random_unit};
use crate::weights::Neighborhood;
use rand::RngCore;

/// Where mating parents are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatingMode {
    /// Parents come from the subproblem's neighborhood.
    Neighborhood,
    /// Parents come from the whole population.
    Global,
}

/// Subproblem and parent selection driven by utility.
#[derive(Debug, Clone)]
pub struct MatingSelector<S> {
    tournament: S,
    neighborhood_probability: f64,
    selection_fraction: f64,
}

impl<S: SelectionOperator> MatingSelector<S> {
    /// Creates a selector. `neighborhood_probability` is `δ`; the number of
    /// subproblems selected per generation is `⌊N · selection_fraction⌋`.
    pub fn new(tournament: S, neighborhood_probability: f64, selection_fraction: f64) -> Self {
        Self {
            tournament,
            neighborhood_probability,
            selection_fraction,
        }
    }

    /// Number of subproblems that receive an offspring in each generation,
    /// never fewer than the boundary subproblems.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn selection_size(&self, subproblems: usize, objectives: usize) -> usize {
        let quota = (subproblems as f64 * self.selection_fraction).floor() as usize;
        quota.max(objectives).min(subproblems)
    }

    /// Returns the ordered subproblem indices that receive an offspring.
    ///
    /// The first `objectives` indices are always included. The rest are won
    /// by utility tournaments among the subproblems not yet selected.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::mating::MatingSelector;
    /// use moead_stm::ops::UtilityTournament;
    /// use rand::SeedableRng;
    ///
    /// let selector = MatingSelector::new(UtilityTournament::new(10).unwrap(), 0.9, 0.2);
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let order = selector.select_subproblems(&[1.0; 20], 2, &mut rng);
    /// assert_eq!(order.len(), 4);
    /// assert_eq!(&order[..2], &[0, 1]);
    /// ```
    pub fn select_subproblems(
        &self,
        utilities: &[f64],
        objectives: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        let total = self.selection_size(utilities.len(), objectives);
        let boundary = objectives.min(utilities.len());
        let mut selected: Vec<usize> = (0..boundary).collect();
        let mut candidates: Vec<usize> = (boundary..utilities.len()).collect();
        let mut scores: Vec<f64> = Vec::with_capacity(candidates.len());
        while selected.len() < total {
            scores.clear();
            scores.extend(candidates.iter().map(|&idx| utilities[idx]));
            let Some(winner) = self.tournament.select_index(&scores, rng) else {
                break;
            };
            selected.push(candidates.remove(winner));
        }
        selected
    }

    /// Draws `δ` to decide between neighborhood and global mating.
    pub fn choose_mode(&self, rng: &mut dyn RngCore) -> MatingMode {
        if random_unit(rng) < self.neighborhood_probability {
            MatingMode::Neighborhood
        } else {
            MatingMode::Global
        }
    }

    /// Draws `count` distinct population indices as mating parents for
    /// `subproblem`.
    ///
    /// Neighborhood mode draws from the subproblem's neighbor list and falls
    /// back to the whole population when that list holds fewer than `count`
    /// distinct entries. The caller adds the subproblem's own representative
    /// when the crossover needs it. Returns fewer than `count` indices only
    /// when the population itself is too small.
    pub fn mating_selection(
        &self,
        subproblem: usize,
        count: usize,
        mode: MatingMode,
        neighborhood: &Neighborhood,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        let population = neighborhood.len();
        let neighbors = neighborhood.of(subproblem);
        let use_neighbors = mode == MatingMode::Neighborhood && neighbors.len() >= count;
        let available = if use_neighbors { neighbors.len() } else { population };
        let count = count.min(available);

        let mut parents = Vec::with_capacity(count);
        while parents.len() < count {
            let pick = if use_neighbors {
                neighbors[random_index(neighbors.len(), rng)]
            } else {
                random_index(population, rng)
            };
            if !parents.contains(&pick) {
                parents.push(pick);
            }
        }
        parents
    }
}
