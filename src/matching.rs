//! Stable-matching environmental selection.
//!
//! Subproblems and pool members rank each other, then a Gale–Shapley pass
//! with subproblems proposing assigns exactly one pool member to every
//! subproblem. Subproblems rank members by scalarized fitness; members rank
//! subproblems by distance to the weight direction plus how crowded that
//! subproblem's niche is.

use crate::core::{Population, Solution};
use crate::reference::ReferencePoints;
use crate::scalarize::Scalarization;
use crate::weights::WeightVectors;
use std::collections::VecDeque;

/// Failures of the matching step. Both indicate an upstream size violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchingError {
    /// Fewer pool members than subproblems.
    #[error("pool of {pool} solutions cannot cover {subproblems} subproblems")]
    PoolTooSmall {
        /// Pool size `U`.
        pool: usize,
        /// Number of subproblems `N`.
        subproblems: usize,
    },
    /// A subproblem exhausted its preference list without being matched.
    #[error("subproblem {subproblem} exhausted its preferences without a match")]
    UnmatchedSubproblem {
        /// Index of the unmatched subproblem.
        subproblem: usize,
    },
    /// A preference list referenced a member outside the pool.
    #[error("subproblem {subproblem} lists pool member {member}, but the pool has {pool} members")]
    PreferenceOutOfRange {
        /// Index of the subproblem whose list is malformed.
        subproblem: usize,
        /// Offending member index.
        member: usize,
        /// Pool size `U`.
        pool: usize,
    },
}

/// Distance from the sum-normalized objective vector to the weight vector.
///
/// Objectives are divided by their sum before subtracting the weight. A zero
/// or non-finite sum leaves the objectives unnormalized.
///
/// # Examples
/// ```
/// use moead_stm::matching::normalized_distance;
/// let d = normalized_distance(&[1.0, 1.0], &[0.5, 0.5]);
/// assert!(d.abs() < 1e-12);
/// ```
#[must_use]
pub fn normalized_distance(objectives: &[f64], weight: &[f64]) -> f64 {
    let sum: f64 = objectives.iter().sum();
    let scale = if sum == 0.0 || !sum.is_finite() { 1.0 } else { sum };
    let distance = objectives
        .iter()
        .zip(weight)
        .map(|(f, w)| (f / scale - w).powi(2))
        .sum::<f64>()
        .sqrt();
    if distance.is_nan() {
        f64::INFINITY
    } else {
        distance
    }
}

/// Both sides' preference lists, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceTables {
    /// `subproblems[j]` ranks pool members for subproblem `j`.
    pub subproblems: Vec<Vec<usize>>,
    /// `solutions[s]` ranks subproblems for pool member `s`.
    pub solutions: Vec<Vec<usize>>,
    /// Number of pool members nearest to each subproblem.
    pub niche_counts: Vec<usize>,
    /// `fitness[s][j]`: scalarized fitness of member `s` under weight `j`.
    pub fitness: Vec<Vec<f64>>,
}

impl PreferenceTables {
    /// Computes fitness and distance matrices for `pool` and derives both
    /// preference tables from them.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        pool: &[Solution],
        weights: &WeightVectors,
        scheme: &Scalarization,
        points: &ReferencePoints,
    ) -> Self {
        let subproblems = weights.len();
        let mut fitness = Vec::with_capacity(pool.len());
        let mut distances = Vec::with_capacity(pool.len());
        let mut niche_counts = vec![0_usize; subproblems];

        for solution in pool {
            let objectives = solution.objectives();
            let row_fitness: Vec<f64> = weights
                .iter()
                .map(|weight| scheme.fitness(objectives, weight, points))
                .collect();
            let row_distance: Vec<f64> = weights
                .iter()
                .map(|weight| normalized_distance(objectives, weight))
                .collect();
            // strict comparison keeps the lowest index on ties
            let mut nearest = 0;
            for (idx, distance) in row_distance.iter().enumerate() {
                if *distance < row_distance[nearest] {
                    nearest = idx;
                }
            }
            if let Some(count) = niche_counts.get_mut(nearest) {
                *count += 1;
            }
            fitness.push(row_fitness);
            distances.push(row_distance);
        }

        let subproblem_prefs = (0..subproblems)
            .map(|j| ranked(pool.len(), |s| fitness[s][j]))
            .collect();
        let solution_prefs = distances
            .iter()
            .map(|row: &Vec<f64>| ranked(subproblems, |j| row[j] + niche_counts[j] as f64))
            .collect();

        Self {
            subproblems: subproblem_prefs,
            solutions: solution_prefs,
            niche_counts,
            fitness,
        }
    }
}

/// Indices `0..len` sorted by ascending `key`, ties in index order.
fn ranked(len: usize, key: impl Fn(usize) -> f64) -> Vec<usize> {
    let keys: Vec<f64> = (0..len).map(key).collect();
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
    order
}

/// `rank[s][j]` is the position of subproblem `j` in member `s`'s list.
/// Subproblems missing from a list rank behind every listed one.
fn inverse_ranks(solution_prefs: &[Vec<usize>], subproblems: usize) -> Vec<Vec<usize>> {
    solution_prefs
        .iter()
        .map(|prefs| {
            let mut rank = vec![usize::MAX; subproblems];
            for (position, &subproblem) in prefs.iter().enumerate() {
                if let Some(slot) = rank.get_mut(subproblem) {
                    *slot = position;
                }
            }
            rank
        })
        .collect()
}

/// Gale–Shapley with subproblems proposing.
///
/// Returns, for every subproblem, the index of the pool member it is
/// matched to. Free subproblems propose in first-in, first-out order; a
/// member switches partners only when it strictly prefers the new proposer.
///
/// # Examples
/// ```
/// use moead_stm::matching::stable_matching;
/// let subproblems = vec![vec![0, 1, 2], vec![0, 2, 1]];
/// let solutions = vec![vec![1, 0], vec![0, 1], vec![0, 1]];
/// assert_eq!(stable_matching(&subproblems, &solutions).unwrap(), vec![1, 0]);
/// ```
///
/// # Errors
/// Returns [`MatchingError::PoolTooSmall`] when there are fewer members than
/// subproblems, and [`MatchingError::UnmatchedSubproblem`] if a subproblem
/// runs out of members to propose to.
pub fn stable_matching(
    subproblem_prefs: &[Vec<usize>],
    solution_prefs: &[Vec<usize>],
) -> Result<Vec<usize>, MatchingError> {
    let subproblems = subproblem_prefs.len();
    let pool = solution_prefs.len();
    if pool < subproblems {
        return Err(MatchingError::PoolTooSmall { pool, subproblems });
    }

    let rank = inverse_ranks(solution_prefs, subproblems);
    let mut partner_of_member: Vec<Option<usize>> = vec![None; pool];
    let mut member_of_subproblem: Vec<Option<usize>> = vec![None; subproblems];
    let mut next = vec![0_usize; subproblems];
    let mut free: VecDeque<usize> = (0..subproblems).collect();

    while let Some(subproblem) = free.pop_front() {
        let prefs = &subproblem_prefs[subproblem];
        let Some(&member) = prefs.get(next[subproblem]) else {
            return Err(MatchingError::UnmatchedSubproblem { subproblem });
        };
        next[subproblem] += 1;
        if member >= pool {
            return Err(MatchingError::PreferenceOutOfRange {
                subproblem,
                member,
                pool,
            });
        }
        match partner_of_member[member] {
            None => {
                partner_of_member[member] = Some(subproblem);
                member_of_subproblem[subproblem] = Some(member);
            }
            Some(current) if rank[member][subproblem] < rank[member][current] => {
                partner_of_member[member] = Some(subproblem);
                member_of_subproblem[subproblem] = Some(member);
                member_of_subproblem[current] = None;
                free.push_back(current);
            }
            Some(_) => free.push_back(subproblem),
        }
    }

    member_of_subproblem
        .into_iter()
        .enumerate()
        .map(|(subproblem, member)| member.ok_or(MatchingError::UnmatchedSubproblem { subproblem }))
        .collect()
}

/// Checks that `matching` has no blocking pair: no subproblem and member
/// that both prefer each other to their assigned partners. Unmatched members
/// accept any proposal, so a subproblem preferring one of them also blocks.
///
/// A matching whose length differs from the number of subproblem lists is
/// not stable.
#[must_use]
pub fn is_stable(
    matching: &[usize],
    subproblem_prefs: &[Vec<usize>],
    solution_prefs: &[Vec<usize>],
) -> bool {
    if matching.len() != subproblem_prefs.len() {
        return false;
    }
    let rank = inverse_ranks(solution_prefs, subproblem_prefs.len());
    let mut partner_of_member: Vec<Option<usize>> = vec![None; solution_prefs.len()];
    for (subproblem, &member) in matching.iter().enumerate() {
        let Some(slot) = partner_of_member.get_mut(member) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(subproblem);
    }
    for (subproblem, &assigned) in matching.iter().enumerate() {
        for &preferred in subproblem_prefs[subproblem].iter().take_while(|&&m| m != assigned) {
            match partner_of_member.get(preferred).copied().flatten() {
                None => return false,
                Some(other) if rank[preferred][subproblem] < rank[preferred][other] => return false,
                Some(_) => {}
            }
        }
    }
    true
}

/// Environmental selection that keeps one pool member per subproblem.
#[derive(Debug, Clone, Default)]
pub struct StableMatchingSelector {
    scheme: Scalarization,
}

impl StableMatchingSelector {
    /// Creates a selector that ranks members with `scheme`.
    #[must_use]
    pub fn new(scheme: Scalarization) -> Self {
        Self { scheme }
    }

    /// Scalarization used for the subproblem side.
    #[must_use]
    pub fn scheme(&self) -> &Scalarization {
        &self.scheme
    }

    /// Selects the next population from `pool`. Slot `i` holds the member
    /// matched to subproblem `i`, with its fitness under weight `i` stored.
    ///
    /// # Errors
    /// Propagates [`MatchingError`] from [`stable_matching`].
    pub fn select(
        &self,
        pool: Vec<Solution>,
        weights: &WeightVectors,
        points: &ReferencePoints,
    ) -> Result<Population, MatchingError> {
        let tables = PreferenceTables::build(&pool, weights, &self.scheme, points);
        let matching = stable_matching(&tables.subproblems, &tables.solutions)?;
        debug_assert!(is_stable(&matching, &tables.subproblems, &tables.solutions));

        let mut slots: Vec<Option<Solution>> = pool.into_iter().map(Some).collect();
        let mut next = Population::with_capacity(matching.len());
        for (subproblem, &member) in matching.iter().enumerate() {
            let mut solution = slots[member]
                .take()
                .ok_or(MatchingError::UnmatchedSubproblem { subproblem })?;
            solution.set_fitness(tables.fitness[member][subproblem]);
            next.push(solution);
        }
        Ok(next)
    }
}
