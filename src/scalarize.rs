//! Scalarizing functions that turn an objective vector into one fitness value.
//!
//! Every scheme is minimized. The result is never NaN: a computation that
//! degenerates to NaN yields `f64::INFINITY`, so such a solution ranks last in
//! every subproblem instead of breaking comparisons.
//!
//! | Scheme | Formula |
//! |--------|---------|
//! | [`Tchebycheff`](Scalarization::Tchebycheff) | `max(\|fᵢ - zᵢ\| / wᵢ)` |
//! | [`NormalizedTchebycheff`](Scalarization::NormalizedTchebycheff) | `max(\|f̂ᵢ\| / wᵢ)`, `f̂ᵢ = (fᵢ - zᵢ)/(nzᵢ - zᵢ)` |
//! | [`InvertedTchebycheff`](Scalarization::InvertedTchebycheff) | `max((fᵢ - zᵢ) · wᵢ)` |
//! | [`NormalizedInvertedTchebycheff`](Scalarization::NormalizedInvertedTchebycheff) | `max(f̂ᵢ · wᵢ)` |
//! | [`Pbi`](Scalarization::Pbi) | `d₁ + θ · d₂` |

use crate::reference::ReferencePoints;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Denominator substituted for a zero weight in the Tchebycheff schemes.
pub const ZERO_WEIGHT_DIVISOR: f64 = 1e-6;
/// Factor substituted for a zero weight in the inverted Tchebycheff scheme.
pub const ZERO_WEIGHT_FACTOR: f64 = 1e-4;
/// Factor substituted for a zero weight in the normalized inverted scheme.
pub const NORMALIZED_ZERO_WEIGHT_FACTOR: f64 = 1e-6;
/// Default PBI penalty `θ`.
pub const DEFAULT_PBI_PENALTY: f64 = 5.0;

/// Scalarizing scheme used for every subproblem.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scalarization {
    /// Weighted Tchebycheff distance to the ideal point.
    #[default]
    Tchebycheff,
    /// Tchebycheff on objectives normalized by the ideal/nadir range.
    NormalizedTchebycheff,
    /// Inverted Tchebycheff: weights multiply instead of divide.
    InvertedTchebycheff,
    /// Inverted Tchebycheff on normalized objectives.
    NormalizedInvertedTchebycheff,
    /// Penalty-based boundary intersection.
    Pbi {
        /// Penalty applied to the distance from the weight direction.
        theta: f64,
    },
}

impl Scalarization {
    /// PBI with the default penalty `θ = 5`.
    #[must_use]
    pub fn pbi() -> Self {
        Self::Pbi {
            theta: DEFAULT_PBI_PENALTY,
        }
    }

    /// Scalarizes `objectives` against `weight` using the tracked reference points.
    #[must_use]
    pub fn fitness(&self, objectives: &[f64], weight: &[f64], points: &ReferencePoints) -> f64 {
        self.scalarize(objectives, weight, points.ideal(), points.nadir())
    }

    /// Scalarizes `objectives` against `weight` with explicit ideal and nadir
    /// points. Lower is better.
    ///
    /// # Examples
    /// ```
    /// use moead_stm::Scalarization;
    /// let tch = Scalarization::Tchebycheff.scalarize(
    ///     &[2.0, 2.0],
    ///     &[0.5, 0.5],
    ///     &[0.0, 0.0],
    ///     &[4.0, 4.0],
    /// );
    /// assert!((tch - 4.0).abs() < 1e-12);
    ///
    /// let degenerate = Scalarization::Tchebycheff.scalarize(
    ///     &[f64::NAN, 1.0],
    ///     &[0.5, 0.5],
    ///     &[0.0, 0.0],
    ///     &[4.0, 4.0],
    /// );
    /// assert_eq!(degenerate, f64::INFINITY);
    /// ```
    #[must_use]
    pub fn scalarize(
        &self,
        objectives: &[f64],
        weight: &[f64],
        ideal: &[f64],
        nadir: &[f64],
    ) -> f64 {
        let value = match *self {
            Self::Tchebycheff => {
                tchebycheff(objectives.iter().zip(ideal).map(|(f, z)| f - z), weight)
            }
            Self::NormalizedTchebycheff => {
                tchebycheff(normalized(objectives, ideal, nadir), weight)
            }
            Self::InvertedTchebycheff => inverted_tchebycheff(
                objectives.iter().zip(ideal).map(|(f, z)| f - z),
                weight,
                ZERO_WEIGHT_FACTOR,
            ),
            Self::NormalizedInvertedTchebycheff => inverted_tchebycheff(
                normalized(objectives, ideal, nadir),
                weight,
                NORMALIZED_ZERO_WEIGHT_FACTOR,
            ),
            Self::Pbi { theta } => pbi(objectives, weight, ideal, theta),
        };
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    }

    /// Short scheme name, as accepted by [`FromStr`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tchebycheff => "TCH",
            Self::NormalizedTchebycheff => "NORM_TCH",
            Self::InvertedTchebycheff => "ITCH",
            Self::NormalizedInvertedTchebycheff => "NORM_ITCH",
            Self::Pbi { .. } => "PBI",
        }
    }
}

impl Display for Scalarization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pbi { theta } => write!(f, "PBI(theta={theta})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Error returned when a scheme name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scalarization scheme `{0}` (expected TCH, NORM_TCH, ITCH, NORM_ITCH or PBI)")]
pub struct ScalarizationParseError(pub String);

impl FromStr for Scalarization {
    type Err = ScalarizationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TCH" => Ok(Self::Tchebycheff),
            "NORM_TCH" => Ok(Self::NormalizedTchebycheff),
            "ITCH" => Ok(Self::InvertedTchebycheff),
            "NORM_ITCH" => Ok(Self::NormalizedInvertedTchebycheff),
            "PBI" => Ok(Self::pbi()),
            _ => Err(ScalarizationParseError(s.to_owned())),
        }
    }
}

/// `(fᵢ - zᵢ) / (nzᵢ - zᵢ)`, falling back to the raw difference on a
/// collapsed or non-finite range.
fn normalized<'a>(
    objectives: &'a [f64],
    ideal: &'a [f64],
    nadir: &'a [f64],
) -> impl Iterator<Item = f64> + 'a {
    objectives
        .iter()
        .zip(ideal.iter().zip(nadir))
        .map(|(f, (z, nz))| {
            let range = nz - z;
            if range == 0.0 || !range.is_finite() {
                f - z
            } else {
                (f - z) / range
            }
        })
}

/// Maximum that keeps NaN, unlike [`f64::max`] which drops it.
fn nan_max(acc: f64, term: f64) -> f64 {
    if acc.is_nan() || term.is_nan() {
        f64::NAN
    } else {
        acc.max(term)
    }
}

fn tchebycheff(diffs: impl Iterator<Item = f64>, weight: &[f64]) -> f64 {
    diffs
        .zip(weight)
        .map(|(diff, &w)| {
            let denominator = if w == 0.0 { ZERO_WEIGHT_DIVISOR } else { w };
            diff.abs() / denominator
        })
        .fold(f64::NEG_INFINITY, nan_max)
}

fn inverted_tchebycheff(
    diffs: impl Iterator<Item = f64>,
    weight: &[f64],
    zero_factor: f64,
) -> f64 {
    diffs
        .zip(weight)
        .map(|(diff, &w)| if w == 0.0 { zero_factor * diff } else { diff * w })
        .fold(f64::NEG_INFINITY, nan_max)
}

fn pbi(objectives: &[f64], weight: &[f64], ideal: &[f64], theta: f64) -> f64 {
    let norm = weight.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return f64::INFINITY;
    }
    let diff: Vec<f64> = objectives.iter().zip(ideal).map(|(f, z)| f - z).collect();
    let d1 = diff
        .iter()
        .zip(weight)
        .map(|(d, w)| d * w / norm)
        .sum::<f64>()
        .abs();
    let d2 = diff
        .iter()
        .zip(weight)
        .map(|(d, w)| {
            let off = d - d1 * w / norm;
            off * off
        })
        .sum::<f64>()
        .sqrt();
    d1 + theta * d2
}
