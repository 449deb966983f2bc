//! Metric registry — maps a method identifier to a capability bundle.
//!
//! A session resolves its method once into a [`MetricSpec`] and passes it to
//! every scoring, normalization and ranking call, so all runs in a session
//! share the same scoring function, normalization policy and orientation.
//!
//! | method | score | orientation | normalization | alignment |
//! |---|---|---|---|---|
//! | `mse` | mean squared error | lower is better | min-max | observed grid |
//! | `mae` | mean absolute error | lower is better | min-max | observed grid |
//! | `scc` | Spearman correlation | \|value\| near 1 | pass-through | observed grid |
//! | `pcc` | Pearson correlation | \|value\| near 1 | pass-through | observed grid |
//! | `curve_distance` | nearest-midpoint curve distance | lower is better | pass-through | shared grid |

pub mod correlation;
pub mod curve;
pub mod error_stats;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::align::{
    align_shared_grid, align_to_observed, AlignedPair, AlignmentMode, ExtrapolationPolicy,
    DEFAULT_GRID_POINTS,
};
use crate::domain::TimeSeries;
use crate::error::CompareError;
use crate::normalize::NormalizationPolicy;
use crate::rank::Orientation;

pub use correlation::{pearson, spearman};
pub use curve::{curve_distance, DEFAULT_CHARACTERISTIC_DURATION_SECS};
pub use error_stats::{mean_absolute_error, mean_squared_error};

/// Comparison method identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    Mse,
    Mae,
    Scc,
    Pcc,
    CurveDistance,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Mse,
        Method::Mae,
        Method::Scc,
        Method::Pcc,
        Method::CurveDistance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::Mae => "mae",
            Self::Scc => "scc",
            Self::Pcc => "pcc",
            Self::CurveDistance => "curve_distance",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown comparison method '{0}' (expected one of mse, mae, scc, pcc, curve_distance)")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Session-level parameters that every comparison in a session shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSettings {
    pub extrapolation: ExtrapolationPolicy,
    pub grid_points: usize,
    pub characteristic_duration_secs: f64,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            extrapolation: ExtrapolationPolicy::default(),
            grid_points: DEFAULT_GRID_POINTS,
            characteristic_duration_secs: DEFAULT_CHARACTERISTIC_DURATION_SECS,
        }
    }
}

type ScoreFn = fn(&AlignedPair, &ComparisonSettings) -> Result<f64, CompareError>;

/// Everything a session needs to know about its comparison method.
#[derive(Clone, Copy)]
pub struct MetricSpec {
    pub method: Method,
    pub orientation: Orientation,
    pub normalization: NormalizationPolicy,
    pub alignment: AlignmentMode,
    score_fn: ScoreFn,
}

impl fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec")
            .field("method", &self.method)
            .field("orientation", &self.orientation)
            .field("normalization", &self.normalization)
            .field("alignment", &self.alignment)
            .finish()
    }
}

impl MetricSpec {
    /// Raw score of an already aligned pair.
    pub fn score(
        &self,
        pair: &AlignedPair,
        settings: &ComparisonSettings,
    ) -> Result<f64, CompareError> {
        (self.score_fn)(pair, settings)
    }

    /// Align `simulated` against `observed` the way this metric expects.
    pub fn align(
        &self,
        observed: &TimeSeries,
        simulated: &TimeSeries,
        settings: &ComparisonSettings,
    ) -> Result<AlignedPair, CompareError> {
        match self.alignment {
            AlignmentMode::ObservedGrid => {
                align_to_observed(observed, simulated, settings.extrapolation)
            }
            AlignmentMode::SharedGrid => {
                align_shared_grid(observed, simulated, settings.grid_points)
            }
        }
    }

    /// Align then score. Non-finite scores are reported as errors.
    pub fn compare(
        &self,
        observed: &TimeSeries,
        simulated: &TimeSeries,
        settings: &ComparisonSettings,
    ) -> Result<f64, CompareError> {
        let pair = self.align(observed, simulated, settings)?;
        let score = self.score(&pair, settings)?;
        if !score.is_finite() {
            return Err(CompareError::NonFiniteScore(score.to_string()));
        }
        Ok(score)
    }
}

fn score_mse(pair: &AlignedPair, _: &ComparisonSettings) -> Result<f64, CompareError> {
    mean_squared_error(&pair.observed, &pair.simulated)
}

fn score_mae(pair: &AlignedPair, _: &ComparisonSettings) -> Result<f64, CompareError> {
    mean_absolute_error(&pair.observed, &pair.simulated)
}

fn score_scc(pair: &AlignedPair, _: &ComparisonSettings) -> Result<f64, CompareError> {
    spearman(&pair.observed, &pair.simulated)
}

fn score_pcc(pair: &AlignedPair, _: &ComparisonSettings) -> Result<f64, CompareError> {
    pearson(&pair.observed, &pair.simulated)
}

fn score_curve(pair: &AlignedPair, settings: &ComparisonSettings) -> Result<f64, CompareError> {
    curve_distance(pair, settings.characteristic_duration_secs)
}

const REGISTRY: [MetricSpec; 5] = [
    MetricSpec {
        method: Method::Mse,
        orientation: Orientation::LowerIsBetter,
        normalization: NormalizationPolicy::MinMax,
        alignment: AlignmentMode::ObservedGrid,
        score_fn: score_mse,
    },
    MetricSpec {
        method: Method::Mae,
        orientation: Orientation::LowerIsBetter,
        normalization: NormalizationPolicy::MinMax,
        alignment: AlignmentMode::ObservedGrid,
        score_fn: score_mae,
    },
    MetricSpec {
        method: Method::Scc,
        orientation: Orientation::MagnitudeNearOne,
        normalization: NormalizationPolicy::PassThrough,
        alignment: AlignmentMode::ObservedGrid,
        score_fn: score_scc,
    },
    MetricSpec {
        method: Method::Pcc,
        orientation: Orientation::MagnitudeNearOne,
        normalization: NormalizationPolicy::PassThrough,
        alignment: AlignmentMode::ObservedGrid,
        score_fn: score_pcc,
    },
    MetricSpec {
        method: Method::CurveDistance,
        orientation: Orientation::LowerIsBetter,
        normalization: NormalizationPolicy::PassThrough,
        alignment: AlignmentMode::SharedGrid,
        score_fn: score_curve,
    },
];

/// Look up the capability bundle for a method.
///
/// `REGISTRY` is ordered by `Method` discriminant.
pub fn resolve(method: Method) -> MetricSpec {
    REGISTRY[method as usize]
}
