//! Score normalization across the runs of one variable.

use serde::{Deserialize, Serialize};

/// How a metric's raw score vector is rescaled before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// Rescale finite scores to [0, 1]; a constant vector maps to 0.5.
    MinMax,
    /// Scores are already bounded by construction.
    PassThrough,
}

/// Index-preserving normalization. NaN entries stay NaN and are ignored when
/// computing the range.
pub fn normalize(scores: &[f64], policy: NormalizationPolicy) -> Vec<f64> {
    match policy {
        NormalizationPolicy::PassThrough => scores.to_vec(),
        NormalizationPolicy::MinMax => min_max(scores),
    }
}

fn min_max(scores: &[f64]) -> Vec<f64> {
    let finite = scores.iter().copied().filter(|s| s.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s), hi.max(s))
    });
    if lo > hi {
        // No finite entries at all.
        return scores.to_vec();
    }

    let range = hi - lo;
    scores
        .iter()
        .map(|&s| {
            if !s.is_finite() {
                s
            } else if range == 0.0 {
                0.5
            } else {
                (s - lo) / range
            }
        })
        .collect()
}
