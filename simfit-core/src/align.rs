//! Time alignment of a simulated series onto observation times.
//!
//! Two modes:
//! - observed grid: the simulated series is linearly interpolated at every
//!   observed timestamp (point-wise metrics)
//! - shared grid: both series are resampled onto an evenly spaced grid over
//!   the overlap of their time ranges (shape metrics)

use serde::{Deserialize, Serialize};

use crate::domain::TimeSeries;
use crate::error::CompareError;

/// Grid size used by shape metrics unless configured otherwise.
pub const DEFAULT_GRID_POINTS: usize = 25;

/// What to do with observed timestamps outside the simulated time range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Hold the nearest endpoint value.
    #[default]
    ClampExtrapolation,
    /// Fail the comparison with `OutOfRange`.
    RejectOutOfRange,
}

/// Where a metric wants its two series sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    ObservedGrid,
    SharedGrid,
}

/// Two series sampled on the same time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    /// Common sample times in epoch seconds.
    pub times: Vec<f64>,
    pub observed: Vec<f64>,
    pub simulated: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Simulated values at each observed timestamp.
pub fn align(
    observed: &TimeSeries,
    simulated: &TimeSeries,
    policy: ExtrapolationPolicy,
) -> Result<Vec<f64>, CompareError> {
    require_points("observed series", observed)?;
    require_points("simulated series", simulated)?;

    let sim_times = simulated.times();
    let (start, end) = (sim_times[0], sim_times[sim_times.len() - 1]);

    observed
        .times()
        .iter()
        .map(|&t| {
            if policy == ExtrapolationPolicy::RejectOutOfRange && (t < start || t > end) {
                return Err(CompareError::OutOfRange {
                    timestamp: t,
                    start,
                    end,
                });
            }
            Ok(interpolate(t as f64, sim_times, simulated.values()))
        })
        .collect()
}

/// Observed values paired with simulated values aligned onto observed times.
pub fn align_to_observed(
    observed: &TimeSeries,
    simulated: &TimeSeries,
    policy: ExtrapolationPolicy,
) -> Result<AlignedPair, CompareError> {
    let simulated = align(observed, simulated, policy)?;
    Ok(AlignedPair {
        times: observed.times().iter().map(|&t| t as f64).collect(),
        observed: observed.values().to_vec(),
        simulated,
    })
}

/// Resample both series onto `points` evenly spaced instants spanning the
/// overlap of their time ranges.
///
/// A single-instant overlap is treated as empty.
pub fn align_shared_grid(
    observed: &TimeSeries,
    simulated: &TimeSeries,
    points: usize,
) -> Result<AlignedPair, CompareError> {
    require_points("observed series", observed)?;
    require_points("simulated series", simulated)?;
    if points < 2 {
        return Err(CompareError::insufficient("shared grid", 2, points));
    }

    let obs_times = observed.times();
    let sim_times = simulated.times();
    let (obs_start, obs_end) = (obs_times[0], obs_times[obs_times.len() - 1]);
    let (sim_start, sim_end) = (sim_times[0], sim_times[sim_times.len() - 1]);

    let start = obs_start.max(sim_start);
    let end = obs_end.min(sim_end);
    if start >= end {
        return Err(CompareError::EmptyOverlap {
            observed_start: obs_start,
            observed_end: obs_end,
            simulated_start: sim_start,
            simulated_end: sim_end,
        });
    }

    let step = (end - start) as f64 / (points - 1) as f64;
    let times: Vec<f64> = (0..points)
        .map(|i| {
            if i == points - 1 {
                end as f64
            } else {
                start as f64 + step * i as f64
            }
        })
        .collect();

    let observed = times
        .iter()
        .map(|&t| interpolate(t, obs_times, observed.values()))
        .collect();
    let simulated = times
        .iter()
        .map(|&t| interpolate(t, sim_times, simulated.values()))
        .collect();

    Ok(AlignedPair {
        times,
        observed,
        simulated,
    })
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x`, clamped to the end values.
///
/// `xs` is strictly increasing and the same length as `ys`. Callers check
/// for at least two points first; an empty series yields NaN.
pub(crate) fn interpolate(x: f64, xs: &[i64], ys: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (ys.first(), ys.last()) else {
        return f64::NAN;
    };
    let idx = xs.partition_point(|&v| (v as f64) <= x);
    if idx == 0 {
        return first;
    }
    if idx >= xs.len() {
        return last;
    }
    let (x0, x1) = (xs[idx - 1] as f64, xs[idx] as f64);
    let (y0, y1) = (ys[idx - 1], ys[idx]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn require_points(context: &str, series: &TimeSeries) -> Result<(), CompareError> {
    if series.len() < 2 {
        return Err(CompareError::insufficient(context, 2, series.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(times: &[i64], values: &[f64]) -> TimeSeries {
        TimeSeries::new(times.to_vec(), values.to_vec()).unwrap()
    }

    #[test]
    fn interpolates_between_samples() {
        let obs = series(&[5, 15], &[0.0, 0.0]);
        let sim = series(&[0, 10, 20], &[0.0, 10.0, 30.0]);
        let aligned = align(&obs, &sim, ExtrapolationPolicy::ClampExtrapolation).unwrap();
        assert_eq!(aligned, vec![5.0, 20.0]);
    }

    #[test]
    fn interpolate_clamps_and_tolerates_empty_input() {
        let xs = [0, 10];
        let ys = [1.0, 3.0];
        assert_eq!(interpolate(-5.0, &xs, &ys), 1.0);
        assert_eq!(interpolate(5.0, &xs, &ys), 2.0);
        assert_eq!(interpolate(99.0, &xs, &ys), 3.0);
        assert!(interpolate(0.0, &[], &[]).is_nan());
    }

    #[test]
    fn exact_timestamps_hit_sample_values() {
        let obs = series(&[0, 10, 20], &[0.0, 0.0, 0.0]);
        let sim = series(&[0, 10, 20], &[1.0, 2.0, 3.0]);
        let aligned = align(&obs, &sim, ExtrapolationPolicy::ClampExtrapolation).unwrap();
        assert_eq!(aligned, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn clamp_holds_endpoint_values() {
        let obs = series(&[-10, 0, 50], &[0.0, 0.0, 0.0]);
        let sim = series(&[0, 10], &[2.0, 4.0]);
        let aligned = align(&obs, &sim, ExtrapolationPolicy::ClampExtrapolation).unwrap();
        assert_eq!(aligned, vec![2.0, 2.0, 4.0]);
    }

    #[test]
    fn reject_policy_fails_outside_range() {
        let obs = series(&[0, 50], &[0.0, 0.0]);
        let sim = series(&[0, 10], &[2.0, 4.0]);
        let err = align(&obs, &sim, ExtrapolationPolicy::RejectOutOfRange).unwrap_err();
        assert_eq!(
            err,
            CompareError::OutOfRange {
                timestamp: 50,
                start: 0,
                end: 10
            }
        );
    }

    #[test]
    fn single_point_series_is_insufficient() {
        let obs = series(&[0], &[1.0]);
        let sim = series(&[0, 10], &[2.0, 4.0]);
        let err = align(&obs, &sim, ExtrapolationPolicy::ClampExtrapolation).unwrap_err();
        assert!(matches!(err, CompareError::InsufficientData { required: 2, actual: 1, .. }));
    }

    #[test]
    fn shared_grid_spans_overlap_only() {
        let obs = series(&[0, 100], &[0.0, 100.0]);
        let sim = series(&[50, 150], &[0.0, 10.0]);
        let pair = align_shared_grid(&obs, &sim, 3).unwrap();
        assert_eq!(pair.times, vec![50.0, 75.0, 100.0]);
        assert_eq!(pair.observed, vec![50.0, 75.0, 100.0]);
        assert_eq!(pair.simulated, vec![0.0, 2.5, 5.0]);
    }

    #[test]
    fn shared_grid_default_point_count() {
        let obs = series(&[0, 240], &[0.0, 1.0]);
        let sim = series(&[0, 240], &[0.0, 1.0]);
        let pair = align_shared_grid(&obs, &sim, DEFAULT_GRID_POINTS).unwrap();
        assert_eq!(pair.len(), 25);
        assert_eq!(pair.times[1], 10.0);
        assert_eq!(*pair.times.last().unwrap(), 240.0);
    }

    #[test]
    fn disjoint_ranges_are_empty_overlap() {
        let obs = series(&[0, 10], &[0.0, 1.0]);
        let sim = series(&[20, 30], &[0.0, 1.0]);
        let err = align_shared_grid(&obs, &sim, 25).unwrap_err();
        assert!(matches!(err, CompareError::EmptyOverlap { .. }));
    }

    #[test]
    fn touching_ranges_are_empty_overlap() {
        let obs = series(&[0, 10], &[0.0, 1.0]);
        let sim = series(&[10, 30], &[0.0, 1.0]);
        assert!(matches!(
            align_shared_grid(&obs, &sim, 25),
            Err(CompareError::EmptyOverlap { .. })
        ));
    }
}
