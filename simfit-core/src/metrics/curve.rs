//! Shape distance between two polylines in a normalized (time, value) plane.
//!
//! Time is divided by a characteristic duration and values by the observed
//! value range, so one unit on either axis means "one characteristic change".
//! The directed distance from A to B is the length-weighted mean, over A's
//! segment midpoints, of the distance to the nearest midpoint of B. The
//! metric is the average of both directions.

use crate::align::AlignedPair;
use crate::error::CompareError;

/// Ten days, in seconds.
pub const DEFAULT_CHARACTERISTIC_DURATION_SECS: f64 = 10.0 * 86_400.0;

#[derive(Debug, Clone, Copy)]
struct Segment {
    mid: (f64, f64),
    length: f64,
}

pub fn curve_distance(
    pair: &AlignedPair,
    characteristic_duration_secs: f64,
) -> Result<f64, CompareError> {
    if pair.len() < 2 {
        return Err(CompareError::insufficient("curve_distance", 2, pair.len()));
    }
    if characteristic_duration_secs <= 0.0 || !characteristic_duration_secs.is_finite() {
        return Err(CompareError::DegenerateRange(format!(
            "curve_distance: characteristic duration {characteristic_duration_secs}"
        )));
    }

    let (lo, hi) = pair
        .observed
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let value_range = hi - lo;
    if !(value_range > 0.0) {
        return Err(CompareError::DegenerateRange(
            "curve_distance: observed value range is zero".into(),
        ));
    }

    let t0 = pair.times[0];
    let scaled_times: Vec<f64> = pair
        .times
        .iter()
        .map(|t| (t - t0) / characteristic_duration_secs)
        .collect();

    let a = segments(&scaled_times, &pair.observed, value_range);
    let b = segments(&scaled_times, &pair.simulated, value_range);

    let ab = directed_distance(&a, &b)?;
    let ba = directed_distance(&b, &a)?;
    Ok((ab + ba) / 2.0)
}

fn segments(times: &[f64], values: &[f64], value_range: f64) -> Vec<Segment> {
    times
        .windows(2)
        .zip(values.windows(2))
        .map(|(t, v)| {
            let (x0, x1) = (t[0], t[1]);
            let (y0, y1) = (v[0] / value_range, v[1] / value_range);
            Segment {
                mid: ((x0 + x1) / 2.0, (y0 + y1) / 2.0),
                length: (x1 - x0).hypot(y1 - y0),
            }
        })
        .collect()
}

fn directed_distance(from: &[Segment], to: &[Segment]) -> Result<f64, CompareError> {
    let total: f64 = from.iter().map(|s| s.length).sum();
    if !(total > 0.0) {
        return Err(CompareError::DegenerateRange(
            "curve_distance: polyline has zero length".into(),
        ));
    }

    let weighted: f64 = from
        .iter()
        .map(|s| {
            let nearest = to
                .iter()
                .map(|o| (s.mid.0 - o.mid.0).hypot(s.mid.1 - o.mid.1))
                .fold(f64::INFINITY, f64::min);
            s.length * nearest
        })
        .sum();

    Ok(weighted / total)
}
