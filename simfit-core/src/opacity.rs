//! Rank → render weight.

use serde::{Deserialize, Serialize};

/// Opacity assigned to the worst and best ranked runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpacityRange {
    pub min: f64,
    pub max: f64,
}

impl Default for OpacityRange {
    fn default() -> Self {
        Self { min: 0.3, max: 1.0 }
    }
}

/// Linear opacity ramp: rank 1 gets `max`, rank `n` gets `min`.
///
/// With a single run there is no step, so the run gets `max`.
pub fn opacity(rank: usize, n: usize, range: OpacityRange) -> f64 {
    if n <= 1 {
        return range.max;
    }
    let step = (range.max - range.min) / (n - 1) as f64;
    range.max - step * (rank.saturating_sub(1)) as f64
}

/// Opacity of every run in a rank vector.
pub fn opacities(ranks: &[usize], range: OpacityRange) -> Vec<f64> {
    ranks
        .iter()
        .map(|&r| opacity(r, ranks.len(), range))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hit_range_bounds() {
        let range = OpacityRange::default();
        assert_eq!(opacity(1, 5, range), 1.0);
        assert!((opacity(5, 5, range) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn three_runs_step_evenly() {
        let ops = opacities(&[1, 2, 3], OpacityRange { min: 0.2, max: 1.0 });
        assert_eq!(ops[0], 1.0);
        assert!((ops[1] - 0.6).abs() < 1e-12);
        assert!((ops[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn single_run_gets_max() {
        assert_eq!(opacity(1, 1, OpacityRange::default()), 1.0);
        assert_eq!(opacities(&[1], OpacityRange::default()), vec![1.0]);
    }
}
