//! Ranking engine — orientation correction, per-variable ranks, and the
//! cross-variable aggregate that selects the best run.
//!
//! Missing-score rule: a NaN score (an excluded run) never competes. Valid
//! scores take ranks `1..=k` in ascending corrected order (stable, so equal
//! scores keep input order); NaN scores then take `k+1..=N` in input order.
//! The result is always a permutation of `1..=N`.

use serde::{Deserialize, Serialize};

use crate::domain::RunId;
use crate::error::CompareError;

/// How a metric's native scale relates to fit quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Already lower-is-better.
    LowerIsBetter,
    /// Correlations: best when |value| is near 1, corrected as `1 - |value|`.
    MagnitudeNearOne,
}

impl Orientation {
    /// Map a native score onto the common lower-is-better scale.
    pub fn correct(&self, score: f64) -> f64 {
        match self {
            Self::LowerIsBetter => score,
            Self::MagnitudeNearOne => 1.0 - score.abs(),
        }
    }
}

pub fn orientation_correct(scores: &[f64], orientation: Orientation) -> Vec<f64> {
    scores.iter().map(|&s| orientation.correct(s)).collect()
}

/// Rank runs by score; 1 = best fit.
pub fn rank(scores: &[f64], orientation: Orientation) -> Vec<usize> {
    let corrected = orientation_correct(scores, orientation);

    let (mut valid, missing): (Vec<usize>, Vec<usize>) =
        (0..corrected.len()).partition(|&i| !corrected[i].is_nan());
    valid.sort_by(|&a, &b| corrected[a].total_cmp(&corrected[b]));

    let mut ranks = vec![0; corrected.len()];
    for (position, idx) in valid.into_iter().chain(missing).enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

/// Index of the smallest non-NaN value; the first one wins on ties.
pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Orientation-corrected, normalized scores of one variable, in run order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableScores {
    pub variable: String,
    pub run_ids: Vec<RunId>,
    pub scores: Vec<f64>,
}

/// Per-run mean over the aggregated variables plus the winning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub scores: Vec<f64>,
    pub best_run_index: usize,
}

/// Average each run's score across variables and pick the lowest mean.
///
/// A run with a NaN score in any variable has a NaN aggregate and cannot win.
/// Columns must agree on run count and run order.
pub fn aggregate(columns: &[VariableScores]) -> Result<Aggregate, CompareError> {
    let first = columns
        .first()
        .ok_or_else(|| CompareError::ShapeMismatch("no variables to aggregate".into()))?;
    let n = first.run_ids.len();

    for column in columns {
        if column.scores.len() != column.run_ids.len() {
            return Err(CompareError::ShapeMismatch(format!(
                "variable '{}' has {} scores for {} runs",
                column.variable,
                column.scores.len(),
                column.run_ids.len()
            )));
        }
        if column.run_ids.len() != n {
            return Err(CompareError::ShapeMismatch(format!(
                "variable '{}' has {} runs, variable '{}' has {}",
                column.variable,
                column.run_ids.len(),
                first.variable,
                n
            )));
        }
        if column.run_ids != first.run_ids {
            return Err(CompareError::ShapeMismatch(format!(
                "variable '{}' orders runs differently from '{}'",
                column.variable, first.variable
            )));
        }
    }

    let count = columns.len() as f64;
    let scores: Vec<f64> = (0..n)
        .map(|i| columns.iter().map(|c| c.scores[i]).sum::<f64>() / count)
        .collect();

    let best_run_index = argmin(&scores).ok_or(CompareError::NoValidRuns)?;
    Ok(Aggregate {
        scores,
        best_run_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(variable: &str, scores: &[f64]) -> VariableScores {
        VariableScores {
            variable: variable.into(),
            run_ids: (0..scores.len()).map(|i| RunId::new(format!("run{i:03}"))).collect(),
            scores: scores.to_vec(),
        }
    }

    #[test]
    fn ranks_ascending_lower_is_better() {
        assert_eq!(rank(&[0.0, 100.0, 1.0], Orientation::LowerIsBetter), vec![1, 3, 2]);
    }

    #[test]
    fn ranks_correlations_by_magnitude() {
        // -1 is a perfect (anti-)correlation and ranks first.
        let ranks = rank(&[0.5, -1.0, 0.9], Orientation::MagnitudeNearOne);
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[test]
    fn nan_ranks_last_regardless_of_position() {
        assert_eq!(rank(&[f64::NAN, 2.0, 1.0], Orientation::LowerIsBetter), vec![3, 2, 1]);
        assert_eq!(rank(&[2.0, 1.0, f64::NAN], Orientation::LowerIsBetter), vec![2, 1, 3]);
    }

    #[test]
    fn multiple_nans_keep_input_order() {
        let ranks = rank(&[f64::NAN, 5.0, f64::NAN], Orientation::LowerIsBetter);
        assert_eq!(ranks, vec![2, 1, 3]);
    }

    #[test]
    fn ties_are_stable() {
        assert_eq!(rank(&[1.0, 1.0, 0.5], Orientation::LowerIsBetter), vec![2, 3, 1]);
    }

    #[test]
    fn argmin_first_occurrence_and_skips_nan() {
        assert_eq!(argmin(&[f64::NAN, 2.0, 1.0, 1.0]), Some(2));
        assert_eq!(argmin(&[f64::NAN]), None);
        assert_eq!(argmin(&[]), None);
    }

    #[test]
    fn aggregate_means_across_variables() {
        let agg = aggregate(&[column("U", &[0.0, 1.0, 0.5]), column("n", &[1.0, 0.0, 0.2])])
            .unwrap();
        assert_eq!(&agg.scores[..2], &[0.5, 0.5]);
        assert!((agg.scores[2] - 0.35).abs() < 1e-12);
        assert_eq!(agg.best_run_index, 2);
    }

    #[test]
    fn aggregate_tie_picks_first() {
        let agg = aggregate(&[column("U", &[0.2, 0.2])]).unwrap();
        assert_eq!(agg.best_run_index, 0);
    }

    #[test]
    fn aggregate_nan_run_cannot_win() {
        let agg =
            aggregate(&[column("U", &[0.0, 0.4]), column("n", &[f64::NAN, 0.4])]).unwrap();
        assert!(agg.scores[0].is_nan());
        assert_eq!(agg.best_run_index, 1);
    }

    #[test]
    fn aggregate_all_nan_has_no_winner() {
        let err = aggregate(&[column("U", &[f64::NAN, f64::NAN])]).unwrap_err();
        assert_eq!(err, CompareError::NoValidRuns);
    }

    #[test]
    fn aggregate_rejects_length_mismatch() {
        let err = aggregate(&[column("U", &[0.0, 1.0]), column("n", &[0.0])]).unwrap_err();
        assert!(matches!(err, CompareError::ShapeMismatch(_)));
    }

    #[test]
    fn aggregate_rejects_reordered_runs() {
        let a = column("U", &[0.0, 1.0]);
        let mut b = column("n", &[0.0, 1.0]);
        b.run_ids.reverse();
        assert!(matches!(aggregate(&[a, b]), Err(CompareError::ShapeMismatch(_))));
    }

    #[test]
    fn aggregate_of_nothing_is_shape_mismatch() {
        assert!(matches!(aggregate(&[]), Err(CompareError::ShapeMismatch(_))));
    }
}
