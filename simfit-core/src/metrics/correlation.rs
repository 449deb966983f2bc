//! Correlation metrics: Spearman rank correlation and Pearson correlation.

use crate::error::CompareError;

/// Spearman rank correlation: Pearson correlation of average ranks.
///
/// Tied values share the mean of the ranks they span.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64, CompareError> {
    check_pair("scc", x, y)?;
    let rx = average_ranks(x);
    let ry = average_ranks(y);
    pearson_inner("scc", &rx, &ry)
}

/// Pearson linear correlation coefficient.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, CompareError> {
    check_pair("pcc", x, y)?;
    pearson_inner("pcc", x, y)
}

fn check_pair(context: &str, x: &[f64], y: &[f64]) -> Result<(), CompareError> {
    if x.len() != y.len() {
        return Err(CompareError::ShapeMismatch(format!(
            "{context}: {} observed vs {} simulated values",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(CompareError::insufficient(context, 2, x.len()));
    }
    Ok(())
}

fn pearson_inner(context: &str, x: &[f64], y: &[f64]) -> Result<f64, CompareError> {
    let dx = scaled_deviations(x).ok_or_else(|| {
        CompareError::DegenerateRange(format!("{context}: observed series is constant"))
    })?;
    let dy = scaled_deviations(y).ok_or_else(|| {
        CompareError::DegenerateRange(format!("{context}: simulated series is constant"))
    })?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in dx.iter().zip(&dy) {
        cov += a * b;
        var_x += a * a;
        var_y += b * b;
    }

    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Deviations from the mean divided by the largest absolute deviation, or
/// `None` for a constant series.
///
/// The correlation is scale-invariant, and rescaling keeps the squared sums
/// from underflowing when the values themselves are tiny.
fn scaled_deviations(values: &[f64]) -> Option<Vec<f64>> {
    if values.iter().all(|&v| v == values[0]) {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let deviations: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let scale = deviations.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    if scale == 0.0 {
        return None;
    }
    Some(deviations.into_iter().map(|d| d / scale).collect())
}

/// 1-based ranks with ties averaged.
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}
