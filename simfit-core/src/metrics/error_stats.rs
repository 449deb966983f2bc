//! Point-wise error metrics.

use crate::error::CompareError;

/// Mean squared error over paired values.
pub fn mean_squared_error(observed: &[f64], simulated: &[f64]) -> Result<f64, CompareError> {
    mean_of(observed, simulated, "mse", |d| d * d)
}

/// Mean absolute error over paired values.
pub fn mean_absolute_error(observed: &[f64], simulated: &[f64]) -> Result<f64, CompareError> {
    mean_of(observed, simulated, "mae", f64::abs)
}

fn mean_of(
    observed: &[f64],
    simulated: &[f64],
    context: &str,
    f: impl Fn(f64) -> f64,
) -> Result<f64, CompareError> {
    if observed.len() != simulated.len() {
        return Err(CompareError::ShapeMismatch(format!(
            "{context}: {} observed vs {} simulated values",
            observed.len(),
            simulated.len()
        )));
    }
    if observed.is_empty() {
        return Err(CompareError::insufficient(context, 1, 0));
    }
    let sum: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| f(o - s))
        .sum();
    Ok(sum / observed.len() as f64)
}
