//! Comparison session — wires alignment, metrics, normalization, ranking
//! and opacity into one batch computation per rotation.
//!
//! Per-run scoring has no shared state, so each variable's runs are scored
//! on the rayon pool (or sequentially when `parallel = false`); results are
//! collected back in run order, so both paths produce identical reports.

use std::collections::BTreeMap;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use simfit_core::metrics::spearman;
use simfit_core::{
    aggregate, argmin, normalize, opacities, orientation_correct, rank, resolve, BatchCandidate,
    CandidateRun, CompareError, ComparisonSettings, MetricSpec, RunId, TimeSeries, VariableBatch,
    VariableScores,
};

use crate::config::{ConfigError, SessionConfig};
use crate::input::RotationInputs;
use crate::report::{Exclusion, SessionReport, VariableReport, SCHEMA_VERSION};

/// Errors that abort a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("no candidate runs supplied")]
    NoRuns,
    #[error("no observed series for variable '{0}'")]
    MissingObserved(String),
    #[error("run '{run_id}' failed on variable '{variable}': {source}")]
    Run {
        run_id: RunId,
        variable: String,
        #[source]
        source: CompareError,
    },
    #[error("aggregation failed: {0}")]
    Aggregate(#[source] CompareError),
}

/// Run a session over inputs loaded from a rotation manifest.
pub fn run_rotation(
    config: &SessionConfig,
    inputs: &RotationInputs,
) -> Result<SessionReport, SessionError> {
    run_session(config, &inputs.rotation, &inputs.observed, &inputs.runs)
}

/// Compare every run against the observations and pick the best fit.
///
/// In lenient mode a run that fails on a variable is recorded as an
/// [`Exclusion`], scored NaN, and ranked last for that variable. In strict
/// mode the first failure (in run order) aborts the session. Fatal errors
/// (see [`CompareError::is_fatal`]) abort in either mode.
pub fn run_session(
    config: &SessionConfig,
    rotation: &str,
    observed: &BTreeMap<String, TimeSeries>,
    runs: &[CandidateRun],
) -> Result<SessionReport, SessionError> {
    config.validate()?;
    if runs.is_empty() {
        return Err(SessionError::NoRuns);
    }

    let spec = resolve(config.method);
    let settings = config.comparison_settings();
    let sentinel = config.missing_sentinel();
    let run_ids: Vec<RunId> = runs.iter().map(|r| r.id.clone()).collect();

    let mut variables = Vec::with_capacity(config.variables.len());
    let mut exclusions = Vec::new();

    for variable in &config.variables {
        let observed_series = observed
            .get(variable)
            .ok_or_else(|| SessionError::MissingObserved(variable.clone()))?;
        let batch = VariableBatch::assemble(variable, observed_series, runs, sentinel);
        if batch.missing.dropped > 0 {
            debug!(
                variable = %variable,
                dropped = batch.missing.dropped,
                "dropped missing observations"
            );
        }

        let outcomes = score_batch(&batch, &spec, &settings, config.parallel);

        let mut raw = Vec::with_capacity(batch.len());
        for (candidate, outcome) in batch.candidates.iter().zip(outcomes) {
            match outcome {
                Ok(score) => raw.push(score),
                Err(source) if config.strict || source.is_fatal() => {
                    return Err(SessionError::Run {
                        run_id: candidate.run_id.clone(),
                        variable: variable.clone(),
                        source,
                    });
                }
                Err(source) => {
                    warn!(
                        run = %candidate.run_id,
                        variable = %variable,
                        error = %source,
                        "excluding run from ranking"
                    );
                    exclusions.push(Exclusion {
                        run_id: candidate.run_id.clone(),
                        variable: variable.clone(),
                        reason: source,
                    });
                    raw.push(f64::NAN);
                }
            }
        }

        let normalized = normalize(&raw, spec.normalization);
        let corrected = orientation_correct(&normalized, spec.orientation);
        let ranks = rank(&raw, spec.orientation);
        let opacities = opacities(&ranks, config.opacity);

        variables.push(VariableReport {
            variable: variable.clone(),
            important: config.is_important(variable),
            best_run_index: argmin(&corrected),
            raw_scores: raw,
            normalized,
            corrected,
            ranks,
            opacities,
            missing_observations: batch.missing,
        });
    }

    let columns: Vec<VariableScores> = variables
        .iter()
        .filter(|v| v.important)
        .map(|v| VariableScores {
            variable: v.variable.clone(),
            run_ids: run_ids.clone(),
            scores: v.corrected.clone(),
        })
        .collect();
    let agg = aggregate(&columns).map_err(SessionError::Aggregate)?;

    let drive_parameters: Vec<f64> = runs.iter().map(|r| r.drive_parameter).collect();
    let best = &runs[agg.best_run_index];
    let drive_correlation = drive_correlation(&drive_parameters, &agg.scores);

    info!(
        rotation,
        method = %config.method,
        runs = runs.len(),
        variables = config.variables.len(),
        excluded = exclusions.len(),
        best_run = %best.id,
        drive_parameter = best.drive_parameter,
        "session complete"
    );

    Ok(SessionReport {
        schema_version: SCHEMA_VERSION,
        rotation: rotation.to_string(),
        method: config.method,
        config_fingerprint: config.fingerprint(),
        run_ids,
        drive_parameters,
        variables,
        aggregate: agg.scores,
        best_run_index: agg.best_run_index,
        best_run_id: best.id.clone(),
        best_drive_parameter: best.drive_parameter,
        drive_correlation,
        exclusions,
    })
}

/// Score every candidate of one batch, in candidate order.
fn score_batch(
    batch: &VariableBatch<'_>,
    spec: &MetricSpec,
    settings: &ComparisonSettings,
    parallel: bool,
) -> Vec<Result<f64, CompareError>> {
    let score_one = |candidate: &BatchCandidate<'_>| match candidate.series {
        Some(simulated) => spec.compare(&batch.observed, simulated, settings),
        None => Err(CompareError::MissingVariable(batch.variable.clone())),
    };

    if parallel {
        batch.candidates.par_iter().map(score_one).collect()
    } else {
        batch.candidates.iter().map(score_one).collect()
    }
}

fn drive_correlation(drive_parameters: &[f64], aggregate: &[f64]) -> Option<f64> {
    let (drives, scores): (Vec<f64>, Vec<f64>) = drive_parameters
        .iter()
        .zip(aggregate)
        .filter(|(_, score)| !score.is_nan())
        .map(|(d, s)| (*d, *s))
        .unzip();
    spearman(&drives, &scores).ok()
}
