//! Per-variable comparison batch.

use super::ids::RunId;
use super::run::CandidateRun;
use super::series::{MissingObservations, MissingSentinel, TimeSeries};

/// The candidate side of a batch: a run's series for this variable, if it has one.
#[derive(Debug, Clone)]
pub struct BatchCandidate<'a> {
    pub run_id: &'a RunId,
    pub series: Option<&'a TimeSeries>,
}

/// One observed series plus every run's series for the same variable.
///
/// The observed series is already stripped of missing samples, and candidate
/// order matches the run order the batch was assembled from.
#[derive(Debug, Clone)]
pub struct VariableBatch<'a> {
    pub variable: String,
    pub observed: TimeSeries,
    pub candidates: Vec<BatchCandidate<'a>>,
    pub missing: MissingObservations,
}

impl<'a> VariableBatch<'a> {
    pub fn assemble(
        variable: &str,
        observed: &TimeSeries,
        runs: &'a [CandidateRun],
        sentinel: MissingSentinel,
    ) -> Self {
        let (observed, missing) = observed.strip_missing(sentinel);
        let candidates = runs
            .iter()
            .map(|run| BatchCandidate {
                run_id: &run.id,
                series: run.variable(variable),
            })
            .collect();

        Self {
            variable: variable.to_string(),
            observed,
            candidates,
            missing,
        }
    }

    /// Number of candidate runs (N).
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn run_ids(&self) -> Vec<RunId> {
        self.candidates.iter().map(|c| c.run_id.clone()).collect()
    }
}
