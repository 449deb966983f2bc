//! Candidate simulation runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::series::TimeSeries;

/// One simulation execution: a series per variable plus its drive parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRun {
    pub id: RunId,
    /// Scalar simulation input whose relation to fit quality is under study.
    pub drive_parameter: f64,
    pub series: BTreeMap<String, TimeSeries>,
}

impl CandidateRun {
    pub fn new(id: impl Into<String>, drive_parameter: f64) -> Self {
        Self {
            id: RunId::new(id),
            drive_parameter,
            series: BTreeMap::new(),
        }
    }

    pub fn with_series(mut self, variable: impl Into<String>, series: TimeSeries) -> Self {
        self.series.insert(variable.into(), series);
        self
    }

    pub fn variable(&self, name: &str) -> Option<&TimeSeries> {
        self.series.get(name)
    }
}
