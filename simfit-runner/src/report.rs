//! Session report — everything downstream consumers (tables, plots) need.

use serde::{Deserialize, Serialize};

use simfit_core::{CompareError, Method, MissingObservations, RunId};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A run left out of one variable's ranking, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub run_id: RunId,
    pub variable: String,
    pub reason: CompareError,
}

/// Per-variable verdict. Every vector is indexed by run, in session run order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableReport {
    pub variable: String,
    /// Whether this variable feeds the overall aggregate.
    pub important: bool,
    /// Metric output; NaN for excluded runs.
    #[serde(with = "nan_as_null")]
    pub raw_scores: Vec<f64>,
    /// Raw scores after the metric's normalization policy.
    #[serde(with = "nan_as_null")]
    pub normalized: Vec<f64>,
    /// Normalized scores on the common lower-is-better scale.
    #[serde(with = "nan_as_null")]
    pub corrected: Vec<f64>,
    pub ranks: Vec<usize>,
    pub opacities: Vec<f64>,
    pub best_run_index: Option<usize>,
    pub missing_observations: MissingObservations,
}

/// Complete result of one comparison session (one rotation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub rotation: String,
    pub method: Method,
    pub config_fingerprint: String,
    pub run_ids: Vec<RunId>,
    pub drive_parameters: Vec<f64>,
    pub variables: Vec<VariableReport>,
    /// Mean corrected score over the important variables, per run.
    #[serde(with = "nan_as_null")]
    pub aggregate: Vec<f64>,
    pub best_run_index: usize,
    pub best_run_id: RunId,
    pub best_drive_parameter: f64,
    /// Spearman correlation of drive parameter against aggregate score over
    /// runs with a valid aggregate. `None` when fewer than two such runs or
    /// either side is constant.
    pub drive_correlation: Option<f64>,
    pub exclusions: Vec<Exclusion>,
}

impl SessionReport {
    pub fn variable(&self, name: &str) -> Option<&VariableReport> {
        self.variables.iter().find(|v| v.variable == name)
    }

    pub fn run_count(&self) -> usize {
        self.run_ids.len()
    }

    /// Runs excluded from at least one variable, in run order, without repeats.
    pub fn excluded_runs(&self) -> Vec<&RunId> {
        self.run_ids
            .iter()
            .filter(|id| self.exclusions.iter().any(|e| &e.run_id == *id))
            .collect()
    }

    pub fn important_variables(&self) -> impl Iterator<Item = &VariableReport> {
        self.variables.iter().filter(|v| v.important)
    }

    /// Observed samples dropped as missing, summed over variables.
    pub fn missing_observation_count(&self) -> usize {
        self.variables
            .iter()
            .map(|v| v.missing_observations.dropped)
            .sum()
    }
}

/// JSON has no NaN; excluded scores travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let opts: Vec<Option<f64>> = values
            .iter()
            .map(|v| if v.is_nan() { None } else { Some(*v) })
            .collect();
        opts.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let opts = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(opts.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
