//! Domain types: time series, candidate runs, per-variable batches.

pub mod batch;
pub mod ids;
pub mod run;
pub mod series;

pub use batch::{BatchCandidate, VariableBatch};
pub use ids::RunId;
pub use run::CandidateRun;
pub use series::{MissingObservations, MissingSentinel, Sample, SeriesError, TimeSeries};
