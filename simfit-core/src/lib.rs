//! SimFit Core — comparison engine for validating simulation runs against observations.
//!
//! This crate contains the pure, stateless part of the pipeline:
//! - Domain types (time series, candidate runs, per-variable batches)
//! - Aligner: interpolation onto observed times or a shared overlap grid
//! - Metric registry: mse, mae, Spearman, Pearson, curve distance
//! - Normalizer: min-max or pass-through per metric
//! - Ranking engine: orientation correction, NaN-last ranks, aggregation
//! - Opacity mapper: rank to render weight

pub mod align;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod opacity;
pub mod rank;

pub use align::{AlignedPair, AlignmentMode, ExtrapolationPolicy, DEFAULT_GRID_POINTS};
pub use domain::{
    BatchCandidate, CandidateRun, MissingObservations, MissingSentinel, RunId, Sample,
    SeriesError, TimeSeries, VariableBatch,
};
pub use error::CompareError;
pub use metrics::{resolve, ComparisonSettings, Method, MetricSpec, UnknownMethod};
pub use normalize::{normalize, NormalizationPolicy};
pub use opacity::{opacities, opacity, OpacityRange};
pub use rank::{aggregate, argmin, orientation_correct, rank, Aggregate, Orientation, VariableScores};
