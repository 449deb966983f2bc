//! SimFit Runner — session orchestration, input loading, configuration, export.
//!
//! This crate builds on `simfit-core` to provide:
//! - TOML session configuration with validation and fingerprinting
//! - Rotation manifests and time-series CSV loading
//! - Comparison sessions (parallel per-run scoring, strict/lenient handling)
//! - JSON reports and delimited result tables

pub mod config;
pub mod export;
pub mod input;
pub mod report;
pub mod session;

pub use config::{AlignmentConfig, ConfigError, ObservedConfig, OutputConfig, SessionConfig};
pub use export::{export_json, export_table, import_json, load_report, save_report, SavedReport};
pub use input::{
    load_rotation, parse_series_csv, read_series_csv, LoadError, RotationInputs,
    RotationManifest, RunEntry,
};
pub use report::{Exclusion, SessionReport, VariableReport, SCHEMA_VERSION};
pub use session::{run_rotation, run_session, SessionError};
