//! Reporting and export — JSON report and per-rotation result table.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: one row per run with drive parameter, per-variable corrected
//!   differences, and the important-variable average
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::input::is_plain_rotation_name;
use crate::report::{SessionReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SessionReport to JSON")
}

/// Deserialize a `SessionReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SessionReport> {
    let report: SessionReport =
        serde_json::from_str(json).context("failed to deserialize SessionReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── Result table ───────────────────────────────────────────────────

/// Export the result table.
///
/// Columns: drive_parameter, one column per compared variable (corrected
/// normalized difference), important_average. Rows follow run order; run
/// ids live in the JSON report. Excluded scores are written as `NaN`.
pub fn export_table(report: &SessionReport, delimiter: u8) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(vec![]);

    let mut header = vec!["drive_parameter".to_string()];
    header.extend(report.variables.iter().map(|v| v.variable.clone()));
    header.push("important_average".to_string());
    wtr.write_record(&header)?;

    for (i, drive) in report.drive_parameters.iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(drive.to_string());
        for variable in &report.variables {
            row.push(variable.corrected[i].to_string());
        }
        row.push(report.aggregate[i].to_string());
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Paths written by [`save_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub table: PathBuf,
    pub report: PathBuf,
}

/// Write `<rotation>_result.csv` and `<rotation>_report.json` under
/// `output_dir`, creating it if needed.
///
/// The rotation name must be a plain file-name component; anything that
/// could resolve outside `output_dir` is refused before touching disk.
pub fn save_report(report: &SessionReport, output_dir: &Path, delimiter: u8) -> Result<SavedReport> {
    if !is_plain_rotation_name(&report.rotation) {
        bail!(
            "rotation name '{}' is not usable as a file name",
            report.rotation
        );
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let table = output_dir.join(format!("{}_result.csv", report.rotation));
    std::fs::write(&table, export_table(report, delimiter)?)
        .with_context(|| format!("failed to write {}", table.display()))?;

    let json_path = output_dir.join(format!("{}_report.json", report.rotation));
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    Ok(SavedReport {
        table,
        report: json_path,
    })
}

/// Load a previously saved report.
pub fn load_report(path: &Path) -> Result<SessionReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
