//! Rotation inputs — manifest parsing and time-series CSV loading.
//!
//! A rotation manifest (TOML) names the observed CSV and every candidate run:
//!
//! ```toml
//! rotation = "20140902"
//! observed = "observed.csv"
//!
//! [[runs]]
//! id = "run001_AWSoM"
//! drive_parameter = 0.3
//! path = "run001.csv"
//! ```
//!
//! Series CSVs have a time column first, then one column per variable:
//! `time,U,n,ti,B`. Times are ISO-8601 datetimes (sub-second precision is
//! truncated), RFC 3339 timestamps, or integer epoch seconds. Empty cells and
//! `NaN` mark missing values. Relative paths resolve against the manifest's
//! directory.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use simfit_core::{CandidateRun, SeriesError, TimeSeries};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rotation manifest: {0}")]
    Manifest(#[from] toml::de::Error),
    #[error("CSV error in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("{origin}: expected a time column followed by at least one variable column")]
    MissingColumns { origin: String },
    #[error("{origin} row {row}: unparseable timestamp '{value}'")]
    Timestamp {
        origin: String,
        row: usize,
        value: String,
    },
    #[error("{origin} row {row}, column '{column}': unparseable value '{value}'")]
    Value {
        origin: String,
        row: usize,
        column: String,
        value: String,
    },
    #[error("{origin}: {source}")]
    Series {
        origin: String,
        #[source]
        source: SeriesError,
    },
    #[error("run '{0}' appears more than once in the manifest")]
    DuplicateRun(String),
    #[error("rotation manifest lists no runs")]
    NoRuns,
    #[error("rotation name '{0}' must be a plain file name (no separators or '..')")]
    InvalidRotation(String),
}

/// One candidate run entry in a rotation manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub id: String,
    pub drive_parameter: f64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationManifest {
    pub rotation: String,
    pub observed: PathBuf,
    pub runs: Vec<RunEntry>,
}

impl RotationManifest {
    pub fn from_toml_str(s: &str) -> Result<Self, LoadError> {
        let manifest: Self = toml::from_str(s)?;
        if !is_plain_rotation_name(&manifest.rotation) {
            return Err(LoadError::InvalidRotation(manifest.rotation));
        }
        if manifest.runs.is_empty() {
            return Err(LoadError::NoRuns);
        }
        let mut seen = HashSet::new();
        for run in &manifest.runs {
            if !seen.insert(run.id.as_str()) {
                return Err(LoadError::DuplicateRun(run.id.clone()));
            }
        }
        Ok(manifest)
    }
}

/// True when `name` is a single normal path component, so output files
/// named after the rotation stay inside their directory.
pub(crate) fn is_plain_rotation_name(name: &str) -> bool {
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Everything loaded for one rotation, ready for a session.
#[derive(Debug, Clone)]
pub struct RotationInputs {
    pub rotation: String,
    pub observed: BTreeMap<String, TimeSeries>,
    pub runs: Vec<CandidateRun>,
}

/// Load a manifest and every CSV it references.
pub fn load_rotation(manifest_path: &Path) -> Result<RotationInputs, LoadError> {
    let text = read_to_string(manifest_path)?;
    let manifest = RotationManifest::from_toml_str(&text)?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let observed = read_series_csv(&base.join(&manifest.observed))?;
    let runs = manifest
        .runs
        .iter()
        .map(|entry| {
            let series = read_series_csv(&base.join(&entry.path))?;
            Ok(CandidateRun {
                id: entry.id.as_str().into(),
                drive_parameter: entry.drive_parameter,
                series,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(RotationInputs {
        rotation: manifest.rotation,
        observed,
        runs,
    })
}

/// Read a wide series CSV into one `TimeSeries` per variable column.
pub fn read_series_csv(path: &Path) -> Result<BTreeMap<String, TimeSeries>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_series_csv(file, &path.display().to_string())
}

pub fn parse_series_csv<R: Read>(
    reader: R,
    origin: &str,
) -> Result<BTreeMap<String, TimeSeries>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    if headers.len() < 2 {
        return Err(LoadError::MissingColumns {
            origin: origin.to_string(),
        });
    }
    let variables: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut datetimes = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); variables.len()];

    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // Row numbers are 1-based and count the header.
        let row = i + 2;

        let raw_time = record.get(0).unwrap_or("");
        let time = parse_timestamp(raw_time).ok_or_else(|| LoadError::Timestamp {
            origin: origin.to_string(),
            row,
            value: raw_time.to_string(),
        })?;
        datetimes.push(time);

        for (col, variable) in variables.iter().enumerate() {
            let raw = record.get(col + 1).unwrap_or("");
            let value = parse_value(raw).ok_or_else(|| LoadError::Value {
                origin: origin.to_string(),
                row,
                column: variable.clone(),
                value: raw.to_string(),
            })?;
            columns[col].push(value);
        }
    }

    variables
        .into_iter()
        .zip(columns)
        .map(|(variable, values)| {
            let series = TimeSeries::from_datetimes(&datetimes, values).map_err(|source| {
                LoadError::Series {
                    origin: format!("{origin} [{variable}]"),
                    source,
                }
            })?;
            Ok((variable, series))
        })
        .collect()
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_value(s: &str) -> Option<f64> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wide_csv_with_missing_cells() {
        let csv = "time,U,n\n\
                   2014-09-02T00:00:00.500,400.5,5.0\n\
                   2014-09-02T00:01:00,,6.0\n\
                   2014-09-02 00:02:00,410.0,NaN\n";
        let series = parse_series_csv(csv.as_bytes(), "obs.csv").unwrap();

        let u = &series["U"];
        assert_eq!(u.times(), &[1_409_616_000, 1_409_616_060, 1_409_616_120]);
        assert_eq!(u.values()[0], 400.5);
        assert!(u.values()[1].is_nan());
        assert!(series["n"].values()[2].is_nan());
    }

    #[test]
    fn accepts_epoch_and_rfc3339_times() {
        let csv = "time,U\n1409616000,1.0\n2014-09-02T00:01:00Z,2.0\n";
        let series = parse_series_csv(csv.as_bytes(), "run.csv").unwrap();
        assert_eq!(series["U"].times(), &[1_409_616_000, 1_409_616_060]);
    }

    #[test]
    fn reports_bad_timestamp_row() {
        let csv = "time,U\n2014-09-02T00:00:00,1.0\nyesterday,2.0\n";
        let err = parse_series_csv(csv.as_bytes(), "run.csv").unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { row: 3, .. }));
    }

    #[test]
    fn reports_bad_value() {
        let csv = "time,U\n2014-09-02T00:00:00,fast\n";
        let err = parse_series_csv(csv.as_bytes(), "run.csv").unwrap_err();
        assert!(matches!(err, LoadError::Value { ref column, .. } if column == "U"));
    }

    #[test]
    fn rejects_unsorted_times() {
        let csv = "time,U\n2014-09-02T00:01:00,1.0\n2014-09-02T00:00:00,2.0\n";
        let err = parse_series_csv(csv.as_bytes(), "run.csv").unwrap_err();
        assert!(matches!(err, LoadError::Series { .. }));
    }

    #[test]
    fn rejects_time_only_csv() {
        let err = parse_series_csv("time\n0\n".as_bytes(), "run.csv").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumns { .. }));
    }

    #[test]
    fn manifest_rejects_duplicate_runs() {
        let text = r#"
            rotation = "20140902"
            observed = "obs.csv"

            [[runs]]
            id = "run001"
            drive_parameter = 0.3
            path = "a.csv"

            [[runs]]
            id = "run001"
            drive_parameter = 0.4
            path = "b.csv"
        "#;
        let err = RotationManifest::from_toml_str(text).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateRun(id) if id == "run001"));
    }

    #[test]
    fn manifest_rejects_path_like_rotation() {
        for rotation in ["../escaped", "a/b", "a\\\\b", "..", "."] {
            let text = format!(
                "rotation = \"{rotation}\"\nobserved = \"obs.csv\"\n\n\
                 [[runs]]\nid = \"run001\"\ndrive_parameter = 0.3\npath = \"a.csv\"\n"
            );
            let err = RotationManifest::from_toml_str(&text).unwrap_err();
            assert!(
                matches!(err, LoadError::InvalidRotation(_)),
                "accepted {rotation:?}: {err}"
            );
        }
    }

    #[test]
    fn plain_rotation_names_accepted() {
        assert!(is_plain_rotation_name("20140902"));
        assert!(is_plain_rotation_name("cr2154_v2..final"));
        assert!(!is_plain_rotation_name(""));
        assert!(!is_plain_rotation_name("/abs"));
    }

    #[test]
    fn manifest_requires_runs() {
        let text = r#"
            rotation = "20140902"
            observed = "obs.csv"
            runs = []
        "#;
        assert!(matches!(
            RotationManifest::from_toml_str(text),
            Err(LoadError::NoRuns)
        ));
    }
}
