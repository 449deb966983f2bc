//! Session configuration, loaded from TOML.
//!
//! One `SessionConfig` is built per rotation and passed by reference into
//! every stage; nothing reads configuration from global state.
//!
//! ```toml
//! method = "mse"
//! variables = ["U", "n", "ti", "B"]
//! important_variables = ["U", "n"]
//! strict = false
//!
//! [alignment]
//! extrapolation = "clamp_extrapolation"
//! grid_points = 25
//! characteristic_duration_secs = 864000.0
//!
//! [opacity]
//! min = 0.3
//! max = 1.0
//!
//! [observed]
//! missing_value = -1e31
//!
//! [output]
//! delimiter = ","
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use simfit_core::metrics::DEFAULT_CHARACTERISTIC_DURATION_SECS;
use simfit_core::{
    ComparisonSettings, ExtrapolationPolicy, Method, MissingSentinel, OpacityRange,
    DEFAULT_GRID_POINTS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a comparison session needs besides its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub method: Method,

    /// Variables to compare, in report order.
    pub variables: Vec<String>,

    /// Subset of `variables` averaged into the overall verdict.
    pub important_variables: Vec<String>,

    /// Abort the session on the first per-run failure instead of excluding the run.
    #[serde(default)]
    pub strict: bool,

    /// Score runs on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    #[serde(default)]
    pub alignment: AlignmentConfig,

    #[serde(default)]
    pub opacity: OpacityRange,

    #[serde(default)]
    pub observed: ObservedConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub extrapolation: ExtrapolationPolicy,
    pub grid_points: usize,
    pub characteristic_duration_secs: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            extrapolation: ExtrapolationPolicy::ClampExtrapolation,
            grid_points: DEFAULT_GRID_POINTS,
            characteristic_duration_secs: DEFAULT_CHARACTERISTIC_DURATION_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservedConfig {
    /// Provider fill value treated as missing, in addition to NaN.
    pub missing_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Column separator for the result table.
    pub delimiter: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

fn default_parallel() -> bool {
    true
}

impl SessionConfig {
    /// Config with defaults for everything but the variable lists.
    pub fn new(method: Method, variables: &[&str], important_variables: &[&str]) -> Self {
        Self {
            method,
            variables: variables.iter().map(|v| v.to_string()).collect(),
            important_variables: important_variables.iter().map(|v| v.to_string()).collect(),
            strict: false,
            parallel: true,
            alignment: AlignmentConfig::default(),
            opacity: OpacityRange::default(),
            observed: ObservedConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variables.is_empty() {
            return Err(ConfigError::Invalid("`variables` must not be empty".into()));
        }
        if self.important_variables.is_empty() {
            return Err(ConfigError::Invalid(
                "`important_variables` must name at least one variable".into(),
            ));
        }
        for (i, v) in self.variables.iter().enumerate() {
            if self.variables[..i].contains(v) {
                return Err(ConfigError::Invalid(format!("variable '{v}' listed twice")));
            }
        }
        for v in &self.important_variables {
            if !self.variables.contains(v) {
                return Err(ConfigError::Invalid(format!(
                    "important variable '{v}' is not in `variables`"
                )));
            }
        }
        if self.alignment.grid_points < 2 {
            return Err(ConfigError::Invalid(format!(
                "alignment.grid_points must be at least 2, got {}",
                self.alignment.grid_points
            )));
        }
        let duration = self.alignment.characteristic_duration_secs;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "alignment.characteristic_duration_secs must be positive, got {duration}"
            )));
        }
        let OpacityRange { min, max } = self.opacity;
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(ConfigError::Invalid(format!(
                "opacity range must satisfy 0 <= min <= max <= 1, got [{min}, {max}]"
            )));
        }
        let delimiter = self.output.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\r' | '\n') {
            return Err(ConfigError::Invalid(format!(
                "output.delimiter must be an ASCII character other than a quote or line break, got {:?}",
                self.output.delimiter
            )));
        }
        Ok(())
    }

    pub fn comparison_settings(&self) -> ComparisonSettings {
        ComparisonSettings {
            extrapolation: self.alignment.extrapolation,
            grid_points: self.alignment.grid_points,
            characteristic_duration_secs: self.alignment.characteristic_duration_secs,
        }
    }

    pub fn missing_sentinel(&self) -> MissingSentinel {
        MissingSentinel {
            fill_value: self.observed.missing_value,
        }
    }

    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII; fall back to a comma otherwise.
        u8::try_from(self.output.delimiter).unwrap_or(b',')
    }

    pub fn is_important(&self, variable: &str) -> bool {
        self.important_variables.iter().any(|v| v == variable)
    }

    /// Deterministic BLAKE3 fingerprint of this configuration.
    ///
    /// Two sessions with identical configs share a fingerprint, which is
    /// stamped into every report for traceability.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        method = "curve_distance"
        variables = ["U", "n", "ti", "B"]
        important_variables = ["U", "n"]
        strict = true

        [alignment]
        extrapolation = "reject_out_of_range"
        grid_points = 50

        [opacity]
        min = 0.2
        max = 0.9

        [observed]
        missing_value = -1e31

        [output]
        delimiter = ";"
    "#;

    #[test]
    fn parses_full_config() {
        let config = SessionConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.method, Method::CurveDistance);
        assert_eq!(config.variables, vec!["U", "n", "ti", "B"]);
        assert!(config.strict);
        assert!(config.parallel);
        assert_eq!(
            config.alignment.extrapolation,
            ExtrapolationPolicy::RejectOutOfRange
        );
        assert_eq!(config.alignment.grid_points, 50);
        assert_eq!(
            config.alignment.characteristic_duration_secs,
            DEFAULT_CHARACTERISTIC_DURATION_SECS
        );
        assert_eq!(config.opacity, OpacityRange { min: 0.2, max: 0.9 });
        assert_eq!(config.observed.missing_value, Some(-1e31));
        assert_eq!(config.delimiter_byte(), b';');
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            variables = ["U"]
            important_variables = ["U"]
            "#,
        )
        .unwrap();
        assert_eq!(config.method, Method::Mse);
        assert!(!config.strict);
        assert_eq!(config.opacity, OpacityRange::default());
        assert_eq!(config.alignment.grid_points, DEFAULT_GRID_POINTS);
        assert_eq!(config.output.delimiter, ',');
    }

    #[test]
    fn rejects_unknown_method() {
        let err = SessionConfig::from_toml_str(
            r#"
            method = "rmse"
            variables = ["U"]
            important_variables = ["U"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_important_variable_outside_variables() {
        let config = SessionConfig::new(Method::Mse, &["U"], &["n"]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_opacity_range() {
        let mut config = SessionConfig::new(Method::Mse, &["U"], &["U"]);
        config.opacity = OpacityRange { min: 0.9, max: 0.1 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_tiny_grid() {
        let mut config = SessionConfig::new(Method::CurveDistance, &["U"], &["U"]);
        config.alignment.grid_points = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_quote_delimiter() {
        let err = SessionConfig::from_toml_str(
            r#"
            method = "mse"
            variables = ["U"]
            important_variables = ["U"]

            [output]
            delimiter = '"'
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("delimiter")));

        for delimiter in ['\r', '\n', 'é'] {
            let mut config = SessionConfig::new(Method::Mse, &["U"], &["U"]);
            config.output.delimiter = delimiter;
            assert!(config.validate().is_err(), "accepted {delimiter:?}");
        }

        let mut config = SessionConfig::new(Method::Mse, &["U"], &["U"]);
        config.output.delimiter = '\t';
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_variables() {
        let config = SessionConfig::new(Method::Mse, &["U", "U"], &["U"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = SessionConfig::new(Method::Mse, &["U", "n"], &["U"]);
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.method = Method::Mae;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = SessionConfig::from_toml_str(FULL).unwrap();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
    }
}
