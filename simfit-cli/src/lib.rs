//! Command-line surface of SimFit: argument definitions and the command
//! bodies, kept out of `main.rs` so they can be driven from tests.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use simfit_runner::{
    load_rotation, run_rotation, save_report, RotationInputs, SavedReport, SessionConfig,
    SessionReport,
};

#[derive(Debug, Parser)]
#[command(
    name = "simfit",
    about = "SimFit CLI — rank simulation runs by fit to observed time series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare every run of one or more rotations against their observations.
    Compare {
        /// Rotation manifest (TOML), or a directory of manifests. Repeatable.
        #[arg(long = "manifest", required = true)]
        manifests: Vec<PathBuf>,

        /// Session config (TOML).
        #[arg(long)]
        config: PathBuf,

        /// Output directory for the result tables and reports.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Abort on the first failing run instead of excluding it.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Validate a session config and print its fingerprint.
    CheckConfig {
        /// Session config (TOML).
        #[arg(long)]
        config: PathBuf,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// One compared rotation and where its artifacts went.
#[derive(Debug)]
pub struct RotationOutcome {
    pub report: SessionReport,
    pub saved: SavedReport,
}

/// Expand `--manifest` arguments: files pass through, directories yield
/// their `*.toml` entries sorted by name.
pub fn collect_manifests(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    for path in paths {
        if !path.is_dir() {
            manifests.push(path.clone());
            continue;
        }
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("failed to list {}", path.display()))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry_path = entry
                .with_context(|| format!("failed to list {}", path.display()))?
                .path();
            if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "toml") {
                found.push(entry_path);
            }
        }
        if found.is_empty() {
            bail!("no rotation manifests (*.toml) in {}", path.display());
        }
        found.sort();
        manifests.extend(found);
    }
    Ok(manifests)
}

/// Load every manifest, then compare and save each rotation in turn.
///
/// All manifests are loaded before any comparison runs, so a bad manifest
/// or a rotation named twice fails the command without partial output.
pub fn compare_rotations(
    manifests: &[PathBuf],
    config: &SessionConfig,
    output_dir: &Path,
    out: &mut impl Write,
) -> Result<Vec<RotationOutcome>> {
    let manifests = collect_manifests(manifests)?;

    let mut rotations: Vec<RotationInputs> = Vec::with_capacity(manifests.len());
    let mut names = BTreeSet::new();
    for manifest in &manifests {
        let inputs = load_rotation(manifest)
            .with_context(|| format!("failed to load rotation from {}", manifest.display()))?;
        if !names.insert(inputs.rotation.clone()) {
            bail!(
                "rotation '{}' is listed by more than one manifest ({})",
                inputs.rotation,
                manifest.display()
            );
        }
        info!(
            rotation = %inputs.rotation,
            runs = inputs.runs.len(),
            strict = config.strict,
            "loaded rotation"
        );
        rotations.push(inputs);
    }

    writeln!(out, "Indexed {} rotations:", rotations.len())?;
    writeln!(out, "{}", names.iter().cloned().collect::<Vec<_>>().join(", "))?;

    let mut outcomes = Vec::with_capacity(rotations.len());
    for inputs in &rotations {
        let report = run_rotation(config, inputs)
            .with_context(|| format!("rotation '{}' failed", inputs.rotation))?;
        print_summary(&report, out)?;

        let saved = save_report(&report, output_dir, config.delimiter_byte())?;
        writeln!(out, "Result table: {}", saved.table.display())?;
        writeln!(out, "Report:       {}", saved.report.display())?;
        outcomes.push(RotationOutcome { report, saved });
    }
    Ok(outcomes)
}

pub fn check_config(config_path: &Path, out: &mut impl Write) -> Result<()> {
    let config = SessionConfig::load(config_path)?;
    writeln!(out, "Config OK")?;
    writeln!(out, "  method:      {}", config.method)?;
    writeln!(out, "  variables:   {}", config.variables.join(", "))?;
    writeln!(out, "  important:   {}", config.important_variables.join(", "))?;
    writeln!(out, "  strict:      {}", config.strict)?;
    writeln!(out, "  fingerprint: {}", config.fingerprint())?;
    Ok(())
}

pub fn print_summary(report: &SessionReport, out: &mut impl Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "=== Rotation {} ({}) ===", report.rotation, report.method)?;
    writeln!(out, "Runs compared: {}", report.run_count())?;

    for variable in &report.variables {
        let marker = if variable.important { "*" } else { " " };
        match variable.best_run_index {
            Some(i) => writeln!(
                out,
                "  {marker} {:<6} best: {} (drive parameter = {})",
                variable.variable, report.run_ids[i], report.drive_parameters[i]
            )?,
            None => writeln!(out, "  {marker} {:<6} no valid runs", variable.variable)?,
        }
    }

    if !report.exclusions.is_empty() {
        writeln!(out, "Excluded:")?;
        for exclusion in &report.exclusions {
            writeln!(
                out,
                "  {} [{}]: {}",
                exclusion.run_id, exclusion.variable, exclusion.reason
            )?;
        }
    }

    if let Some(corr) = report.drive_correlation {
        writeln!(out, "Drive parameter vs score (Spearman): {corr:.3}")?;
    }

    writeln!(
        out,
        "Best simulation run: {} (drive parameter = {})",
        report.best_run_id, report.best_drive_parameter
    )?;
    Ok(())
}
