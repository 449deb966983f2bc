//! SimFit CLI — compare rotations of simulation runs against observations.
//!
//! Commands:
//! - `compare` — load one or more rotation manifests, score every run, and
//!   write a result table and JSON report per rotation
//! - `check-config` — validate a session config and print its fingerprint

use anyhow::Result;
use clap::Parser;

use simfit_cli::{check_config, compare_rotations, init_logging, Cli, Commands};
use simfit_runner::SessionConfig;

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Compare {
            manifests,
            config,
            output_dir,
            strict,
        } => {
            let mut config = SessionConfig::load(&config)?;
            // --strict only tightens; a strict config stays strict.
            config.strict |= strict;
            compare_rotations(&manifests, &config, &output_dir, &mut stdout)?;
            Ok(())
        }
        Commands::CheckConfig { config } => check_config(&config, &mut stdout),
    }
}
