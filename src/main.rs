//! # Encore - Music Platform Simulator
//!
//! Replays timestamped command streams against an in-memory music platform
//! and reports listening statistics, creator revenue and rankings.
//!
//! ## Usage
//!
//! ```bash
//! # Full response log
//! encore run scenario.json --pretty
//!
//! # Only the end-of-run artist report
//! encore report scenario.json
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use encore::cli::{self, Args};
use encore::config::SimulationConfig;
use encore::{completion, scenario};
use log::{debug, info};
use std::path::Path;

fn replay(path: &Path, config: Option<&Path>) -> Result<Vec<scenario::Response>> {
    let config = SimulationConfig::load(config)?;
    debug!("Using {config:?}");
    let commands = scenario::load_scenario(path)?;
    info!("Replaying {} from {}", commands.len(), path.display());
    scenario::run_scenario(commands, config)
        .with_context(|| format!("Scenario {} aborted", path.display()))
}

/// Main entry point for the Encore application.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug encore run s.json` - Enable debug logging
/// - `RUST_LOG=encore::stats=trace encore run s.json` - Every recorded play
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        cli::Command::Run {
            scenario,
            config,
            pretty,
        } => {
            let responses = replay(&scenario, config.as_deref())?;
            let output = if pretty {
                serde_json::to_string_pretty(&responses)?
            } else {
                serde_json::to_string(&responses)?
            };
            println!("{output}");
        }
        cli::Command::Report { scenario, config } => {
            let responses = replay(&scenario, config.as_deref())?;
            let report = responses.last().and_then(|r| r.result.as_ref());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        cli::Command::Completion { shell } => {
            let mut cmd = Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
    }

    Ok(())
}
