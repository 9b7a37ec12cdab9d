//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `encore` binary.
//!
//! ## Commands
//!
//! - `run`: Replay a scenario and print every response
//! - `report`: Replay a scenario and print only the end-of-run artist report
//! - `completion`: Generate a shell completion script
//!
//! ## Examples
//!
//! ```bash
//! encore run scenario.json --pretty
//! encore report scenario.json --config prices.json
//! encore completion zsh > ~/.config/zsh/completions/_encore
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore: listening statistics, creator revenue & recommendations")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a scenario file and print all responses as JSON
    ///
    /// The scenario is a JSON array of timestamped commands. Output is one
    /// JSON array with a response per command, ending with the artist report.
    Run {
        /// Path to the scenario file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        scenario: PathBuf,

        /// Configuration file (defaults to the platform config directory)
        #[arg(short, long, env = "ENCORE_CONFIG", value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Replay a scenario file and print only the end-of-run report
    ///
    /// Artists appear in ranking order with their song revenue, merchandise
    /// revenue and most profitable song.
    Report {
        /// Path to the scenario file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        scenario: PathBuf,

        /// Configuration file (defaults to the platform config directory)
        #[arg(short, long, env = "ENCORE_CONFIG", value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    ///
    /// Usage: encore completion bash > ~/.local/share/bash-completion/completions/encore
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
