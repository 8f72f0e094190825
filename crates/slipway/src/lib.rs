//! Argument parser and command surface of the `slipway` binary.
//!
//! Everything clap-related lives here so that `xtask` can reuse the same
//! definitions when rendering man pages and shell completions; `main.rs`
//! only wires parsing to execution.
//!
//! - [`Cli`] — the root parser and its global flags
//! - [`Commands`] — one variant per subcommand
//! - [`commands`] — the implementations

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Set the process-wide color mode. Call once at startup.
    pub fn apply(self) {
        let force = match self {
            // owo-colors detects the terminal on its own.
            Self::Auto => return,
            Self::Always => true,
            Self::Never => false,
        };
        owo_colors::set_override(force);
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, slipway=trace)
    SLIPWAY_LOG_PATH        Explicit log file path
    SLIPWAY_LOG_DIR         Log directory
";

/// Command-line interface definition for slipway.
#[derive(Parser)]
#[command(
    name = "slipway",
    version,
    about = "Snapshot-aware version bookkeeping and release automation",
    after_long_help = ENV_HELP
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Merge FILE on top of discovered configuration
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log detail (repeatable: -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Diagnose configuration and environment
    Doctor(commands::doctor::DoctorArgs),

    /// Show package and project information
    Info(commands::info::InfoArgs),

    /// Check release readiness
    Preflight(commands::preflight::PreflightArgs),

    /// Run the full release sequence
    Release(commands::release::ReleaseArgs),

    /// Increment the project version
    Bump(commands::bump::BumpArgs),

    /// Append the snapshot marker to the project version
    Snapshot(commands::snapshot::SnapshotArgs),

    /// Strip the snapshot marker from the project version
    Stable(commands::snapshot::StableArgs),

    /// Overwrite the project version with an explicit value
    SetVersion(commands::set_version::SetVersionArgs),
}

/// The clap command tree, for man-page and completion generation.
pub fn command() -> clap::Command {
    Cli::command()
}
