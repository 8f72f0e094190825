//! `cargo xtask` — developer chores for the slipway workspace.
//!
//! Completion scripts and man pages land under `dist/` at the workspace
//! root; `install` drops a release build into `~/.bin`.

#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "xtask", about = "Workspace maintenance tasks")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Debug)]
enum Task {
    /// Generate shell completion scripts for the slipway CLI.
    Completions(commands::completions::CompletionsArgs),

    /// Generate man pages for the slipway CLI.
    Man(commands::man::ManArgs),

    /// Build slipway in release mode and install it for local use.
    Install(commands::install::InstallArgs),
}

fn main() -> Result<(), String> {
    match Xtask::parse().task {
        Task::Completions(args) => commands::completions::cmd_completions(args),
        Task::Man(args) => commands::man::cmd_man(args),
        Task::Install(args) => commands::install::cmd_install(args),
    }
}

/// The workspace root, one level above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let xtask_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    match xtask_dir.parent() {
        Some(root) => root.to_path_buf(),
        None => xtask_dir,
    }
}
