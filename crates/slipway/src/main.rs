//! slipway CLI
#![deny(unsafe_code)]

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use slipway::{Cli, Commands, commands};
use slipway_core::config::ConfigLoader;
use tracing::debug;

mod logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = utf8_path(cwd, "current directory")?;

    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref path) = cli.config {
        loader = loader.with_file(utf8_path(path.clone(), "config path")?);
    }
    let config = loader.load().context("failed to load configuration")?;

    let filter = logging::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let log_dir = config.log_dir.as_deref().map(camino::Utf8Path::as_std_path);
    let _guard = logging::init(env!("CARGO_PKG_NAME"), log_dir, filter)
        .context("failed to initialize logging")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    let result = match cli.command {
        Commands::Doctor(args) => commands::doctor::cmd_doctor(args, cli.json, &cwd),
        Commands::Info(args) => commands::info::cmd_info(args, cli.json, &config, &cwd),
        Commands::Preflight(args) => {
            commands::preflight::cmd_preflight(args, cli.json, &config, &cwd)
        }
        Commands::Release(args) => commands::release::cmd_release(args, cli.json, &config, &cwd),
        Commands::Bump(args) => commands::bump::cmd_bump(args, cli.json, &config, &cwd),
        Commands::Snapshot(args) => commands::snapshot::cmd_snapshot(args, cli.json, &config, &cwd),
        Commands::Stable(args) => commands::snapshot::cmd_stable(args, cli.json, &config, &cwd),
        Commands::SetVersion(args) => {
            commands::set_version::cmd_set_version(args, cli.json, &config, &cwd)
        }
    };
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}

fn utf8_path(path: std::path::PathBuf, what: &str) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| anyhow::anyhow!("{what} is not valid UTF-8: {}", path.display()))
}
