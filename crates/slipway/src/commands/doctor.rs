//! Doctor command — diagnose configuration and environment.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use slipway_core::config;
use slipway_core::scm;
use tracing::{debug, instrument};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // `doctor` has no flags of its own; `--json` is global.
}

/// Environment variables doctor reports on, with what each one does.
const WATCHED_ENV: [(&str, &str); 4] = [
    ("XDG_CONFIG_HOME", "Override config directory"),
    ("RUST_LOG", "Log filter directive"),
    ("SLIPWAY_LOG_PATH", "Explicit log file path"),
    ("SLIPWAY_LOG_DIR", "Log directory"),
];

#[derive(Serialize)]
struct DoctorReport {
    directories: DirectoryPaths,
    config: ConfigStatus,
    tools: ToolStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    data_local: Option<String>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Whether a project config file was found
    found: bool,
    /// Path to that file, if any
    file: Option<String>,
}

#[derive(Serialize)]
struct ToolStatus {
    /// Whether the git binary is on PATH
    git: bool,
}

#[derive(Serialize)]
struct EnvironmentInfo {
    cwd: Option<String>,
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

impl DoctorReport {
    fn gather(cwd: &camino::Utf8Path) -> Self {
        let config_file = config::find_project_config(cwd);

        Self {
            directories: DirectoryPaths {
                config: config::user_config_dir().map(camino::Utf8PathBuf::into_string),
                data_local: config::user_data_local_dir().map(camino::Utf8PathBuf::into_string),
            },
            config: ConfigStatus {
                found: config_file.is_some(),
                file: config_file.map(camino::Utf8PathBuf::into_string),
            },
            tools: ToolStatus {
                git: scm::git_available(),
            },
            environment: EnvironmentInfo {
                cwd: Some(cwd.to_string()),
                env_vars: WATCHED_ENV
                    .into_iter()
                    .map(|(name, description)| EnvVar {
                        name,
                        value: std::env::var(name).ok(),
                        description,
                    })
                    .collect(),
            },
        }
    }
}

/// Run diagnostics and report configuration status.
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").expect("valid spinner template"),
    );
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(cwd);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_config_status(&report.config)?;
    print_directories(&report.directories);
    print_tools(&report.tools);
    print_environment(&report.environment);
    Ok(())
}

fn print_config_status(status: &ConfigStatus) -> anyhow::Result<()> {
    println!("{}", "Configuration".bold().underline());
    match status.file.as_deref() {
        Some(file) => println!("  {} Config file: {}", "✓".green(), file.cyan()),
        None => {
            println!("  {} No config file found", "○".yellow());
            offer_config_creation()?;
        }
    }
    println!();
    Ok(())
}

fn print_directories(dirs: &DirectoryPaths) {
    println!("{}", "Directories".bold().underline());
    for (label, path) in [("Config", &dirs.config), ("Data (local)", &dirs.data_local)] {
        match path {
            Some(p) => println!("  {}: {}", label.dimmed(), p.cyan()),
            None => println!("  {}: {}", label.dimmed(), "(unavailable)".yellow()),
        }
    }
    println!();
}

fn print_tools(tools: &ToolStatus) {
    println!("{}", "Tools".bold().underline());
    if tools.git {
        println!("  {} git: found on PATH", "✓".green());
    } else {
        println!(
            "  {} git: not found (preflight and release need it)",
            "✗".red()
        );
    }
    println!();
}

fn print_environment(env: &EnvironmentInfo) {
    println!("{}", "Environment".bold().underline());
    if let Some(cwd) = &env.cwd {
        println!("  {}: {}", "Working directory".dimmed(), cwd.cyan());
    }

    let mut any_set = false;
    for var in &env.env_vars {
        if let Some(value) = &var.value {
            println!("  {}: {}", var.name.dimmed(), value.cyan());
            any_set = true;
        }
    }
    if !any_set {
        println!("  {} No XDG/logging overrides set", "○".dimmed());
    }
}

/// Offer to write a starter config when none exists and stdin is a TTY.
fn offer_config_creation() -> anyhow::Result<()> {
    use std::io::IsTerminal;

    let Some(config_dir) = config::user_config_dir() else {
        return Ok(());
    };
    if !std::io::stdin().is_terminal() {
        return Ok(());
    }

    let target = config_dir.join("config.yaml");
    let create = Confirm::new("Create a default config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {target}"))
        .prompt();
    if !matches!(create, Ok(true)) {
        // Declined, or the prompt was interrupted.
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    let starter = serde_saphyr::to_string(&config::Config::default())?;
    std::fs::write(&target, starter)?;
    println!("  {} Created {}", "✓".green(), target.cyan());

    Ok(())
}
