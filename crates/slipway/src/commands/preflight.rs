//! Preflight command — the standalone release-readiness gate.

use anyhow::bail;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use slipway_core::config::Config;
use slipway_core::readiness::{self, ReadinessReport};
use slipway_core::scm::GitCli;

/// Arguments for the `preflight` subcommand.
#[derive(Args, Debug, Default)]
pub struct PreflightArgs {
    // Structured output comes from the global --json flag.
}

/// Run every readiness check and report the verdict. Exits nonzero when
/// the project is not fit to release, so CI can gate on it.
#[instrument(name = "cmd_preflight", skip_all, fields(json_output))]
pub fn cmd_preflight(
    _args: PreflightArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing preflight command");

    let scm = GitCli::new(cwd);
    if !scm.is_inside_repo()? {
        bail!("not inside a git repository");
    }

    let descriptor = super::open_descriptor(config, cwd)?;
    let current = descriptor.version()?;
    let dependencies = descriptor.dependency_revisions()?;

    let report = readiness::run_readiness(&scm, &dependencies, &current)?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.ready {
        Ok(())
    } else {
        Err(anyhow::anyhow!("preflight checks failed"))
    }
}

fn print_report(report: &ReadinessReport) {
    println!("{}", "Preflight".bold().underline());
    println!();

    for check in &report.checks {
        let icon = if check.passed {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        println!("  {icon} {}: {}", check.name.bold(), check.message);
    }

    println!();
    if report.ready {
        println!("  {} 🚀", "Ready to release!".green().bold());
        return;
    }
    let blocking = report.checks.iter().filter(|check| !check.passed).count();
    println!(
        "  {} — resolve them before releasing",
        format!("{blocking} blocking issue(s)").red().bold(),
    );
}
