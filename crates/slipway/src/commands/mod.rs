//! Command implementations

pub mod bump;

pub mod doctor;

pub mod info;

pub mod preflight;

pub mod release;

pub mod set_version;

pub mod snapshot;

use camino::Utf8Path;
use owo_colors::OwoColorize;
use slipway_core::config::Config;
use slipway_core::descriptor::{Descriptor, DescriptorSettings, MutationOutcome};
use slipway_core::version::Version;

/// Open the version descriptor for the project at `cwd`.
///
/// Shared across commands that read or rewrite the declared version
/// (preflight, release, and all of the version mutations).
pub fn open_descriptor(config: &Config, cwd: &Utf8Path) -> anyhow::Result<Descriptor> {
    let settings = DescriptorSettings::from_config(config)?;
    Ok(Descriptor::open(cwd, &settings)?)
}

/// Print a version-mutation outcome in text or JSON form.
///
/// Shared across the version commands (bump, snapshot, stable, set-version).
pub fn report_mutation(outcome: &MutationOutcome, global_json: bool) -> anyhow::Result<()> {
    if global_json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        MutationOutcome::Applied {
            previous,
            next,
            file,
            changed: true,
        } => {
            println!(
                "  {} Version {} → {}",
                "✓".green(),
                previous.dimmed(),
                next.green().bold()
            );
            println!("  {} {}", "→".dimmed(), file.as_str().cyan());
        }
        MutationOutcome::Applied {
            next,
            file,
            changed: false,
            ..
        } => {
            println!(
                "  {} Version already {} — {} untouched",
                "○".yellow(),
                next.bold(),
                file.as_str().cyan()
            );
        }
        MutationOutcome::Unsupported { current } => {
            println!(
                "  {} {} is not a semantic version; nothing to change",
                "○".yellow(),
                current.bold()
            );
        }
    }

    Ok(())
}

/// Display a computed transition without applying it (`--dry-run`).
///
/// `next` is `None` when the transition is undefined for the current value,
/// mirroring the soft no-op of the real mutation.
pub fn report_transition_plan(
    current: &Version,
    next: Option<Version>,
    global_json: bool,
) -> anyhow::Result<()> {
    if global_json {
        let plan = match &next {
            Some(next) => serde_json::json!({
                "previous": current,
                "next": next,
                "dry_run": true,
            }),
            None => serde_json::json!({
                "status": "unsupported",
                "current": current,
                "dry_run": true,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    match next {
        Some(next) => {
            println!(
                "{}: {} → {}",
                "Version".bold(),
                current.to_string().dimmed(),
                next.to_string().green().bold()
            );
            println!();
            println!("{}", "Dry run — no changes made.".yellow());
        }
        None => {
            println!(
                "  {} {} is not a semantic version; nothing to change",
                "○".yellow(),
                current.to_string().bold()
            );
        }
    }

    Ok(())
}
