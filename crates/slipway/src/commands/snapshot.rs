//! Snapshot commands — toggle the snapshot marker on the declared version.

use clap::Args;
use tracing::{debug, instrument};

use slipway_core::config::Config;
use slipway_core::descriptor;
use slipway_core::version::Version;

/// Arguments for the `snapshot` subcommand.
#[derive(Args, Debug, Default)]
pub struct SnapshotArgs {
    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `stable` subcommand.
#[derive(Args, Debug, Default)]
pub struct StableArgs {
    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Mark the declared version as a snapshot.
///
/// The transition is total; a version that is already a snapshot comes
/// through unchanged and the descriptor stays untouched.
#[instrument(name = "cmd_snapshot", skip_all, fields(json_output))]
pub fn cmd_snapshot(
    args: SnapshotArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = global_json,
        dry_run = args.dry_run,
        "executing snapshot command"
    );

    let descriptor = super::open_descriptor(config, cwd)?;

    if args.dry_run {
        let current = Version::parse(&descriptor.version()?);
        return super::report_transition_plan(&current, Some(current.to_snapshot()), global_json);
    }

    let outcome = descriptor::apply_transition(&descriptor, |v| Some(v.to_snapshot()))?;

    super::report_mutation(&outcome, global_json)
}

/// Strip the snapshot marker from the declared version.
#[instrument(name = "cmd_stable", skip_all, fields(json_output))]
pub fn cmd_stable(
    args: StableArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = global_json,
        dry_run = args.dry_run,
        "executing stable command"
    );

    let descriptor = super::open_descriptor(config, cwd)?;

    if args.dry_run {
        let current = Version::parse(&descriptor.version()?);
        return super::report_transition_plan(&current, Some(current.to_stable()), global_json);
    }

    let outcome = descriptor::apply_transition(&descriptor, |v| Some(v.to_stable()))?;

    super::report_mutation(&outcome, global_json)
}
