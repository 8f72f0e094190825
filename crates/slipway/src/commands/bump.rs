//! Bump command — increment one component of the declared version.

use clap::Args;
use tracing::{debug, instrument};

use slipway_core::config::Config;
use slipway_core::descriptor;
use slipway_core::version::{BumpLevel, Version};

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Which component to increment
    #[arg(value_enum)]
    pub level: BumpLevel,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the bump command.
///
/// Bumping an opaque version is a soft no-op: the skip is reported and the
/// command still exits successfully.
#[instrument(name = "cmd_bump", skip_all, fields(json_output))]
pub fn cmd_bump(
    args: BumpArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = global_json,
        level = %args.level,
        dry_run = args.dry_run,
        "executing bump command"
    );

    let descriptor = super::open_descriptor(config, cwd)?;

    if args.dry_run {
        let current = Version::parse(&descriptor.version()?);
        return super::report_transition_plan(&current, current.bump(args.level), global_json);
    }

    let outcome = descriptor::apply_transition(&descriptor, |v| v.bump(args.level))?;

    super::report_mutation(&outcome, global_json)
}
