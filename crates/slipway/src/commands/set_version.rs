//! Set-version command — overwrite the declared version with a given value.

use clap::Args;
use tracing::{debug, instrument};

use slipway_core::config::Config;
use slipway_core::descriptor;
use slipway_core::version::Version;

/// Arguments for the `set-version` subcommand.
#[derive(Args, Debug)]
pub struct SetVersionArgs {
    /// The version to write (e.g., "1.2.3" or "1.2.3-SNAPSHOT")
    #[arg(value_name = "VERSION")]
    pub version: String,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the set-version command.
///
/// The value is parsed the same way declared versions are, so opaque text is
/// accepted and written verbatim.
#[instrument(name = "cmd_set_version", skip_all, fields(json_output))]
pub fn cmd_set_version(
    args: SetVersionArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = global_json,
        version = %args.version,
        dry_run = args.dry_run,
        "executing set-version command"
    );

    let next = Version::parse(&args.version);
    let descriptor = super::open_descriptor(config, cwd)?;

    if args.dry_run {
        let current = Version::parse(&descriptor.version()?);
        return super::report_transition_plan(&current, Some(next), global_json);
    }

    let outcome = descriptor::apply_transition(&descriptor, |_| Some(next))?;

    super::report_mutation(&outcome, global_json)
}
