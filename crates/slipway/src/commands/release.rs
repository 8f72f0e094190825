//! Release command — queue and run the release sequence.

use anyhow::{Context, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use slipway_core::config::Config;
use slipway_core::descriptor::{Descriptor, DescriptorSettings};
use slipway_core::readiness;
use slipway_core::release::{
    self, Executor, RELEASE_READY_TASK, ReleaseEvent, StepOutcome, StepQueue, TaskError,
    TaskRegistry,
};
use slipway_core::scm::GitCli;
use slipway_core::version::Version;

/// Arguments for the `release` subcommand.
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Preview what would happen without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Execute the release command.
#[instrument(name = "cmd_release", skip_all)]
pub fn cmd_release(
    args: ReleaseArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = global_json,
        dry_run = args.dry_run,
        "executing release command"
    );

    let scm = GitCli::new(cwd);
    if !scm.is_inside_repo()? {
        bail!("not inside a git repository");
    }

    let descriptor = super::open_descriptor(config, cwd)?;
    let current = descriptor.version()?;
    let stable = Version::parse(&current).to_stable().to_string();

    let is_dry = args.dry_run;

    // Display the plan header
    if !global_json {
        if is_dry {
            println!("\n{}", "DRY RUN — no changes will be made".yellow().bold());
        }
        println!(
            "\n{}: {} → {}",
            "Release".bold(),
            current.dimmed(),
            stable.green().bold(),
        );
        println!();
    }

    // Confirm before executing (unless dry-run, --yes, or config says no)
    if !is_dry && !global_json {
        let config_confirm = config
            .release
            .as_ref()
            .and_then(|r| r.confirm)
            .unwrap_or(true);

        if config_confirm && !args.yes {
            let confirmed = Confirm::new("Proceed with release?")
                .with_default(true)
                .prompt()
                .context("confirmation prompt failed")?;
            if !confirmed {
                println!("{}", "Release cancelled.".yellow());
                return Ok(());
            }
            println!();
        }
    }

    // Queue the sequence behind the readiness gate. The gate answers with
    // live project state, so nothing is queued against a dirty tree.
    let registry = readiness_registry(config, cwd)?;
    let queue = release::queue_release(
        &registry,
        &StepQueue::new(),
        &release::release_steps(config),
    )?;

    // Execute with progress display
    let executor = Executor::new(&scm, &registry, cwd, config)?.dry_run(is_dry);
    let outcome = executor
        .run(&queue, |event| {
            if !global_json {
                handle_event(event, is_dry);
            }
        })
        .context("release failed")?;

    // Display final summary
    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!();
        if is_dry {
            println!(
                "{} Dry run complete — {} steps previewed",
                "✓".green(),
                outcome.steps.len(),
            );
        } else {
            match outcome.tag.as_deref() {
                Some(tag) => println!(
                    "{} Released {} — next development version is {}",
                    "✓".green().bold(),
                    tag.green().bold(),
                    outcome.final_version.bold(),
                ),
                None => println!(
                    "{} Release complete: {} → {}",
                    "✓".green().bold(),
                    outcome.initial_version.dimmed(),
                    outcome.final_version.bold(),
                ),
            }
        }
    }

    Ok(())
}

/// Build the task registry backing the readiness gate.
///
/// The task re-reads the descriptor on every run so a gate late in a custom
/// sequence still sees the current version and dependency set.
fn readiness_registry(config: &Config, cwd: &camino::Utf8Path) -> anyhow::Result<TaskRegistry> {
    let settings = DescriptorSettings::from_config(config)?;
    let root = cwd.to_path_buf();

    let mut registry = TaskRegistry::new();
    registry.register(RELEASE_READY_TASK, move || {
        let failure = |message: String| TaskError {
            task: RELEASE_READY_TASK.to_owned(),
            message,
        };

        let descriptor =
            Descriptor::open(&root, &settings).map_err(|e| failure(e.to_string()))?;
        let current = descriptor.version().map_err(|e| failure(e.to_string()))?;
        let dependencies = descriptor
            .dependency_revisions()
            .map_err(|e| failure(e.to_string()))?;

        let scm = GitCli::new(&root);
        let report = readiness::run_readiness(&scm, &dependencies, &current)
            .map_err(|e| failure(e.to_string()))?;
        Ok(report.ready)
    });

    Ok(registry)
}

/// Handle a release event for terminal progress display.
fn handle_event(event: ReleaseEvent, is_dry: bool) {
    match event {
        ReleaseEvent::StepStarted(step) => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                    .unwrap()
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
            spinner.set_message(format!("{step}..."));
            // For now we finish immediately since steps are synchronous.
            // The spinner shows briefly to indicate activity.
            spinner.finish_and_clear();
        }
        ReleaseEvent::StepCompleted(step, outcome) => match outcome {
            StepOutcome::Success { message } => {
                let prefix = if is_dry { "○" } else { "✓" };
                println!(
                    "  {} {} {}",
                    prefix.green(),
                    format!("{step}").bold(),
                    message.dimmed(),
                );
            }
            StepOutcome::Skipped { reason } => {
                println!(
                    "  {} {} {}",
                    "–".yellow(),
                    format!("{step}").bold(),
                    format!("skipped: {reason}").dimmed(),
                );
            }
        },
    }
}
