//! Release sequencing and execution.
//!
//! `slipway release` does not run anything directly: it resolves a fixed
//! step sequence in front of a pending queue, gated on the readiness task,
//! and an executor then walks the queue in order. Steps are small and
//! atomic; every version change goes through the shared descriptor
//! transition, and source control goes through the [`Scm`] trait.
//!
//! # Two-phase workflow
//!
//! 1. **Queue** ([`queue_release`]) — run the readiness task and prepend the
//!    step sequence. Failure leaves the original queue untouched.
//! 2. **Execute** ([`Executor::run`]) — walk the queue with event callbacks
//!    for progress display.

use std::collections::HashMap;
use std::fmt;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::descriptor::{self, Descriptor, DescriptorError, DescriptorSettings, MutationOutcome};
use crate::scm::{Scm, ScmError};
use crate::version::{BumpLevel, Version};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from the release workflow.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The readiness task is missing, failed, or answered no.
    #[error("release blocked: {reason}")]
    NotReady {
        /// Why the release cannot start.
        reason: String,
    },

    /// A step failed during execution.
    #[error("{step} step failed: {message}")]
    StepFailed {
        /// Which step failed.
        step: Step,
        /// Error details.
        message: String,
    },

    /// Descriptor error.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Source control error.
    #[error(transparent)]
    Scm(#[from] ScmError),
}

/// Result alias for release operations.
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// A registered task failed while running.
#[derive(Error, Debug)]
#[error("task {task} failed: {message}")]
pub struct TaskError {
    /// Registered task name.
    pub task: String,
    /// Failure details.
    pub message: String,
}

// ──────────────────────────────────────────────
// Steps and queue
// ──────────────────────────────────────────────

/// Steps of the release sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Re-run the readiness task; a negative answer aborts the queue.
    ReleaseReady,
    /// Strip the snapshot marker from the descriptor version.
    VersionToStable,
    /// Publish to the local repository.
    PublishLocal,
    /// Publish to the remote repository.
    Publish,
    /// Commit the working tree with the version commit message.
    GitCommit,
    /// Tag the stable version.
    GitTag,
    /// Bump the patch component of the descriptor version.
    VersionBumpPatch,
    /// Append the snapshot marker for the next development cycle.
    VersionToSnapshot,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReleaseReady => write!(f, "release-ready"),
            Self::VersionToStable => write!(f, "version-to-stable"),
            Self::PublishLocal => write!(f, "publish-local"),
            Self::Publish => write!(f, "publish"),
            Self::GitCommit => write!(f, "git-commit"),
            Self::GitTag => write!(f, "git-tag"),
            Self::VersionBumpPatch => write!(f, "version-bump-patch"),
            Self::VersionToSnapshot => write!(f, "version-to-snapshot"),
        }
    }
}

/// The release sequence, in order.
///
/// `GitCommit` appears twice: once for the stable version, once for the next
/// development version.
pub const RELEASE_STEPS: [Step; 9] = [
    Step::ReleaseReady,
    Step::VersionToStable,
    Step::PublishLocal,
    Step::Publish,
    Step::GitCommit,
    Step::GitTag,
    Step::VersionBumpPatch,
    Step::VersionToSnapshot,
    Step::GitCommit,
];

/// A pending queue of steps.
///
/// Queues never mutate in place: [`StepQueue::prepended`] returns a new
/// queue and leaves the original untouched, so a failed resolution cannot
/// leave half a sequence behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepQueue {
    steps: Vec<Step>,
}

impl StepQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// A new queue with `front` placed before this queue's steps.
    pub fn prepended(&self, front: &[Step]) -> Self {
        let mut steps = Vec::with_capacity(front.len() + self.steps.len());
        steps.extend_from_slice(front);
        steps.extend_from_slice(&self.steps);
        Self { steps }
    }

    /// The queued steps, front first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of queued steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the queue holds no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ──────────────────────────────────────────────
// Task registry
// ──────────────────────────────────────────────

/// Name of the readiness task the release sequence requires.
pub const RELEASE_READY_TASK: &str = "release-ready";

type TaskFn = Box<dyn Fn() -> Result<bool, TaskError>>;

/// Named boolean tasks the release sequence calls back into.
///
/// The release command registers the readiness check here instead of calling
/// it directly, so embedders can swap in their own gate.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, TaskFn>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: &str, task: F)
    where
        F: Fn() -> Result<bool, TaskError> + 'static,
    {
        self.tasks.insert(name.to_owned(), Box::new(task));
    }

    /// Run the task registered under `name`.
    ///
    /// `None` when nothing is registered under that name.
    pub fn run(&self, name: &str) -> Option<Result<bool, TaskError>> {
        self.tasks.get(name).map(|task| task())
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ──────────────────────────────────────────────
// Queueing
// ──────────────────────────────────────────────

/// Run the readiness task and require a positive answer.
///
/// A missing registration, a task error, and a `false` answer are all
/// blocking; each is logged before the error returns.
fn require_ready(registry: &TaskRegistry) -> ReleaseResult<()> {
    match registry.run(RELEASE_READY_TASK) {
        None => {
            error!(task = RELEASE_READY_TASK, "readiness task is not registered");
            Err(ReleaseError::NotReady {
                reason: format!("no task registered as {RELEASE_READY_TASK}"),
            })
        }
        Some(Err(err)) => {
            error!(task = RELEASE_READY_TASK, %err, "readiness task failed");
            Err(ReleaseError::NotReady {
                reason: err.to_string(),
            })
        }
        Some(Ok(false)) => {
            error!(task = RELEASE_READY_TASK, "project is not ready for release");
            Err(ReleaseError::NotReady {
                reason: "readiness checks failed".into(),
            })
        }
        Some(Ok(true)) => Ok(()),
    }
}

/// Resolve the release sequence in front of `queue`.
///
/// The readiness task must answer `true` first; otherwise the error
/// propagates and the original queue is unchanged, with nothing prepended.
#[instrument(skip_all, fields(steps = steps.len(), pending = queue.len()))]
pub fn queue_release(
    registry: &TaskRegistry,
    queue: &StepQueue,
    steps: &[Step],
) -> ReleaseResult<StepQueue> {
    require_ready(registry)?;
    info!(count = steps.len(), "release sequence queued");
    Ok(queue.prepended(steps))
}

/// The step sequence a release queues: the configured override, or
/// [`RELEASE_STEPS`].
pub fn release_steps(config: &Config) -> Vec<Step> {
    config
        .release
        .as_ref()
        .and_then(|release| release.steps.clone())
        .unwrap_or_else(|| RELEASE_STEPS.to_vec())
}

// ──────────────────────────────────────────────
// Events and outcomes
// ──────────────────────────────────────────────

/// Events emitted while the executor walks the queue.
#[derive(Debug, Clone)]
pub enum ReleaseEvent {
    /// A step has started.
    StepStarted(Step),
    /// A step has completed.
    StepCompleted(Step, StepOutcome),
}

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StepOutcome {
    /// Step completed successfully.
    Success {
        /// Description of what happened.
        message: String,
    },
    /// Step had nothing to do.
    Skipped {
        /// Why the step was skipped.
        reason: String,
    },
}

/// Outcome of a full queue run.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    /// Rendered version before the first step ran.
    pub initial_version: String,
    /// Rendered version once the queue drained.
    pub final_version: String,
    /// The tag that was created, when the queue tagged.
    pub tag: Option<String>,
    /// Results of each step, in execution order.
    pub steps: Vec<(Step, StepOutcome)>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

// ──────────────────────────────────────────────
// Execute
// ──────────────────────────────────────────────

/// Default command for publishing to the local repository.
pub const DEFAULT_PUBLISH_LOCAL: &str = "cargo package";

/// Default command for publishing to the remote repository.
pub const DEFAULT_PUBLISH: &str = "cargo publish";

/// Default commit message template for the version commits.
pub const DEFAULT_COMMIT_MESSAGE: &str = "set version to {version}";

/// Default tag prefix.
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// Walks a step queue against one project root.
///
/// The executor owns nothing but configuration: source control and the
/// readiness gate come in by reference so callers keep them inspectable.
pub struct Executor<'a> {
    scm: &'a dyn Scm,
    registry: &'a TaskRegistry,
    root: Utf8PathBuf,
    settings: DescriptorSettings,
    publish_local: String,
    publish: String,
    commit_message: String,
    tag_prefix: String,
    dry_run: bool,
}

impl<'a> Executor<'a> {
    /// Build an executor from loaded configuration.
    pub fn new<P: AsRef<Utf8Path>>(
        scm: &'a dyn Scm,
        registry: &'a TaskRegistry,
        root: P,
        config: &Config,
    ) -> ReleaseResult<Self> {
        let settings = DescriptorSettings::from_config(config)?;
        let commands = config.commands.as_ref();
        let release = config.release.as_ref();

        Ok(Self {
            scm,
            registry,
            root: root.as_ref().to_path_buf(),
            settings,
            publish_local: commands
                .and_then(|c| c.publish_local.clone())
                .unwrap_or_else(|| DEFAULT_PUBLISH_LOCAL.to_owned()),
            publish: commands
                .and_then(|c| c.publish.clone())
                .unwrap_or_else(|| DEFAULT_PUBLISH.to_owned()),
            commit_message: release
                .and_then(|r| r.commit_message.clone())
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_owned()),
            tag_prefix: release
                .and_then(|r| r.tag_prefix.clone())
                .unwrap_or_else(|| DEFAULT_TAG_PREFIX.to_owned()),
            dry_run: false,
        })
    }

    /// Preview mode: report what each step would do without doing it.
    ///
    /// The readiness step still runs for real; it is read-only.
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute every queued step in order, stopping at the first failure.
    ///
    /// Calls `on_event` at step boundaries so the CLI can update progress
    /// display (spinners, progress bars, etc.).
    #[instrument(skip(self, queue, on_event), fields(steps = queue.len(), dry_run = self.dry_run))]
    pub fn run(
        &self,
        queue: &StepQueue,
        mut on_event: impl FnMut(ReleaseEvent),
    ) -> ReleaseResult<ReleaseOutcome> {
        let mut steps = Vec::new();
        let mut tag = None;

        let initial_version = self.open_descriptor()?.version()?;
        let mut version = Version::parse(&initial_version);

        for &step in queue.steps() {
            on_event(ReleaseEvent::StepStarted(step));
            let outcome = self.run_step(step, &mut version, &mut tag)?;
            on_event(ReleaseEvent::StepCompleted(step, outcome.clone()));
            steps.push((step, outcome));
        }

        let outcome = ReleaseOutcome {
            initial_version,
            final_version: version.to_string(),
            tag,
            steps,
            dry_run: self.dry_run,
        };

        info!(
            from = %outcome.initial_version,
            to = %outcome.final_version,
            dry_run = outcome.dry_run,
            "queue drained"
        );
        Ok(outcome)
    }

    fn run_step(
        &self,
        step: Step,
        version: &mut Version,
        tag: &mut Option<String>,
    ) -> ReleaseResult<StepOutcome> {
        debug!(%step, "running step");
        match step {
            Step::ReleaseReady => self.run_release_ready(),
            Step::VersionToStable => self.mutate(version, |v| Some(v.to_stable())),
            Step::PublishLocal => self.run_command(step, &self.publish_local, "Published locally"),
            Step::Publish => self.run_command(step, &self.publish, "Published"),
            Step::GitCommit => self.commit(version),
            Step::GitTag => self.create_tag(version, tag),
            Step::VersionBumpPatch => self.mutate(version, |v| v.bump(BumpLevel::Patch)),
            Step::VersionToSnapshot => self.mutate(version, |v| Some(v.to_snapshot())),
        }
    }

    fn run_release_ready(&self) -> ReleaseResult<StepOutcome> {
        require_ready(self.registry)?;
        Ok(StepOutcome::Success {
            message: "Readiness checks passed".into(),
        })
    }

    /// Shared mutation step: apply a transition to the descriptor version,
    /// then re-read the declared version so later steps see the new state.
    fn mutate<F>(&self, version: &mut Version, transition: F) -> ReleaseResult<StepOutcome>
    where
        F: FnOnce(&Version) -> Option<Version>,
    {
        if self.dry_run {
            return Ok(match transition(version) {
                Some(next) => {
                    let message = format!("Would set version to {next}");
                    *version = next;
                    StepOutcome::Success { message }
                }
                None => StepOutcome::Skipped {
                    reason: format!("no transition defined for {version}"),
                },
            });
        }

        let descriptor = self.open_descriptor()?;
        match descriptor::apply_transition(&descriptor, transition)? {
            MutationOutcome::Applied {
                previous,
                next,
                file,
                changed,
            } => {
                *version = Version::parse(&descriptor.version()?);
                Ok(StepOutcome::Success {
                    message: if changed {
                        format!("{previous} → {next} ({file})")
                    } else {
                        format!("{previous} → {next} (nothing to rewrite)")
                    },
                })
            }
            MutationOutcome::Unsupported { current } => Ok(StepOutcome::Skipped {
                reason: format!("no transition defined for {current}"),
            }),
        }
    }

    /// Run a configured shell command in the project root.
    fn run_command(&self, step: Step, command: &str, success: &str) -> ReleaseResult<StepOutcome> {
        if self.dry_run {
            return Ok(StepOutcome::Success {
                message: format!("Would run: {command}"),
            });
        }

        debug!(%command, "running step command");
        let output = Command::new("sh")
            .args(["-c", command])
            .current_dir(self.root.as_std_path())
            .output()
            .map_err(|e| ReleaseError::StepFailed {
                step,
                message: format!("failed to execute `{command}`: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ReleaseError::StepFailed {
                step,
                message: format!("`{command}` failed: {stderr}"),
            });
        }

        Ok(StepOutcome::Success {
            message: format!("{success} ({command})"),
        })
    }

    fn commit(&self, version: &Version) -> ReleaseResult<StepOutcome> {
        let message = self
            .commit_message
            .replace("{version}", &version.to_string());

        if self.dry_run {
            return Ok(StepOutcome::Success {
                message: format!("Would commit: {message}"),
            });
        }

        self.scm.commit(&message)?;
        Ok(StepOutcome::Success {
            message: format!("Committed: {message}"),
        })
    }

    fn create_tag(
        &self,
        version: &Version,
        tag: &mut Option<String>,
    ) -> ReleaseResult<StepOutcome> {
        let name = format!("{}{}", self.tag_prefix, version.to_stable());

        if self.dry_run {
            *tag = Some(name.clone());
            return Ok(StepOutcome::Success {
                message: format!("Would tag {name}"),
            });
        }

        self.scm.tag(&name)?;
        *tag = Some(name.clone());
        Ok(StepOutcome::Success {
            message: format!("Tagged {name}"),
        })
    }

    fn open_descriptor(&self) -> ReleaseResult<Descriptor> {
        Ok(Descriptor::open(&self.root, &self.settings)?)
    }
}
