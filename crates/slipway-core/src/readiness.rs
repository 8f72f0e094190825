//! Readiness checks for one-shot releases.
//!
//! Validates that the working tree is committed, no dependency rides a
//! snapshot revision, and the stable version has not already been tagged.
//! Returns structured results that the CLI formats.
//!
//! Checks run in that order and stop at the first failure, so the report
//! holds every check up to and including the one that failed.

use serde::Serialize;
use tracing::{error, info, instrument};

use crate::descriptor::Dependency;
use crate::scm::{Scm, ScmResult};
use crate::version::{SNAPSHOT, Version};

/// A single readiness check result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Human-readable name of the check.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Description of the result (reason for failure, or confirmation).
    pub message: String,
}

/// Full readiness report.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    /// Individual check results, in execution order.
    pub checks: Vec<CheckResult>,
    /// Whether every check passed.
    pub ready: bool,
}

impl ReadinessReport {
    fn blocked(checks: Vec<CheckResult>) -> Self {
        Self {
            checks,
            ready: false,
        }
    }
}

/// Run the readiness checks.
///
/// `current` is the declared project version; its stable rendering is what
/// the tag check looks for. The tag check is textual containment over the
/// raw tag listing, so an unrelated tag mentioning the same digits (say
/// `v1.2.30` against `1.2.3`) also blocks. Probing the repository itself can
/// fail; that error propagates instead of counting as a failed check.
///
/// # Arguments
/// * `scm` — source-control handle for the project
/// * `dependencies` — declared dependency revisions from the descriptor
/// * `current` — the declared project version
#[instrument(skip(scm, dependencies))]
pub fn run_readiness(
    scm: &dyn Scm,
    dependencies: &[Dependency],
    current: &str,
) -> ScmResult<ReadinessReport> {
    let mut checks = Vec::new();

    // Check 1: Working tree clean
    let clean = scm.is_clean()?;
    checks.push(check_clean_tree(clean));
    if !clean {
        error!("working tree has uncommitted changes");
        return Ok(ReadinessReport::blocked(checks));
    }

    // Check 2: No snapshot dependencies
    let snapshot = dependencies
        .iter()
        .find(|dep| dep.revision.contains(SNAPSHOT));
    checks.push(check_dependencies(dependencies.len(), snapshot));
    if let Some(dep) = snapshot {
        error!(
            dependency = %dep.name,
            revision = %dep.revision,
            "snapshot dependency blocks the release"
        );
        return Ok(ReadinessReport::blocked(checks));
    }

    // Check 3: Stable version not already tagged
    let stable = Version::parse(current).to_stable().to_string();
    let taken = scm.tags()?.contains(stable.as_str());
    checks.push(check_tags(&stable, taken));
    if taken {
        error!(version = %stable, "tag listing already mentions the stable version");
        return Ok(ReadinessReport::blocked(checks));
    }

    info!(check_count = checks.len(), "ready for release");
    Ok(ReadinessReport {
        checks,
        ready: true,
    })
}

fn check_clean_tree(clean: bool) -> CheckResult {
    CheckResult {
        name: "Working tree".into(),
        passed: clean,
        message: if clean {
            "Clean working tree".into()
        } else {
            "Uncommitted changes in working tree".into()
        },
    }
}

fn check_dependencies(count: usize, snapshot: Option<&Dependency>) -> CheckResult {
    snapshot.map_or_else(
        || CheckResult {
            name: "Dependencies".into(),
            passed: true,
            message: format!("No snapshot revisions ({count} dependencies checked)"),
        },
        |dep| CheckResult {
            name: "Dependencies".into(),
            passed: false,
            message: format!("{} resolves to snapshot revision {}", dep.name, dep.revision),
        },
    )
}

fn check_tags(stable: &str, taken: bool) -> CheckResult {
    CheckResult {
        name: "Tags".into(),
        passed: !taken,
        message: if taken {
            format!("An existing tag mentions {stable}")
        } else {
            format!("No tag mentions {stable}")
        },
    }
}
