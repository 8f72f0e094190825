//! Source-control collaborators for the release workflow.
//!
//! The workflow consumes source control through the [`Scm`] trait and never
//! interprets repository state beyond the text the trait hands back: tree
//! cleanliness is a single flag, and the tag listing is raw text checked by
//! containment rather than parsed structurally. The production implementation
//! shells out to `git`, inheriting the user's SSH keys, GPG signing, hooks,
//! and other configuration.

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from source-control operations.
#[derive(Error, Debug)]
pub enum ScmError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "status").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for source-control operations.
pub type ScmResult<T> = Result<T, ScmError>;

/// The source-control surface the release workflow depends on.
pub trait Scm {
    /// Whether the working tree has no staged or unstaged changes.
    fn is_clean(&self) -> ScmResult<bool>;

    /// The raw tag listing, one tag name per line.
    ///
    /// Callers check this text by substring containment; implementations
    /// must not reformat or deduplicate it.
    fn tags(&self) -> ScmResult<String>;

    /// Commit all pending tracked changes.
    fn commit(&self, message: &str) -> ScmResult<()>;

    /// Create an annotated tag named `name`.
    fn tag(&self, name: &str) -> ScmResult<()>;
}

/// [`Scm`] implementation that shells out to the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: Utf8PathBuf,
}

impl GitCli {
    /// Create a git adapter that runs every command in `root`.
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Check if `root` is inside a git repository.
    pub fn is_inside_repo(&self) -> ScmResult<bool> {
        match self.git(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => Ok(output.trim() == "true"),
            Err(ScmError::NotARepo) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Run a git command in the adapter's root and return its stdout.
    fn git(&self, args: &[&str]) -> ScmResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.root.as_std_path())
            .output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            // Detect "not a git repo" specifically
            if stderr.contains("not a git repository") {
                return Err(ScmError::NotARepo);
            }

            Err(ScmError::Command {
                command: args.first().unwrap_or(&"").to_string(),
                stderr,
            })
        }
    }
}

impl Scm for GitCli {
    #[instrument(skip(self))]
    fn is_clean(&self) -> ScmResult<bool> {
        let output = self.git(&["status", "--porcelain"])?;
        let clean = output.trim().is_empty();
        debug!(clean, "working tree status");
        Ok(clean)
    }

    #[instrument(skip(self))]
    fn tags(&self) -> ScmResult<String> {
        let listing = self.git(&["tag", "--list"])?;
        debug!(count = listing.lines().count(), "listed tags");
        Ok(listing)
    }

    #[instrument(skip(self))]
    fn commit(&self, message: &str) -> ScmResult<()> {
        self.git(&["commit", "--all", "--message", message])?;
        debug!(message, "created commit");
        Ok(())
    }

    #[instrument(skip(self))]
    fn tag(&self, name: &str) -> ScmResult<()> {
        self.git(&["tag", "--annotate", name, "--message", name])?;
        debug!(name, "created tag");
        Ok(())
    }
}

/// Whether the `git` binary is available on the PATH.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(path: &std::path::Path) -> &Utf8Path {
        Utf8Path::from_path(path).expect("temp paths are UTF-8")
    }

    #[test]
    fn missing_repo_is_detected() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let scm = GitCli::new(utf8(tmp.path()));
        assert!(matches!(scm.is_clean(), Err(ScmError::NotARepo)));
        assert!(!scm.is_inside_repo().unwrap());
    }

    #[test]
    fn fresh_repo_is_clean_and_tagless() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(tmp.path())
            .status()
            .unwrap();
        assert!(status.success());

        let scm = GitCli::new(utf8(tmp.path()));
        assert!(scm.is_inside_repo().unwrap());
        assert!(scm.is_clean().unwrap());
        assert_eq!(scm.tags().unwrap().trim(), "");
    }

    #[test]
    fn bad_subcommand_surfaces_stderr() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let scm = GitCli::new(utf8(tmp.path()));
        let err = scm.git(&["not-a-real-subcommand"]).unwrap_err();
        assert!(matches!(err, ScmError::Command { .. }));
    }

    #[test]
    fn mock_records_mutations() {
        let scm = mock::MockScm::clean().with_tags("v0.1.0\nv0.2.0\n");
        assert!(scm.is_clean().unwrap());
        assert!(scm.tags().unwrap().contains("v0.2.0"));

        scm.commit("set version to 1.0.0").unwrap();
        scm.tag("v1.0.0").unwrap();
        assert_eq!(scm.commits.borrow().as_slice(), ["set version to 1.0.0"]);
        assert_eq!(scm.tagged.borrow().as_slice(), ["v1.0.0"]);
    }
}
