//! Descriptor files and the version declaration they carry.
//!
//! The descriptor is the first existing file from a fixed candidate order:
//! every file directly inside the project-local descriptor directory, then
//! the project's own build descriptor, then the parent directory's. No
//! merging across candidates — first match wins. The declared version is the
//! first capture of a configured declaration pattern; mutation rewrites every
//! line that matches a pattern and contains the old rendering, and writes the
//! file only when at least one line actually changed.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::version::Version;

/// Errors from descriptor operations.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Reading or writing a descriptor file failed.
    #[error("descriptor i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A configured version pattern is not a valid regular expression.
    #[error("invalid version pattern {pattern:?}: {source}")]
    Pattern {
        /// The offending pattern source.
        pattern: String,
        /// The regex compilation error.
        source: regex::Error,
    },

    /// No candidate descriptor file exists.
    #[error("no descriptor file found under {root}")]
    NotFound {
        /// The search root.
        root: Utf8PathBuf,
    },

    /// The descriptor has no line matching a version pattern.
    #[error("no version declaration found in {file}")]
    VersionNotFound {
        /// The descriptor that was searched.
        file: Utf8PathBuf,
    },
}

/// Result alias for descriptor operations.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Default project-local descriptor directory.
pub const DEFAULT_DIR: &str = "project";

/// Default build descriptor file name (own directory, then parent).
pub const DEFAULT_FILE: &str = "Cargo.toml";

/// Default declaration pattern. Matches both `version := "…"` and
/// `version = "…"` styles; capture group 1 is the value.
pub const DEFAULT_PATTERN: &str = r#"version\s*:?=\s*"([^"]*)""#;

/// Descriptor search settings with configuration defaults applied.
#[derive(Debug, Clone)]
pub struct DescriptorSettings {
    dir: String,
    file: String,
    patterns: Vec<Regex>,
}

impl DescriptorSettings {
    /// Resolve settings from loaded configuration, compiling the patterns.
    pub fn from_config(config: &Config) -> DescriptorResult<Self> {
        let section = config.descriptor.as_ref();
        let dir = section
            .and_then(|d| d.dir.clone())
            .unwrap_or_else(|| DEFAULT_DIR.to_owned());
        let file = section
            .and_then(|d| d.file.clone())
            .unwrap_or_else(|| DEFAULT_FILE.to_owned());
        let sources = section
            .and_then(|d| d.patterns.clone())
            .unwrap_or_else(|| vec![DEFAULT_PATTERN.to_owned()]);

        let patterns = sources
            .into_iter()
            .map(|pattern| {
                Regex::new(&pattern).map_err(|source| DescriptorError::Pattern { pattern, source })
            })
            .collect::<DescriptorResult<Vec<_>>>()?;

        Ok(Self { dir, file, patterns })
    }
}

/// A located descriptor file.
#[derive(Debug, Clone)]
pub struct Descriptor {
    path: Utf8PathBuf,
    patterns: Vec<Regex>,
}

impl Descriptor {
    /// Locate the first existing candidate file under `root`.
    #[instrument(skip(settings), fields(%root))]
    pub fn locate(root: &Utf8Path, settings: &DescriptorSettings) -> Option<Utf8PathBuf> {
        for candidate in candidates(root, settings) {
            if candidate.is_file() {
                debug!(%candidate, "descriptor located");
                return Some(candidate);
            }
        }
        debug!("no descriptor candidate exists");
        None
    }

    /// Open the first existing candidate under `root`.
    pub fn open(root: &Utf8Path, settings: &DescriptorSettings) -> DescriptorResult<Self> {
        Self::locate(root, settings).map_or_else(
            || {
                Err(DescriptorError::NotFound {
                    root: root.to_path_buf(),
                })
            },
            |path| {
                Ok(Self {
                    path,
                    patterns: settings.patterns.clone(),
                })
            },
        )
    }

    /// Path of the located file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The declared version: the capture of the first line matching any
    /// declaration pattern.
    pub fn version(&self) -> DescriptorResult<String> {
        let text = fs::read_to_string(&self.path)?;
        text.lines()
            .find_map(|line| self.capture(line))
            .ok_or_else(|| DescriptorError::VersionNotFound {
                file: self.path.clone(),
            })
    }

    /// Rewrite every declaration line containing `old`, replacing `old` with
    /// `new`. Returns whether anything changed (and the file was written).
    #[instrument(skip(self), fields(file = %self.path))]
    pub fn rewrite(&self, old: &str, new: &str) -> DescriptorResult<bool> {
        let text = fs::read_to_string(&self.path)?;
        let mut dirty = false;

        let lines: Vec<String> = text
            .lines()
            .map(|line| {
                if self.matches(line) && line.contains(old) {
                    let replaced = line.replace(old, new);
                    if replaced != line {
                        dirty = true;
                    }
                    replaced
                } else {
                    line.to_owned()
                }
            })
            .collect();

        if dirty {
            let mut content = lines.join("\n");
            if text.ends_with('\n') {
                content.push('\n');
            }
            fs::write(&self.path, content)?;
            info!(old, new, "descriptor rewritten");
        } else {
            debug!(old, "no line changed, descriptor left untouched");
        }
        Ok(dirty)
    }

    /// Declared dependency revisions.
    ///
    /// Deliberately textual: inside any `[…dependencies…]` section, the first
    /// quoted string of each `name = …` line counts as that dependency's
    /// revision.
    pub fn dependency_revisions(&self) -> DescriptorResult<Vec<Dependency>> {
        let text = fs::read_to_string(&self.path)?;
        let mut deps = Vec::new();
        let mut in_dependencies = false;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_dependencies = trimmed.contains("dependencies");
                continue;
            }
            if !in_dependencies {
                continue;
            }
            let Some((name, rest)) = trimmed.split_once('=') else {
                continue;
            };
            if let Some(revision) = first_quoted(rest) {
                deps.push(Dependency {
                    name: name.trim().to_owned(),
                    revision,
                });
            }
        }

        debug!(count = deps.len(), "scanned dependency revisions");
        Ok(deps)
    }

    fn capture(&self, line: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(line)
                .and_then(|captures| captures.get(1))
                .map(|value| value.as_str().to_owned())
        })
    }

    fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }
}

/// A declared dependency and its revision string, exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Declared name.
    pub name: String,
    /// Revision string.
    pub revision: String,
}

/// Outcome of a version-mutation step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum MutationOutcome {
    /// The transition produced a new version.
    Applied {
        /// Rendered version before the transition.
        previous: String,
        /// Rendered version after the transition.
        next: String,
        /// The descriptor that was targeted.
        file: Utf8PathBuf,
        /// Whether any line changed (and the file was written).
        changed: bool,
    },
    /// The transition is undefined for the current version; nothing written.
    Unsupported {
        /// Rendered current version.
        current: String,
    },
}

/// Apply `transition` to the descriptor's declared version.
///
/// Parses the declared version, applies the transition, and rewrites the
/// declaration lines. A transition that yields nothing (a numeric bump on an
/// opaque version) is a warning-level no-op: the descriptor stays untouched
/// and the call still succeeds.
#[instrument(skip_all, fields(file = %descriptor.path()))]
pub fn apply_transition<F>(
    descriptor: &Descriptor,
    transition: F,
) -> DescriptorResult<MutationOutcome>
where
    F: FnOnce(&Version) -> Option<Version>,
{
    let declared = descriptor.version()?;
    let current = Version::parse(&declared);

    let Some(next) = transition(&current) else {
        warn!(version = %current, "transition undefined for this version, skipping");
        return Ok(MutationOutcome::Unsupported {
            current: current.to_string(),
        });
    };

    let previous = current.to_string();
    let next = next.to_string();
    let changed = descriptor.rewrite(&previous, &next)?;
    info!(%previous, %next, changed, "version transition applied");

    Ok(MutationOutcome::Applied {
        previous,
        next,
        file: descriptor.path().to_path_buf(),
        changed,
    })
}

/// Candidate paths in search order.
fn candidates(root: &Utf8Path, settings: &DescriptorSettings) -> Vec<Utf8PathBuf> {
    let mut list = local_descriptor_files(&root.join(&settings.dir));
    list.push(root.join(&settings.file));
    list.push(root.join("..").join(&settings.file));
    list
}

/// Regular files directly inside `dir`, in name order.
fn local_descriptor_files(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let Ok(entries) = dir.read_dir_utf8() else {
        return Vec::new();
    };
    let mut files: Vec<Utf8PathBuf> = entries
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

/// First double-quoted literal in `text`.
fn first_quoted(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let end = text[start..].find('"')? + start;
    Some(text[start..end].to_owned())
}
