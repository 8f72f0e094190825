//! The version value model.
//!
//! A declared version is either `major.minor.patch` with an optional trailing
//! label (`2.1.4`, `2.1.4.rc1`) or an opaque string, and both forms may carry
//! the `-SNAPSHOT` development marker. Parsing never fails: anything outside
//! the semantic grammar degrades to the opaque form instead of erroring.
//! Values are immutable; every transition returns a new value.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// The development-build marker, matched case-sensitively at the end of a
/// version string.
pub const SNAPSHOT: &str = "SNAPSHOT";

const DASH_SNAPSHOT: &str = "-SNAPSHOT";

/// Semver-style bump level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Patch release (x.y.Z).
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A project version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// Three dotted integers plus an optional label.
    Semantic {
        /// Major component.
        major: u64,
        /// Minor component.
        minor: u64,
        /// Patch component.
        patch: u64,
        /// Optional label appended after the patch (`2.1.4.rc1`).
        label: Option<String>,
        /// Whether the snapshot marker is set.
        snapshot: bool,
    },
    /// Anything the semantic grammar does not cover, kept verbatim.
    Raw {
        /// The version text, excluding any snapshot marker.
        text: String,
        /// Whether the snapshot marker is set.
        snapshot: bool,
    },
}

impl Version {
    /// Parse a version string. Never fails.
    ///
    /// A trailing `-SNAPSHOT` or `SNAPSHOT` marker (case-sensitive) is
    /// stripped and remembered. The remainder is semantic when it is exactly
    /// three numeric dot-separated components, or four components where the
    /// first three are numeric and the fourth is a non-empty label. Everything
    /// else (wrong count, non-numeric component, numeric overflow) becomes
    /// [`Version::Raw`].
    pub fn parse(text: &str) -> Self {
        let (base, snapshot) = strip_snapshot(text);

        semantic_parts(base).map_or_else(
            || Self::Raw {
                text: base.to_owned(),
                snapshot,
            },
            |(major, minor, patch, label)| Self::Semantic {
                major,
                minor,
                patch,
                label,
                snapshot,
            },
        )
    }

    /// Whether this value carries the snapshot marker.
    pub const fn is_snapshot(&self) -> bool {
        match self {
            Self::Semantic { snapshot, .. } | Self::Raw { snapshot, .. } => *snapshot,
        }
    }

    /// Apply a numeric bump.
    ///
    /// Defined only for the semantic variant; the label and snapshot marker
    /// are preserved. Returns `None` for [`Version::Raw`] — the operation is
    /// undefined for opaque versions.
    pub fn bump(&self, level: BumpLevel) -> Option<Self> {
        match self {
            Self::Semantic {
                major,
                minor,
                patch,
                label,
                snapshot,
            } => {
                let (major, minor, patch) = match level {
                    BumpLevel::Patch => (*major, *minor, *patch + 1),
                    BumpLevel::Minor => (*major, *minor + 1, 0),
                    BumpLevel::Major => (*major + 1, 0, 0),
                };
                Some(Self::Semantic {
                    major,
                    minor,
                    patch,
                    label: label.clone(),
                    snapshot: *snapshot,
                })
            }
            Self::Raw { .. } => None,
        }
    }

    /// Set the snapshot marker. Total over both variants.
    pub fn to_snapshot(&self) -> Self {
        self.with_snapshot(true)
    }

    /// Clear the snapshot marker. Total over both variants.
    pub fn to_stable(&self) -> Self {
        self.with_snapshot(false)
    }

    fn with_snapshot(&self, value: bool) -> Self {
        let mut next = self.clone();
        match &mut next {
            Self::Semantic { snapshot, .. } | Self::Raw { snapshot, .. } => *snapshot = value,
        }
        next
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic {
                major,
                minor,
                patch,
                label,
                snapshot,
            } => {
                write!(f, "{major}.{minor}.{patch}")?;
                if let Some(label) = label {
                    write!(f, ".{label}")?;
                }
                if *snapshot {
                    f.write_str(DASH_SNAPSHOT)?;
                }
                Ok(())
            }
            Self::Raw { text, snapshot } => {
                f.write_str(text)?;
                if *snapshot {
                    f.write_str(DASH_SNAPSHOT)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Version {
    /// Serialize as the rendered string.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// True iff `text` ends with the literal `SNAPSHOT` marker, with or without
/// a preceding `-`. Case-sensitive.
pub fn is_snapshot(text: &str) -> bool {
    text.ends_with(SNAPSHOT)
}

/// Split off a trailing snapshot marker, preferring the dashed form.
fn strip_snapshot(text: &str) -> (&str, bool) {
    text.strip_suffix(DASH_SNAPSHOT)
        .or_else(|| text.strip_suffix(SNAPSHOT))
        .map_or((text, false), |base| (base, true))
}

/// Interpret `base` as `major.minor.patch[.label]`.
fn semantic_parts(base: &str) -> Option<(u64, u64, u64, Option<String>)> {
    let mut parts = base.split('.');
    let major = numeric(parts.next()?)?;
    let minor = numeric(parts.next()?)?;
    let patch = numeric(parts.next()?)?;
    let label = match parts.next() {
        Some(label) if !label.is_empty() => Some(label.to_owned()),
        Some(_) => return None,
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch, label))
}

/// Strict non-negative integer parse: digits only, no sign, no whitespace.
fn numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
