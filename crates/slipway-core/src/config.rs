//! Configuration schema, discovery, and merging.
//!
//! Configuration comes from three places, merged lowest precedence first:
//! built-in defaults, the user config in the XDG config directory, the
//! nearest project config (walking up from the working directory), and any
//! explicitly named files. TOML, YAML, and JSON are all accepted.
//!
//! Discovery looks for `.slipway.<ext>` before `slipway.<ext>` in each
//! directory on the way up, and for `config.<ext>` under
//! `~/.config/slipway/`, with `<ext>` tried in the order `toml`, `yaml`,
//! `yml`, `json`. The walk stops before entering a directory that contains
//! the boundary marker (`.git` by default), so an enclosing repository's
//! config never leaks into the project being worked on.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use slipway_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir().unwrap())
//!     .expect("working directory is not UTF-8");
//! let config = ConfigLoader::new().with_project_search(&cwd).load().unwrap();
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{ConfigError, ConfigResult};
use crate::release::Step;

/// The configuration for slipway.
///
/// Every field is optional in the files themselves — built-in defaults fill
/// the gaps, and each merged source only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Minimum level written to the log file ("debug" through "error").
    pub log_level: LogLevel,
    /// Where JSONL log files land. Platform defaults apply when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Where the project declares its version, and how to recognize it.
    pub descriptor: Option<DescriptorConfig>,
    /// Command overrides for the publish steps.
    pub commands: Option<CommandsConfig>,
    /// Release queue settings.
    pub release: Option<ReleaseConfig>,
}

/// Descriptor discovery and version-declaration overrides.
///
/// The descriptor is the file that declares the project version. By default
/// slipway scans the `project/` directory, then `Cargo.toml`, then the parent
/// directory's `Cargo.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DescriptorConfig {
    /// Override the project-local descriptor directory (default: `project`).
    pub dir: Option<String>,
    /// Override the build descriptor file name (default: `Cargo.toml`).
    pub file: Option<String>,
    /// Override the version-declaration patterns.
    ///
    /// Each entry is a regular expression whose first capture group is the
    /// version value. The default matches `version := "…"` and
    /// `version = "…"`.
    pub patterns: Option<Vec<String>>,
}

/// Command overrides for the publish steps of the release sequence.
///
/// Each step ships with a cargo default. Use this section to override
/// either command; they run through `sh -c` in the project root.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommandsConfig {
    /// Override the local publish command (default: `cargo package`).
    pub publish_local: Option<String>,
    /// Override the publish command (default: `cargo publish`).
    pub publish: Option<String>,
}

/// Settings for the release queue.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Override the step sequence queued by `slipway release`.
    ///
    /// Steps are named in kebab-case (e.g., `"version-to-stable"`). When
    /// unset, the built-in nine-step sequence is used.
    pub steps: Option<Vec<Step>>,
    /// Prefix for release tags (default: `v`).
    pub tag_prefix: Option<String>,
    /// Commit message template for the version commits (default:
    /// `set version to {version}`).
    ///
    /// `{version}` interpolates the descriptor version at the time the
    /// commit runs, so the stable and next-development commits differ.
    pub commit_message: Option<String>,
    /// Ask before the queue runs (default: true).
    ///
    /// When `None` or `Some(true)`, `slipway release` asks for confirmation
    /// before the queue executes. Set to `false` for CI/scripted use. The
    /// `--yes`/`-y` CLI flag overrides this at runtime.
    pub confirm: Option<bool>,
}

/// Severity floor for the log file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including development diagnostics.
    Debug,
    /// Normal operation (the default).
    #[default]
    Info,
    /// Conditions worth a second look.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// The lowercase name, as `tracing` filter syntax expects it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions, in order of preference.
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Name used in config file stems and XDG directory paths.
const APP_NAME: &str = "slipway";

/// Builder that assembles the configuration sources and merges them.
#[derive(Debug)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// A loader with user config enabled and the `.git` boundary marker.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_owned()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for a project config file.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include or skip the user config from the XDG config directory.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the project walk before any directory containing `marker`.
    ///
    /// The starting directory itself is exempt, so a repository root still
    /// sees its own config.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Walk all the way to the filesystem root, ignoring markers.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Merge an explicit file after everything discovered.
    ///
    /// Files queue in call order; the last one added has the final say.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source over the defaults and extract the configuration.
    ///
    /// Precedence, lowest first: defaults, user config, project config,
    /// explicit files in the order added.
    #[instrument(name = "load_config", skip_all, fields(explicit = self.explicit_files.len()))]
    pub fn load(self) -> ConfigResult<Config> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        for source in self.sources() {
            debug!(%source, "merging config file");
            figment = merge_file(figment, &source);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        info!(
            log_level = config.log_level.as_str(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Like [`ConfigLoader::load`], but an error when no file contributes.
    pub fn load_or_error(self) -> ConfigResult<Config> {
        if self.sources().is_empty() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    /// Every config file this loader would merge, lowest precedence first.
    fn sources(&self) -> Vec<Utf8PathBuf> {
        let mut sources = Vec::new();
        if self.include_user_config {
            sources.extend(self.user_config());
        }
        if let Some(root) = &self.project_search_root {
            sources.extend(self.project_config(root));
        }
        sources.extend(self.explicit_files.iter().cloned());
        sources
    }

    /// The nearest project config at or above `start`.
    fn project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        for dir in start.ancestors() {
            if dir != start && self.hits_boundary(dir) {
                // The enclosing repository's config is out of bounds.
                return None;
            }
            if let Some(found) = config_in(dir) {
                return Some(found);
            }
        }
        None
    }

    fn hits_boundary(&self, dir: &Utf8Path) -> bool {
        self.boundary_marker
            .as_ref()
            .is_some_and(|marker| dir.join(marker).exists())
    }

    /// `config.<ext>` under the XDG config directory, if present.
    fn user_config(&self) -> Option<Utf8PathBuf> {
        let dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge one file into `figment`, picking the provider by extension.
///
/// Unknown extensions fall back to TOML rather than erroring, so a typo in a
/// `--config` argument surfaces as a parse error instead of silence.
fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

/// The first config file directly inside `dir`.
///
/// Extension preference outranks the dotfile/plain distinction:
/// `.slipway.toml`, `slipway.toml`, `.slipway.yaml`, `slipway.yaml`, …
fn config_in(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    CONFIG_EXTENSIONS.iter().find_map(|ext| {
        [format!(".{APP_NAME}.{ext}"), format!("{APP_NAME}.{ext}")]
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

/// Locate the nearest project config file without parsing it.
///
/// `info` and `doctor` report this path; the boundary marker is ignored so
/// they show whatever a walk to the filesystem root would find.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new()
        .without_boundary_marker()
        .project_config(start.as_ref())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// The user config directory (`~/.config/slipway/` on Linux, the platform
/// equivalent elsewhere).
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
}

/// The machine-local data directory (`~/.local/share/slipway/` on Linux, the
/// platform equivalent elsewhere). Holds log files unless overridden.
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.data_local_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::RELEASE_STEPS;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn write(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn loader() -> ConfigLoader {
        ConfigLoader::new().with_user_config(false)
    }

    #[test]
    fn defaults_stand_without_any_file() {
        let config = loader().without_boundary_marker().load().unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert!(config.descriptor.is_none());
        assert!(config.commands.is_none());
        assert!(config.release.is_none());
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let file = write(
            &root,
            "config.toml",
            "log_level = \"debug\"\nlog_dir = \"/tmp/slipway\"\n",
        );

        let config = loader().with_file(&file).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.log_dir.as_ref().map(|p| p.as_str()),
            Some("/tmp/slipway")
        );
    }

    #[test]
    fn later_explicit_file_wins() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let first = write(&root, "first.toml", "log_level = \"warn\"\n");
        let second = write(&root, "second.toml", "log_level = \"error\"\n");

        let config = loader().with_file(&first).with_file(&second).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn project_discovery_walks_up() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let deep = root.join("src").join("nested").join("deep");
        fs::create_dir_all(&deep).unwrap();
        write(&root, ".slipway.toml", "log_level = \"debug\"\n");

        let config = loader()
            .without_boundary_marker()
            .with_project_search(&deep)
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn dotfile_outranks_plain_name() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        write(&root, ".slipway.toml", "log_level = \"debug\"\n");
        write(&root, "slipway.toml", "log_level = \"error\"\n");

        let found = find_project_config(&root).unwrap();
        assert_eq!(found, root.join(".slipway.toml"));
    }

    #[test]
    fn toml_outranks_yaml() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        write(&root, "slipway.yaml", "log_level: error\n");
        write(&root, "slipway.toml", "log_level = \"warn\"\n");

        let config = loader()
            .without_boundary_marker()
            .with_project_search(&root)
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn yaml_and_json_sources_parse() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let yaml = write(&root, "a.yaml", "log_level: warn\n");
        let json = write(&root, "b.json", "{\"log_level\": \"error\"}\n");

        let config = loader().with_file(&yaml).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);

        let config = loader().with_file(&json).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn enclosing_repo_config_is_ignored() {
        // outer/.slipway.toml must not leak into outer/repo/work when
        // outer/repo carries the boundary marker.
        let tmp = TempDir::new().unwrap();
        let outer = utf8(tmp.path()).join("outer");
        let work = outer.join("repo").join("work");
        fs::create_dir_all(&work).unwrap();
        fs::create_dir(outer.join("repo").join(".git")).unwrap();
        write(&outer, ".slipway.toml", "log_level = \"warn\"\n");

        let config = loader().with_project_search(&work).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn boundary_exempts_the_start_directory() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        fs::create_dir(root.join(".git")).unwrap();
        write(&root, ".slipway.toml", "log_level = \"debug\"\n");

        let config = loader().with_project_search(&root).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn load_or_error_requires_a_source() {
        let result = loader().without_boundary_marker().load_or_error();
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn load_or_error_accepts_an_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let file = write(&root, "config.toml", "log_level = \"debug\"\n");

        let config = loader().with_file(&file).load_or_error().unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn user_config_dir_names_the_app() {
        if let Some(dir) = user_config_dir() {
            assert!(dir.as_str().contains(APP_NAME));
        }
    }

    #[test]
    fn descriptor_section_parses() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let file = write(
            &root,
            "config.toml",
            r#"
[descriptor]
dir = "versions"
file = "build.sbt"
patterns = ['version\s*:=\s*"([^"]*)"']
"#,
        );

        let config = loader().with_file(&file).load().unwrap();
        let descriptor = config.descriptor.unwrap();
        assert_eq!(descriptor.dir.as_deref(), Some("versions"));
        assert_eq!(descriptor.file.as_deref(), Some("build.sbt"));
        assert_eq!(descriptor.patterns.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn workflow_sections_parse() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let file = write(
            &root,
            "config.toml",
            r#"
[commands]
publish_local = "sbt publishLocal"
publish = "sbt publish"

[release]
steps = ["release-ready", "version-to-stable", "git-commit"]
tag_prefix = "release-"
commit_message = "release: {version}"
confirm = false
"#,
        );

        let config = loader().with_file(&file).load().unwrap();

        let commands = config.commands.unwrap();
        assert_eq!(commands.publish_local.as_deref(), Some("sbt publishLocal"));
        assert_eq!(commands.publish.as_deref(), Some("sbt publish"));

        let release = config.release.unwrap();
        let steps = release.steps.unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], RELEASE_STEPS[0]);
        assert_eq!(release.tag_prefix.as_deref(), Some("release-"));
        assert_eq!(release.commit_message.as_deref(), Some("release: {version}"));
        assert_eq!(release.confirm, Some(false));
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(tmp.path());
        let file = write(
            &root,
            "config.toml",
            "log_level = \"warn\"\n\n[future]\nflag = true\n",
        );

        let config = loader().with_file(&file).load().unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }
}
