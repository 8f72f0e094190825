//! Info command — show package, config, and project version information.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use slipway_core::config::{self, Config};
use slipway_core::descriptor::{Descriptor, DescriptorSettings};
use slipway_core::version::Version;

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // `info` has no flags of its own; `--json` is global.
}

/// Everything `info` reports, serialized as-is for `--json`.
#[derive(Serialize)]
struct InfoReport {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<ProjectReport>,
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

const PACKAGE: PackageInfo = PackageInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    description: env!("CARGO_PKG_DESCRIPTION"),
    repository: env!("CARGO_PKG_REPOSITORY"),
    homepage: env!("CARGO_PKG_HOMEPAGE"),
    license: env!("CARGO_PKG_LICENSE"),
};

/// What the config subsystem resolved for this invocation.
#[derive(Serialize)]
struct ConfigReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
}

impl ConfigReport {
    fn gather(config: &Config, cwd: &camino::Utf8Path) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(camino::Utf8PathBuf::into_string),
            log_level: config.log_level.as_str().to_owned(),
            log_dir: config.log_dir.clone().map(camino::Utf8PathBuf::into_string),
        }
    }
}

/// The project's version story, when a descriptor exists in `cwd`.
#[derive(Serialize)]
struct ProjectReport {
    descriptor: String,
    version: String,
    semantic: bool,
    snapshot: bool,
}

impl ProjectReport {
    fn gather(config: &Config, cwd: &camino::Utf8Path) -> Option<Self> {
        let settings = DescriptorSettings::from_config(config).ok()?;
        let descriptor = Descriptor::open(cwd, &settings).ok()?;
        let version = Version::parse(&descriptor.version().ok()?);

        Some(Self {
            descriptor: descriptor.path().to_string(),
            version: version.to_string(),
            semantic: matches!(version, Version::Semantic { .. }),
            snapshot: version.is_snapshot(),
        })
    }
}

/// Print package, configuration, and project information.
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let report = InfoReport {
        package: PACKAGE,
        config: ConfigReport::gather(config, cwd),
        project: ProjectReport::gather(config, cwd),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_package(&report.package);
    print_config(&report.config);
    print_project(report.project.as_ref());
    Ok(())
}

fn print_package(package: &PackageInfo) {
    println!("{} {}", package.name.bold(), package.version.green());
    if !package.description.is_empty() {
        println!("{}", package.description);
    }
    for (label, value) in [
        ("License", package.license),
        ("Repository", package.repository),
        ("Homepage", package.homepage),
    ] {
        if !value.is_empty() {
            println!("{}: {}", label.dimmed(), value.cyan());
        }
    }
}

fn print_config(config: &ConfigReport) {
    println!();
    println!("{}", "Configuration".bold().underline());
    match &config.config_file {
        Some(path) => println!("{}: {}", "Config file".dimmed(), path.cyan()),
        None => println!("{}: {}", "Config file".dimmed(), "none loaded".yellow()),
    }
    println!("{}: {}", "Log level".dimmed(), config.log_level);
    if let Some(dir) = &config.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
}

fn print_project(project: Option<&ProjectReport>) {
    println!();
    println!("{}", "Project".bold().underline());
    let Some(project) = project else {
        println!(
            "  {} {}",
            "○".yellow(),
            "No version descriptor found".yellow()
        );
        return;
    };

    println!("{}: {}", "Descriptor".dimmed(), project.descriptor.cyan());
    println!("{}: {}", "Version".dimmed(), project.version.bold());
    let kind = if project.semantic { "semantic" } else { "opaque" };
    if project.snapshot {
        println!("{}: {} ({})", "Kind".dimmed(), kind, "snapshot".yellow());
    } else {
        println!("{}: {}", "Kind".dimmed(), kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn renders_both_output_modes() {
        let config = Config::default();
        let cwd = Utf8PathBuf::from("/tmp");

        assert!(cmd_info(InfoArgs::default(), false, &config, &cwd).is_ok());
        assert!(cmd_info(InfoArgs::default(), true, &config, &cwd).is_ok());
    }

    #[test]
    fn config_report_without_any_file() {
        let report = ConfigReport::gather(&Config::default(), &Utf8PathBuf::from("/nonexistent"));

        assert!(report.config_file.is_none());
        assert_eq!(report.log_level, "info");
    }

    #[test]
    fn project_report_classifies_the_version() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        std::fs::write(root.join("Cargo.toml"), "version = \"0.4.0-SNAPSHOT\"\n").unwrap();

        let report = ProjectReport::gather(&Config::default(), &root).expect("descriptor found");
        assert_eq!(report.version, "0.4.0-SNAPSHOT");
        assert!(report.semantic);
        assert!(report.snapshot);
    }

    #[test]
    fn project_report_absent_without_descriptor() {
        let tmp = tempfile::TempDir::new().unwrap();
        let work = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap()
            .join("empty");
        std::fs::create_dir(&work).unwrap();

        assert!(ProjectReport::gather(&Config::default(), &work).is_none());
    }
}
