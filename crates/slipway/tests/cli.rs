//! End-to-end tests that drive the compiled binary as a subprocess:
//! flag handling, version commands against real descriptor files, and the
//! preflight/release flows against real git repositories.

use assert_cmd::Command;
use predicates::prelude::*;
use slipway_core::scm::git_available;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Run a git command in `dir`, panicking on failure.
fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

/// Initialize a repository with commit identity configured.
fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "release@example.com"]);
    git(dir, &["config", "user.name", "Release Bot"]);
}

fn commit_all(dir: &Path) {
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial import"]);
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_lists_usage_and_subcommands() {
    for flag in ["--help", "-h"] {
        cmd()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }

    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("preflight"));
}

#[test]
fn version_flag_prints_the_package_version() {
    for flag in ["--version", "-V"] {
        cmd()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_prints_package_identity() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_carries_the_package_fields() {
    let output = cmd().arg("info").arg("--json").assert().success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout)
        .expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn info_json_reports_project_version() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "version = \"2.5.0-SNAPSHOT\"\n").unwrap();

    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["project"]["version"], "2.5.0-SNAPSHOT");
    assert_eq!(json["project"]["semantic"], true);
    assert_eq!(json["project"]["snapshot"], true);
}

#[test]
fn subcommand_help_includes_global_flags() {
    cmd()
        .args(["info", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

// =============================================================================
// Version Commands
// =============================================================================

#[test]
fn bump_patch_rewrites_descriptor() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"1.2.3\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "bump", "patch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.4"));

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"1.2.4\"\n");
}

#[test]
fn bump_json_reports_outcome() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "version = \"1.2.3\"\n").unwrap();

    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "--json", "bump", "minor"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["status"], "applied");
    assert_eq!(json["previous"], "1.2.3");
    assert_eq!(json["next"], "1.3.0");
    assert_eq!(json["changed"], true);
}

#[test]
fn bump_on_opaque_version_is_a_soft_no_op() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"main-SNAPSHOT\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "bump", "patch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not a semantic version"));

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"main-SNAPSHOT\"\n");
}

#[test]
fn bump_dry_run_leaves_descriptor_untouched() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"1.2.3\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "bump", "patch", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.4"))
        .stdout(predicate::str::contains("Dry run"));

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"1.2.3\"\n");
}

#[test]
fn set_version_dry_run_reports_plan_as_json() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "version = \"1.2.3\"\n").unwrap();

    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--json",
            "set-version",
            "2.0.0",
            "--dry-run",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["previous"], "1.2.3");
    assert_eq!(json["next"], "2.0.0");
    assert_eq!(json["dry_run"], true);
}

#[test]
fn bump_fails_without_descriptor() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "bump", "patch"])
        .assert()
        .failure();
}

#[test]
fn set_version_rewrites_project_dir_descriptor() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("project")).unwrap();
    let descriptor = tmp.path().join("project").join("Version.sbt");
    fs::write(&descriptor, "version := \"0.9.0\"\n").unwrap();

    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "set-version",
            "1.0.0-SNAPSHOT",
        ])
        .assert()
        .success();

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version := \"1.0.0-SNAPSHOT\"\n");
}

#[test]
fn snapshot_appends_marker() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"1.0.0\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "snapshot"])
        .assert()
        .success();

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"1.0.0-SNAPSHOT\"\n");
}

#[test]
fn stable_strips_marker() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"1.0.0-SNAPSHOT\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "stable"])
        .assert()
        .success();

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"1.0.0\"\n");
}

#[test]
fn snapshot_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"1.0.0-SNAPSHOT\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "snapshot"])
        .assert()
        .success();

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"1.0.0-SNAPSHOT\"\n");
}

// =============================================================================
// Preflight Command
// =============================================================================

#[test]
fn preflight_fails_outside_git_repo() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "version = \"1.0.0\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "preflight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not inside a git repository"));
}

#[test]
fn preflight_passes_in_clean_repo() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Cargo.toml"),
        "version = \"0.1.0-SNAPSHOT\"\n",
    )
    .unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "preflight"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready to release!"));
}

#[test]
fn preflight_blocks_snapshot_dependency() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Cargo.toml"),
        "version = \"0.1.0-SNAPSHOT\"\n\n[dependencies]\nhelper = \"2.0-SNAPSHOT\"\n",
    )
    .unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "preflight"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "helper resolves to snapshot revision 2.0-SNAPSHOT",
        ));
}

#[test]
fn preflight_blocks_dirty_tree() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Cargo.toml"),
        "version = \"0.1.0-SNAPSHOT\"\n",
    )
    .unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());
    fs::write(tmp.path().join("straggler.txt"), "uncommitted\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "preflight"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Uncommitted changes"));
}

#[test]
fn preflight_json_reports_checks() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Cargo.toml"),
        "version = \"0.1.0-SNAPSHOT\"\n",
    )
    .unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());

    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "preflight", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Release Command
// =============================================================================

#[test]
fn release_fails_outside_git_repo() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "version = \"1.0.0\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "release", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not inside a git repository"));
}

#[test]
fn release_runs_the_full_sequence() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"0.1.0-SNAPSHOT\"\n").unwrap();
    fs::write(
        tmp.path().join(".slipway.toml"),
        r#"
[commands]
publish_local = "true"
publish = "true"

[release]
confirm = false
"#,
    )
    .unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "release", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v0.1.0"));

    // Next development version is written back
    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"0.1.1-SNAPSHOT\"\n");

    // The stable version was tagged
    let tags = std::process::Command::new("git")
        .args(["tag", "--list"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let tags = String::from_utf8_lossy(&tags.stdout);
    assert!(tags.contains("v0.1.0"), "tag listing: {tags}");
}

#[test]
fn release_dry_run_leaves_everything_untouched() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("Cargo.toml");
    fs::write(&descriptor, "version = \"0.1.0-SNAPSHOT\"\n").unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());

    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "release",
            "--dry-run",
            "--yes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"));

    let text = fs::read_to_string(&descriptor).unwrap();
    assert_eq!(text, "version = \"0.1.0-SNAPSHOT\"\n");

    let tags = std::process::Command::new("git")
        .args(["tag", "--list"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(tags.stdout.is_empty(), "dry run must not tag");
}

#[test]
fn release_refuses_when_stable_version_already_tagged() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Cargo.toml"),
        "version = \"0.1.0-SNAPSHOT\"\n",
    )
    .unwrap();
    init_repo(tmp.path());
    commit_all(tmp.path());
    git(tmp.path(), &["tag", "v0.1.0"]);

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "release", "--yes"])
        .assert()
        .failure();
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn global_flags_are_accepted_in_any_spelling() {
    for flags in [
        &["--quiet"][..],
        &["-q"],
        &["--verbose"],
        &["-v"],
        &["-vv"],
        &["--color", "auto"],
        &["--color", "always"],
        &["--color", "never"],
    ] {
        cmd().args(flags).arg("info").assert().success();
    }
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn bare_invocation_points_at_usage() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn malformed_invocations_are_usage_errors() {
    // Unknown subcommand, unknown flag, and a missing required argument.
    for args in [&["not-a-command"][..], &["--not-a-flag"], &["bump"]] {
        cmd()
            .args(args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }
}

// =============================================================================
// Chdir Flag
// =============================================================================

#[test]
fn chdir_flag_runs_in_the_given_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "version = \"3.1.4\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3.1.4"));
}

#[test]
fn chdir_to_a_missing_directory_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to change directory"));
}
