use std::fs;
use std::path::PathBuf;
use std::process::Command;

use clap::Args;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Installation directory (default: ~/.bin)
    #[arg(long = "bin-dir")]
    pub bin_dir: Option<PathBuf>,
}

pub fn cmd_install(args: InstallArgs) -> Result<(), String> {
    let root = crate::workspace_root();

    let status = Command::new("cargo")
        .args(["build", "--release", "--package", "slipway"])
        .current_dir(&root)
        .status()
        .map_err(|e| format!("run cargo build: {e}"))?;
    if !status.success() {
        return Err("cargo build --release failed".to_string());
    }

    let bin_dir = match args.bin_dir {
        Some(dir) => dir,
        None => {
            let home = std::env::var_os("HOME").ok_or("HOME is not set")?;
            PathBuf::from(home).join(".bin")
        }
    };
    fs::create_dir_all(&bin_dir).map_err(|e| format!("{}: {e}", bin_dir.display()))?;

    let source = root.join("target/release/slipway");
    let target = bin_dir.join("slipway");
    fs::copy(&source, &target).map_err(|e| {
        format!(
            "copy {} to {}: {e}",
            source.display(),
            target.display()
        )
    })?;

    println!("installed {}", target.display());
    Ok(())
}
