use std::fs;
use std::path::PathBuf;

use clap::Args;
use clap_complete::{Shell, generate_to};

/// Shells we ship completions for when no `--shell` is given.
const ALL_SHELLS: [Shell; 4] = [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell];

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Directory the scripts are written into, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/completions")]
    pub out_dir: PathBuf,

    /// Emit a script for one shell instead of all of them
    #[arg(long, value_enum)]
    pub shell: Option<Shell>,
}

pub fn cmd_completions(args: CompletionsArgs) -> Result<(), String> {
    let out_dir = crate::workspace_root().join(args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    let mut cmd = slipway::command();
    let shells = args
        .shell
        .map_or_else(|| ALL_SHELLS.to_vec(), |shell| vec![shell]);

    for shell in shells {
        let script = generate_to(shell, &mut cmd, "slipway", &out_dir)
            .map_err(|e| format!("generate {shell} completions: {e}"))?;
        println!("wrote {}", script.display());
    }

    Ok(())
}
