use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct ManArgs {
    /// Directory the pages are written into, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/man/man1")]
    pub out_dir: PathBuf,
}

pub fn cmd_man(args: ManArgs) -> Result<(), String> {
    let out_dir = crate::workspace_root().join(args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    // One page for the binary, one per subcommand.
    let cmd = slipway::command();
    render_page(cmd.clone(), &out_dir.join("slipway.1"))?;
    for subcommand in cmd.get_subcommands() {
        let file = format!("slipway-{}.1", subcommand.get_name());
        render_page(subcommand.clone(), &out_dir.join(file))?;
    }

    Ok(())
}

fn render_page(cmd: clap::Command, path: &Path) -> Result<(), String> {
    let mut roff = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut roff)
        .map_err(|e| format!("render {}: {e}", path.display()))?;
    fs::write(path, roff).map_err(|e| format!("{}: {e}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
