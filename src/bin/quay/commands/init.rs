//! `quay init` command

use anyhow::Result;

use crate::cli::InitArgs;
use quay::ops::{init_project, init_worktree};
use quay::GlobalContext;

pub fn execute(args: InitArgs, ctx: &GlobalContext) -> Result<()> {
    let path = match args.path {
        Some(path) => ctx.cwd().join(path),
        None => ctx.cwd().to_path_buf(),
    };

    let marker = init_worktree(&path)?;
    eprintln!("     Created work tree at {}", marker.display());

    if let Some(name) = args.project {
        let manifest = init_project(&path, &name, &[])?;
        eprintln!("     Created project `{}` ({})", name, manifest.display());
    }

    Ok(())
}
