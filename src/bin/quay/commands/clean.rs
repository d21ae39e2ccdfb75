//! `quay clean` command

use anyhow::Result;

use super::workspace_options;
use crate::cli::CleanArgs;
use quay::ops::{clean, open_workspace, select_projects, CleanOptions};
use quay::GlobalContext;

pub fn execute(args: CleanArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, _) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), &args.select.projects)?;

    let opts = CleanOptions {
        projects,
        single: args.select.single,
        all: args.all,
        force: args.force,
    };
    let dirs = clean(&ws, &opts)?;

    if dirs.is_empty() {
        eprintln!("Nothing to clean");
        return Ok(());
    }

    if !args.force {
        println!("Build directories to remove:");
    }
    for dir in &dirs {
        println!("  {}", dir.display());
    }

    if args.force {
        eprintln!("     Removed {} build directories", dirs.len());
    } else {
        eprintln!("Use -f to remove them");
    }
    Ok(())
}
