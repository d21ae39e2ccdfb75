//! `quay foreach` command

use anyhow::{bail, Result};

use crate::cli::ForeachArgs;
use quay::ops::{foreach, open_workspace, ForeachOptions, WorkspaceOptions};
use quay::GlobalContext;

pub fn execute(args: ForeachArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, _) = open_workspace(ctx, &WorkspaceOptions::default())?;

    let opts = ForeachOptions {
        command: args.command,
        ignore_errors: args.ignore_errors,
    };

    let failed = foreach(&ws, &opts)?;
    if !failed.is_empty() {
        bail!("command failed in: {}", failed.join(", "));
    }
    Ok(())
}
