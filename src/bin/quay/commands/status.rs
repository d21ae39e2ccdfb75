//! `quay status` command

use anyhow::Result;

use super::workspace_options;
use crate::cli::StatusArgs;
use quay::ops::{format_status, open_workspace, status};
use quay::GlobalContext;

pub fn execute(args: StatusArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, _) = open_workspace(ctx, &workspace_options(&args.config))?;

    let statuses = status(&ws)?;
    if statuses.is_empty() {
        eprintln!("No buildable projects in {}", ws.root().display());
        return Ok(());
    }

    print!("{}", format_status(&statuses));
    Ok(())
}
