//! `quay plan` command

use anyhow::Result;

use super::workspace_options;
use crate::cli::PlanArgs;
use quay::ops::{format_plan, open_workspace, resolve_plan, select_projects};
use quay::GlobalContext;

pub fn execute(args: PlanArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, _) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), &args.select.projects)?;
    let plan = resolve_plan(&ws, &projects, args.select.single)?;

    if args.json {
        println!("{}", plan.to_json()?);
    } else {
        print!("{}", format_plan(&plan));
    }

    Ok(())
}
