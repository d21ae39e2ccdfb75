//! `quay make` command

use anyhow::Result;

use super::{finish, workspace_options};
use crate::cli::MakeArgs;
use quay::builder::CMakeBackend;
use quay::ops::{open_workspace, run_build, select_projects, BuildCommand, BuildOptions};
use quay::GlobalContext;

pub fn execute(args: MakeArgs, ctx: &GlobalContext) -> Result<()> {
    let (mut ws, config) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), &args.select.projects)?;
    let backend = CMakeBackend::new()?;

    let opts = BuildOptions {
        projects,
        single: args.select.single,
        ignore_errors: args.ignore_errors,
        jobs: args.jobs,
        ..BuildOptions::default()
    };

    let result = run_build(&mut ws, &config, &backend, BuildCommand::Make, &opts)?;
    finish("building", &result.report)
}
