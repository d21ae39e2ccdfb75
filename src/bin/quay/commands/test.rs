//! `quay test` command

use anyhow::Result;

use super::{finish, workspace_options};
use crate::cli::TestArgs;
use quay::builder::CMakeBackend;
use quay::ops::{open_workspace, run_build, select_projects, BuildCommand, BuildOptions};
use quay::GlobalContext;

pub fn execute(args: TestArgs, ctx: &GlobalContext) -> Result<()> {
    let (mut ws, config) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), &args.projects)?;
    let backend = CMakeBackend::new()?;

    let opts = BuildOptions {
        projects,
        ignore_errors: args.ignore_errors,
        ..BuildOptions::default()
    };

    let result = run_build(&mut ws, &config, &backend, BuildCommand::Test, &opts)?;
    finish("testing", &result.report)
}
