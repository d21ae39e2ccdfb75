//! `quay package` command

use anyhow::Result;

use super::{finish, workspace_options};
use crate::cli::PackageArgs;
use quay::builder::CMakeBackend;
use quay::ops::{open_workspace, run_build, select_projects, BuildCommand, BuildOptions};
use quay::GlobalContext;

pub fn execute(args: PackageArgs, ctx: &GlobalContext) -> Result<()> {
    let (mut ws, config) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), &args.select.projects)?;
    let backend = CMakeBackend::new()?;

    let opts = BuildOptions {
        projects,
        single: args.select.single,
        package_dir: Some(ctx.cwd().join(&args.output)),
        ..BuildOptions::default()
    };

    let result = run_build(&mut ws, &config, &backend, BuildCommand::Package, &opts)?;
    finish("packaging", &result.report)
}
