//! `quay install` command

use anyhow::{Context, Result};

use super::{finish, workspace_options};
use crate::cli::InstallArgs;
use quay::builder::CMakeBackend;
use quay::ops::{open_workspace, run_build, select_projects, BuildCommand, BuildOptions};
use quay::GlobalContext;

pub fn execute(args: InstallArgs, ctx: &GlobalContext) -> Result<()> {
    let (dest, names) = args
        .args
        .split_last()
        .context("missing destination directory")?;
    let dest = ctx.cwd().join(dest);

    let (mut ws, config) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), names)?;
    let backend = CMakeBackend::new()?;

    let opts = BuildOptions {
        projects,
        single: args.single,
        install_dest: Some(dest.clone()),
        all_files: args.all,
        ..BuildOptions::default()
    };

    let result = run_build(&mut ws, &config, &backend, BuildCommand::Install, &opts)?;
    finish("installing", &result.report)?;
    eprintln!("   Installed to {}", dest.display());
    Ok(())
}
