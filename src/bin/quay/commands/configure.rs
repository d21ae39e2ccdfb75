//! `quay configure` command

use anyhow::Result;

use super::{finish, workspace_options};
use crate::cli::ConfigureArgs;
use quay::builder::CMakeBackend;
use quay::ops::{
    format_plan, open_workspace, resolve_plan, run_build, select_projects, BuildCommand,
    BuildOptions,
};
use quay::GlobalContext;

pub fn execute(args: ConfigureArgs, ctx: &GlobalContext) -> Result<()> {
    let (mut ws, config) = open_workspace(ctx, &workspace_options(&args.config))?;
    let projects = select_projects(&ws, ctx.cwd(), &args.select.projects)?;

    let plan = resolve_plan(&ws, &projects, args.select.single)?;
    print!("{}", format_plan(&plan));

    let backend = CMakeBackend::new()?;
    let opts = BuildOptions {
        projects,
        single: args.select.single,
        ignore_errors: args.ignore_errors,
        cmake_flags: args.cmake_flags.iter().map(|f| cmake_define(f)).collect(),
        ..BuildOptions::default()
    };

    let result = run_build(&mut ws, &config, &backend, BuildCommand::Configure, &opts)?;
    finish("configuring", &result.report)
}

/// `-D FOO=ON` arrives as `FOO=ON`.
fn cmake_define(flag: &str) -> String {
    if flag.starts_with("-D") {
        flag.to_string()
    } else {
        format!("-D{}", flag)
    }
}
