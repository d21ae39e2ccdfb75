//! Opening the workspace and selecting projects for a command.

use std::path::Path;

use anyhow::{bail, Result};

use crate::core::{Workspace, WorkspaceError};
use crate::util::config::Config;
use crate::util::context::GlobalContext;

/// Command-line overrides of the build configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceOptions {
    /// Build configuration name
    pub config: Option<String>,

    /// Toolchain providing prebuilt packages
    pub toolchain: Option<String>,

    pub release: bool,

    /// Names built from source even when a package provides them
    pub use_source: Vec<String>,
}

/// Open the work tree found from the context, with configuration files and
/// command-line overrides applied.
pub fn open_workspace(ctx: &GlobalContext, opts: &WorkspaceOptions) -> Result<(Workspace, Config)> {
    let root = ctx
        .find_worktree()
        .ok_or_else(|| WorkspaceError::NotAWorkTree {
            path: ctx.search_root().to_path_buf(),
        })?;

    let config = ctx.load_config(Some(&root));
    let mut configuration = config.build_configuration();
    if opts.config.is_some() {
        configuration.name = opts.config.clone();
    }
    if opts.toolchain.is_some() {
        configuration.toolchain = opts.toolchain.clone();
    }
    if opts.release {
        configuration.release = true;
    }

    let ws = Workspace::open_with(&root, configuration)?.with_active_projects(opts.use_source.clone());
    Ok((ws, config))
}

/// Names a command operates on.
///
/// Explicit names win. Otherwise the project containing `cwd`, or every
/// buildable project when `cwd` is outside all of them.
pub fn select_projects(ws: &Workspace, cwd: &Path, names: &[String]) -> Result<Vec<String>> {
    if !names.is_empty() {
        return Ok(names.to_vec());
    }

    if let Some(project) = ws.project_containing(cwd) {
        return Ok(vec![project.name().to_string()]);
    }

    let all: Vec<String> = ws
        .buildable_projects()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    if all.is_empty() {
        bail!(
            "no buildable projects in {}\n\
             hint: a project needs a quay.toml next to its CMakeLists.txt",
            ws.root().display()
        );
    }
    Ok(all)
}
