//! Implementation of `quay foreach`.

use anyhow::{bail, Result};

use crate::core::Workspace;
use crate::util::process::ProcessBuilder;

/// Options for `quay foreach`.
#[derive(Debug, Clone, Default)]
pub struct ForeachOptions {
    /// Program and arguments
    pub command: Vec<String>,

    /// Keep going when the command fails in a project
    pub ignore_errors: bool,
}

/// Run a command in the source directory of every buildable project.
///
/// Returns the names of the projects where the command failed; without
/// `ignore_errors` the first failure is an error.
pub fn foreach(ws: &Workspace, opts: &ForeachOptions) -> Result<Vec<String>> {
    let Some((program, args)) = opts.command.split_first() else {
        bail!("no command given");
    };

    let mut failed = Vec::new();
    for project in ws.buildable_projects() {
        let cmd = ProcessBuilder::new(program)
            .args(args)
            .cwd(project.source_path());
        tracing::info!("Running `{}` for {}", opts.command.join(" "), project.name());

        let error = match cmd.status() {
            Ok(status) if status.success() => continue,
            Ok(status) => format!(
                "`{}` failed in {} ({})",
                cmd.display_command(),
                project.name(),
                status
            ),
            Err(e) => format!("{:#}", e),
        };

        if !opts.ignore_errors {
            bail!(error);
        }
        tracing::error!("{}", error);
        failed.push(project.name().to_string());
    }

    Ok(failed)
}
