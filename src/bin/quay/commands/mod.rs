//! Command implementations

pub mod clean;
pub mod completions;
pub mod configure;
pub mod fetch;
pub mod foreach;
pub mod init;
pub mod install;
pub mod make;
pub mod package;
pub mod plan;
pub mod status;
pub mod test;

use anyhow::{bail, Result};

use crate::cli::ConfigArgs;
use quay::builder::{EntryOutcome, PipelineReport};
use quay::ops::WorkspaceOptions;

/// Work tree options selected on the command line.
pub fn workspace_options(args: &ConfigArgs) -> WorkspaceOptions {
    WorkspaceOptions {
        config: args.config.clone(),
        toolchain: args.toolchain.clone(),
        release: args.release,
        use_source: args.use_source.clone(),
    }
}

/// Print a summary of a pipeline run; fail when an entry did not complete.
pub fn finish(done: &str, report: &PipelineReport) -> Result<()> {
    let total = report.outcomes().len();
    let mut failed = 0;

    for (name, outcome) in report.outcomes() {
        match outcome {
            EntryOutcome::Completed => {}
            EntryOutcome::Failed { stage, error } => {
                failed += 1;
                eprintln!("    Failed `{}` at {}: {}", name, stage, error);
            }
            EntryOutcome::Skipped { blocked_by } => {
                failed += 1;
                eprintln!("   Skipped `{}` (blocked by `{}`)", name, blocked_by);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} projects failed", failed, total);
    }

    eprintln!("    Finished {} {} project(s)", done, total);
    Ok(())
}
