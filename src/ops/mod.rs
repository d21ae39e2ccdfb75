//! High-level operations.
//!
//! This module contains the implementation of quay commands.

pub mod open;
pub mod quay_build;
pub mod quay_clean;
pub mod quay_fetch;
pub mod quay_foreach;
pub mod quay_init;
pub mod quay_plan;
pub mod quay_status;

pub use open::{open_workspace, select_projects, WorkspaceOptions};
pub use quay_build::{pipeline_options, run_build, BuildCommand, BuildOptions, BuildResult};
pub use quay_clean::{clean, CleanOptions};
pub use quay_fetch::{fetch, FetchOptions};
pub use quay_foreach::{foreach, ForeachOptions};
pub use quay_init::{init_project, init_worktree};
pub use quay_plan::{format_plan, resolve_plan};
pub use quay_status::{build_directories, format_age, format_status, status, BuildDirStatus, ProjectStatus};
