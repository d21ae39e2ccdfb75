//! Core data structures for Quay.
//!
//! This module contains the entity model of a work tree:
//! - Projects (built from source) and packages (prebuilt)
//! - Toolchains, which bundle packages
//! - Build configurations, which name build directories
//! - The workspace tying them together

pub mod configuration;
pub mod manifest;
pub mod package;
pub mod project;
pub mod toolchain;
pub mod workspace;

pub use configuration::BuildConfiguration;
pub use manifest::{ProjectManifest, BUILD_DESCRIPTION, MANIFEST_NAME};
pub use package::Package;
pub use project::Project;
pub use toolchain::Toolchain;
pub use workspace::{find_worktree, Workspace, WorkspaceError, WORKTREE_MARKER};
