//! Global context for Quay operations.
//!
//! Provides centralized access to the working directory and configuration
//! locations. Configuration is loaded once per invocation and passed down
//! explicitly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::workspace::{find_worktree, WORKTREE_MARKER};
use crate::util::config::{global_config_path, load_config, Config};

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit work tree given on the command line
    work_tree: Option<PathBuf>,

    /// Global configuration file, if the platform has a config dir
    global_config: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            cwd,
            work_tree: None,
            global_config: global_config_path(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            work_tree: None,
            global_config: global_config_path(),
        }
    }

    /// Use an explicit work tree instead of searching from cwd.
    pub fn with_work_tree(mut self, work_tree: Option<PathBuf>) -> Self {
        self.work_tree = work_tree.map(|p| {
            if p.is_absolute() {
                p
            } else {
                self.cwd.join(p)
            }
        });
        self
    }

    /// Override the global config file location.
    pub fn with_global_config(mut self, path: Option<PathBuf>) -> Self {
        self.global_config = path;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Directory the work tree search starts from.
    pub fn search_root(&self) -> &Path {
        self.work_tree.as_deref().unwrap_or(&self.cwd)
    }

    /// Locate the work tree root, if any.
    pub fn find_worktree(&self) -> Option<PathBuf> {
        find_worktree(self.search_root())
    }

    /// Load the merged configuration for the given work tree.
    pub fn load_config(&self, worktree_root: Option<&Path>) -> Config {
        let local = worktree_root.map(|root| root.join(WORKTREE_MARKER).join("config.toml"));
        load_config(self.global_config.as_deref(), local.as_deref())
    }
}
