//! Prebuilt packages.
//!
//! A package is a tree that was built elsewhere and ships with a toolchain.
//! It has no build stages: its root is directly usable as an SDK directory.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// A prebuilt dependency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    name: String,
    path: PathBuf,
    version: Option<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Package {
            name: name.into(),
            path: path.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root of the package tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Path dependents use to find this package's exports.
    pub fn sdk_dir(&self) -> &Path {
        &self.path
    }
}
