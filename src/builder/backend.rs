//! Build backend trait.
//!
//! The pipeline never compiles anything itself: configure, build, test and
//! install are delegated to a backend. CMake is the only real implementation;
//! tests use a recording backend.

use std::path::{Path, PathBuf};

use crate::builder::StageError;

/// Everything a backend needs to know about one project.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// Project name, for error messages
    pub project: &'a str,

    pub source_dir: &'a Path,

    pub build_dir: &'a Path,

    /// SDK directories of the dependencies, closest first
    pub sdk_dirs: &'a [PathBuf],

    /// Extra configure flags
    pub flags: &'a [String],

    pub release: bool,
}

impl Invocation<'_> {
    /// Directory this project exports its SDK to.
    pub fn sdk_dir(&self) -> PathBuf {
        self.build_dir.join("sdk")
    }
}

/// A native build backend.
pub trait BuildBackend: Send + Sync {
    /// Backend name (e.g. "cmake").
    fn name(&self) -> &str;

    /// Generate the native build files in the build directory.
    fn configure(&self, inv: &Invocation<'_>) -> Result<(), StageError>;

    /// Compile a configured build directory.
    fn build(&self, inv: &Invocation<'_>) -> Result<(), StageError>;

    /// Run the test suite of a built directory.
    fn test(&self, inv: &Invocation<'_>) -> Result<(), StageError>;

    /// Install the build results under `prefix`.
    fn install(&self, inv: &Invocation<'_>, prefix: &Path) -> Result<(), StageError>;
}
