//! CMake backend.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::backend::{BuildBackend, Invocation};
use crate::builder::bootstrap::DEPENDENCIES_FILE;
use crate::builder::{Stage, StageError};
use crate::util::process::{combined_output, find_cmake, ProcessBuilder};

/// Backend driving the `cmake` executable.
#[derive(Debug, Clone)]
pub struct CMakeBackend {
    cmake: PathBuf,
    ctest: PathBuf,
    generator: Option<String>,
}

impl CMakeBackend {
    /// Create a backend using the `cmake` found in PATH (or `$CMAKE`).
    pub fn new() -> Result<Self> {
        let Some(cmake) = find_cmake() else {
            bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to configure and build projects.\n\
                 Install CMake and ensure it's in your PATH."
            );
        };

        Ok(Self::with_program(cmake))
    }

    /// Create a backend using a specific cmake executable.
    ///
    /// `ctest` is taken from the same directory when it is there.
    pub fn with_program(cmake: impl Into<PathBuf>) -> Self {
        let cmake = cmake.into();
        CMakeBackend {
            ctest: ctest_next_to(&cmake),
            cmake,
            generator: None,
        }
    }

    /// Use a specific CMake generator.
    pub fn with_generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    /// The configure command line.
    pub fn configure_command(&self, inv: &Invocation<'_>) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(inv.source_dir)
            .arg("-B")
            .arg(inv.build_dir);

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        let dependencies = inv.build_dir.join(DEPENDENCIES_FILE);
        if dependencies.is_file() {
            cmd = cmd.arg("-C").arg(dependencies);
        }

        let prefix_path = inv
            .sdk_dirs
            .iter()
            .map(|p| cmake_path(p))
            .collect::<Vec<_>>()
            .join(";");

        cmd.arg(format!("-DCMAKE_PREFIX_PATH={}", prefix_path))
            .arg(format!("-DQUAY_SDK_DIR={}", cmake_path(&inv.sdk_dir())))
            .arg(format!("-DCMAKE_BUILD_TYPE={}", build_type(inv.release)))
            .args(inv.flags)
    }

    /// The build command line.
    pub fn build_command(&self, inv: &Invocation<'_>) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake)
            .arg("--build")
            .arg(inv.build_dir)
            .arg("--config")
            .arg(build_type(inv.release))
    }

    /// The install command line.
    pub fn install_command(&self, inv: &Invocation<'_>, prefix: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake)
            .arg("--install")
            .arg(inv.build_dir)
            .arg("--prefix")
            .arg(prefix)
            .arg("--config")
            .arg(build_type(inv.release))
    }

    /// The test command line, run from the build directory.
    pub fn test_command(&self, inv: &Invocation<'_>) -> ProcessBuilder {
        ProcessBuilder::new(&self.ctest)
            .arg("--output-on-failure")
            .arg("-C")
            .arg(build_type(inv.release))
            .cwd(inv.build_dir)
    }

    fn run(&self, cmd: ProcessBuilder, inv: &Invocation<'_>, stage: Stage) -> Result<(), StageError> {
        let output = cmd.exec().map_err(|e| StageError::io(inv.project, stage, e))?;

        if !output.status.success() {
            return Err(StageError::BackendInvocationFailed {
                project: inv.project.to_string(),
                stage,
                exit_code: output.status.code(),
                output: combined_output(&output),
            });
        }

        Ok(())
    }
}

impl BuildBackend for CMakeBackend {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.run(self.configure_command(inv), inv, Stage::Configure)
    }

    fn build(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.run(self.build_command(inv), inv, Stage::Build)
    }

    fn test(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.run(self.test_command(inv), inv, Stage::Test)
    }

    fn install(&self, inv: &Invocation<'_>, prefix: &Path) -> Result<(), StageError> {
        self.run(self.install_command(inv, prefix), inv, Stage::Install)
    }
}

fn ctest_next_to(cmake: &Path) -> PathBuf {
    let name = format!("ctest{}", std::env::consts::EXE_SUFFIX);
    match cmake.parent() {
        Some(dir) if dir.join(&name).is_file() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

fn build_type(release: bool) -> &'static str {
    if release {
        "Release"
    } else {
        "Debug"
    }
}

/// CMake wants forward slashes, even on Windows.
pub fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
