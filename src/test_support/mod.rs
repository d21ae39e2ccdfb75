//! Test utilities for quay unit tests.
//!
//! [`WorkTreeBuilder`] lays out a throwaway work tree on disk and
//! [`RecordingBackend`] stands in for CMake, so the pipeline can be exercised
//! without a native toolchain.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{RecordingBackend, WorkTreeBuilder};
//!
//! #[test]
//! fn test_example() {
//!     let tree = WorkTreeBuilder::new()
//!         .project("hello", "hello", &["world"])
//!         .project("world", "world", &[])
//!         .build();
//!
//!     let backend = RecordingBackend::new();
//!     // Open the workspace, resolve and run the pipeline...
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use crate::builder::backend::{BuildBackend, Invocation};
use crate::builder::{Stage, StageError};
use crate::core::{BUILD_DESCRIPTION, MANIFEST_NAME, WORKTREE_MARKER};

#[derive(Debug, Clone)]
struct ProjectFixture {
    dir: String,
    name: String,
    depends: Vec<String>,
    version: Option<String>,
    toolchain_version: Option<String>,
}

#[derive(Debug, Clone)]
struct ToolchainFixture {
    name: String,
    version: Option<String>,
    packages: Vec<(String, String)>,
}

/// Builder for an on-disk work tree.
#[derive(Debug, Default)]
pub struct WorkTreeBuilder {
    projects: Vec<ProjectFixture>,
    toolchains: Vec<ToolchainFixture>,
}

impl WorkTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project under `dir` (relative to the root).
    pub fn project(self, dir: &str, name: &str, depends: &[&str]) -> Self {
        self.project_with(dir, name, depends, None, None)
    }

    /// Add a project with a version and a minimum toolchain version.
    pub fn project_with(
        mut self,
        dir: &str,
        name: &str,
        depends: &[&str],
        version: Option<&str>,
        toolchain_version: Option<&str>,
    ) -> Self {
        self.projects.push(ProjectFixture {
            dir: dir.to_string(),
            name: name.to_string(),
            depends: depends.iter().map(|d| d.to_string()).collect(),
            version: version.map(str::to_string),
            toolchain_version: toolchain_version.map(str::to_string),
        });
        self
    }

    /// Add a toolchain file. Package paths are relative to the toolchain
    /// directory and get created empty.
    pub fn toolchain(mut self, name: &str, version: Option<&str>, packages: &[(&str, &str)]) -> Self {
        self.toolchains.push(ToolchainFixture {
            name: name.to_string(),
            version: version.map(str::to_string),
            packages: packages
                .iter()
                .map(|(n, p)| (n.to_string(), p.to_string()))
                .collect(),
        });
        self
    }

    pub fn build(self) -> WorkTree {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let toolchains = root.join(WORKTREE_MARKER).join("toolchains");
        std::fs::create_dir_all(&toolchains).unwrap();

        for project in &self.projects {
            let project_dir = root.join(&project.dir);
            std::fs::create_dir_all(&project_dir).unwrap();
            std::fs::write(project_dir.join(MANIFEST_NAME), project.manifest()).unwrap();
            std::fs::write(
                project_dir.join(BUILD_DESCRIPTION),
                format!("cmake_minimum_required(VERSION 3.16)\nproject({})\n", project.name),
            )
            .unwrap();
        }

        for toolchain in &self.toolchains {
            let mut content = format!("[toolchain]\nname = \"{}\"\n", toolchain.name);
            if let Some(version) = &toolchain.version {
                content.push_str(&format!("version = \"{}\"\n", version));
            }
            for (name, path) in &toolchain.packages {
                content.push_str(&format!("\n[[package]]\nname = \"{}\"\npath = \"{}\"\n", name, path));
                std::fs::create_dir_all(toolchains.join(path)).unwrap();
            }
            std::fs::write(toolchains.join(format!("{}.toml", toolchain.name)), content).unwrap();
        }

        WorkTree { dir }
    }
}

impl ProjectFixture {
    fn manifest(&self) -> String {
        let depends = self
            .depends
            .iter()
            .map(|d| format!("\"{}\"", d))
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = format!("[project]\nname = \"{}\"\ndepends = [{}]\n", self.name, depends);
        if let Some(version) = &self.version {
            out.push_str(&format!("version = \"{}\"\n", version));
        }
        if let Some(version) = &self.toolchain_version {
            out.push_str(&format!("toolchain_version = \"{}\"\n", version));
        }
        out
    }
}

/// A work tree in a temporary directory, removed on drop.
pub struct WorkTree {
    dir: TempDir,
}

impl WorkTree {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// One backend call seen by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub stage: Stage,
    pub project: String,
    pub sdk_dirs: Vec<PathBuf>,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.stage, self.project)
    }
}

/// Backend that records calls instead of running CMake.
///
/// Install writes a small tree into the prefix: one runtime file, one
/// header and one CMake package file.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    failures: HashSet<(String, Stage)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `stage` fail for `project`.
    pub fn fail_on(mut self, project: &str, stage: Stage) -> Self {
        self.failures.insert((project.to_string(), stage));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, stage: Stage, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.calls.lock().unwrap().push(Call {
            stage,
            project: inv.project.to_string(),
            sdk_dirs: inv.sdk_dirs.to_vec(),
        });

        if self.failures.contains(&(inv.project.to_string(), stage)) {
            return Err(StageError::BackendInvocationFailed {
                project: inv.project.to_string(),
                stage,
                exit_code: Some(1),
                output: format!("{} failed", stage),
            });
        }
        Ok(())
    }
}

impl BuildBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn configure(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.record(Stage::Configure, inv)
    }

    fn build(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.record(Stage::Build, inv)
    }

    fn test(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.record(Stage::Test, inv)
    }

    fn install(&self, inv: &Invocation<'_>, prefix: &Path) -> Result<(), StageError> {
        self.record(Stage::Install, inv)?;

        let name = inv.project;
        let files = [
            (format!("share/{0}/{0}.txt", name), name.to_string()),
            (format!("include/{}.h", name), format!("int {}(void);\n", name)),
            (
                format!("share/cmake/{}-config.cmake", name),
                format!("set({}_FOUND TRUE)\n", name),
            ),
        ];
        for (rel, content) in files {
            let path = prefix.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        Ok(())
    }
}
