//! Source projects.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::manifest::{ProjectManifest, BUILD_DESCRIPTION};

/// A source-buildable unit of a work tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    name: String,

    /// Directory holding the manifest
    source_path: PathBuf,

    /// Build directory, once it exists on disk
    build_directory: Option<PathBuf>,

    dependencies: Vec<String>,

    version: Option<String>,

    toolchain_version: Option<String>,
}

impl Project {
    /// Create a new project with no dependencies.
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Project {
            name: name.into(),
            source_path: source_path.into(),
            build_directory: None,
            dependencies: Vec::new(),
            version: None,
            toolchain_version: None,
        }
    }

    /// Create a project from its parsed manifest.
    pub fn from_manifest(manifest: ProjectManifest, source_path: PathBuf) -> Self {
        let meta = manifest.project;
        Project {
            name: meta.name,
            source_path,
            build_directory: None,
            dependencies: meta.depends,
            version: meta.version,
            toolchain_version: meta.toolchain_version,
        }
    }

    /// Set the dependency list.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the project version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the minimum toolchain version.
    pub fn with_toolchain_version(mut self, version: impl Into<String>) -> Self {
        self.toolchain_version = Some(version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn toolchain_version(&self) -> Option<&str> {
        self.toolchain_version.as_deref()
    }

    /// Recorded build directory, if any.
    pub fn build_directory(&self) -> Option<&Path> {
        self.build_directory.as_deref()
    }

    /// A project without a build directory has never been bootstrapped.
    pub fn is_configured(&self) -> bool {
        self.build_directory.is_some()
    }

    /// Whether the project carries a build description.
    pub fn is_buildable(&self) -> bool {
        self.source_path.join(BUILD_DESCRIPTION).is_file()
    }

    /// Deterministic build directory for a build folder name.
    pub fn build_directory_named(&self, folder_name: &str) -> PathBuf {
        self.source_path.join(format!("build-{}", folder_name))
    }

    pub(crate) fn set_build_directory(&mut self, path: PathBuf) {
        self.build_directory = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_project_is_unconfigured() {
        let project = Project::new("hello", "/src/hello").with_dependencies(["world"]);
        assert_eq!(project.name(), "hello");
        assert_eq!(project.dependencies(), ["world".to_string()]);
        assert!(!project.is_configured());
        assert_eq!(
            project.build_directory_named("linux64"),
            PathBuf::from("/src/hello/build-linux64")
        );
    }

    #[test]
    fn test_buildable_needs_cmakelists() {
        let tmp = TempDir::new().unwrap();
        let project = Project::new("hello", tmp.path());
        assert!(!project.is_buildable());

        std::fs::write(tmp.path().join("CMakeLists.txt"), "project(hello)\n").unwrap();
        assert!(project.is_buildable());
    }
}
