//! Workspace - the projects and packages of one work tree.
//!
//! A work tree is a directory holding a `.quay/` marker. Opening it scans the
//! tree once for `quay.toml` manifests and loads the packages of the selected
//! toolchain. The only state that persists between invocations is each
//! project's build directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::manifest::{ProjectManifest, MANIFEST_NAME};
use crate::core::{BuildConfiguration, Package, Project, Toolchain};

/// Directory marking the root of a work tree.
pub const WORKTREE_MARKER: &str = ".quay";

/// Errors raised while opening or querying a workspace.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum WorkspaceError {
    #[error("could not find a work tree at or above {}", .path.display())]
    #[diagnostic(
        code(quay::workspace::not_a_work_tree),
        help("run `quay init` at the root of your sources")
    )]
    NotAWorkTree { path: PathBuf },

    #[error("unknown project `{name}`")]
    #[diagnostic(
        code(quay::workspace::unknown_project),
        help("run `quay status` to see the projects of this work tree")
    )]
    UnknownProject { name: String },

    #[error("unknown package `{name}`")]
    #[diagnostic(code(quay::workspace::unknown_package))]
    UnknownPackage { name: String },

    #[error("toolchain `{name}` not found (expected {})", .path.display())]
    #[diagnostic(code(quay::workspace::unknown_toolchain))]
    UnknownToolchain { name: String, path: PathBuf },

    #[error(
        "project `{name}` is declared twice: in {} and in {}",
        .first.display(),
        .second.display()
    )]
    #[diagnostic(
        code(quay::workspace::duplicate_project),
        help("rename one of the projects in its quay.toml")
    )]
    DuplicateProject {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// The discovered projects and packages of a work tree.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Work tree root (directory holding the marker)
    root: PathBuf,

    /// Projects in discovery order
    projects: Vec<Project>,

    /// Packages of the selected toolchain, in toolchain order
    packages: Vec<Package>,

    toolchain: Option<Toolchain>,

    /// Names forced to be built from source
    active_projects: BTreeSet<String>,

    configuration: BuildConfiguration,
}

impl Workspace {
    /// Create an empty workspace rooted at `root`, without scanning.
    pub fn new(root: impl Into<PathBuf>, configuration: BuildConfiguration) -> Self {
        Workspace {
            root: root.into(),
            projects: Vec::new(),
            packages: Vec::new(),
            toolchain: None,
            active_projects: BTreeSet::new(),
            configuration,
        }
    }

    /// Open the work tree containing `path` with the default configuration.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, BuildConfiguration::default())
    }

    /// Open the work tree containing `path` with the given configuration.
    pub fn open_with(path: &Path, configuration: BuildConfiguration) -> Result<Self> {
        let root = find_worktree(path).ok_or_else(|| WorkspaceError::NotAWorkTree {
            path: path.to_path_buf(),
        })?;

        let mut ws = Workspace::new(root, configuration);

        for manifest_path in discover_manifests(&ws.root)? {
            let manifest = ProjectManifest::load(&manifest_path)?;
            let source_path = manifest_path
                .parent()
                .unwrap_or(&ws.root)
                .to_path_buf();
            ws.add_project(Project::from_manifest(manifest, source_path))?;
        }

        let folder = ws.configuration.build_folder_name();
        for project in &mut ws.projects {
            let build_dir = project.build_directory_named(&folder);
            if build_dir.is_dir() {
                project.set_build_directory(build_dir);
            }
        }

        if let Some(name) = ws.configuration.toolchain.clone() {
            let path = Toolchain::file_path(&ws.marker_dir(), &name);
            if !path.is_file() {
                return Err(WorkspaceError::UnknownToolchain { name, path }.into());
            }
            let toolchain = Toolchain::load(&path)?;
            ws = ws.with_toolchain(toolchain);
        }

        tracing::debug!(
            "opened work tree {} ({} projects, {} packages)",
            ws.root.display(),
            ws.projects.len(),
            ws.packages.len()
        );

        Ok(ws)
    }

    /// Add a project. Names must be unique.
    pub fn add_project(&mut self, project: Project) -> Result<(), WorkspaceError> {
        if let Some(existing) = self.find_project(project.name()) {
            return Err(WorkspaceError::DuplicateProject {
                name: project.name().to_string(),
                first: existing.source_path().to_path_buf(),
                second: project.source_path().to_path_buf(),
            });
        }
        self.projects.push(project);
        Ok(())
    }

    /// Bind a toolchain, replacing the package set.
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.packages = toolchain.packages().to_vec();
        self.toolchain = Some(toolchain);
        self
    }

    /// Force the given names to be treated as source projects.
    pub fn with_active_projects<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_projects = names.into_iter().map(Into::into).collect();
        self
    }

    /// Work tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.quay` directory.
    pub fn marker_dir(&self) -> PathBuf {
        self.root.join(WORKTREE_MARKER)
    }

    pub fn configuration(&self) -> &BuildConfiguration {
        &self.configuration
    }

    pub fn toolchain(&self) -> Option<&Toolchain> {
        self.toolchain.as_ref()
    }

    /// All projects, in discovery order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// All packages of the bound toolchain.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Projects that have a build description.
    pub fn buildable_projects(&self) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.is_buildable()).collect()
    }

    pub fn find_project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name() == name)
    }

    pub fn find_package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name() == name)
    }

    pub fn get_project(&self, name: &str) -> Result<&Project, WorkspaceError> {
        self.find_project(name)
            .ok_or_else(|| WorkspaceError::UnknownProject {
                name: name.to_string(),
            })
    }

    pub fn get_package(&self, name: &str) -> Result<&Package, WorkspaceError> {
        self.find_package(name)
            .ok_or_else(|| WorkspaceError::UnknownPackage {
                name: name.to_string(),
            })
    }

    /// Position of a project in discovery order.
    pub fn discovery_index(&self, name: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.name() == name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active_projects.contains(name)
    }

    pub fn active_projects(&self) -> impl Iterator<Item = &str> {
        self.active_projects.iter().map(String::as_str)
    }

    /// Build directory of a project: the recorded one, or the directory the
    /// current configuration would create.
    pub fn build_directory_for(&self, project: &Project) -> PathBuf {
        project.build_directory().map(Path::to_path_buf).unwrap_or_else(|| {
            project.build_directory_named(&self.configuration.build_folder_name())
        })
    }

    /// Record the build directory of a project after bootstrap.
    pub fn record_build_directory(
        &mut self,
        name: &str,
        path: PathBuf,
    ) -> Result<(), WorkspaceError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| WorkspaceError::UnknownProject {
                name: name.to_string(),
            })?;
        project.set_build_directory(path);
        Ok(())
    }

    /// The innermost project whose sources contain `path`.
    pub fn project_containing(&self, path: &Path) -> Option<&Project> {
        self.projects
            .iter()
            .filter(|p| path.starts_with(p.source_path()))
            .max_by_key(|p| p.source_path().components().count())
    }
}

/// Find the work tree root at or above `start`.
pub fn find_worktree(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(WORKTREE_MARKER).is_dir())
        .map(Path::to_path_buf)
}

/// Create the work tree marker in `path`. Idempotent.
pub fn init(path: &Path) -> Result<PathBuf> {
    let marker = path.join(WORKTREE_MARKER);
    crate::util::fs::mkdir(&marker.join("toolchains"), true)
        .with_context(|| format!("failed to initialize work tree in {}", path.display()))?;
    Ok(marker)
}

/// Manifests below `root`, in sorted walk order.
///
/// Hidden directories and build directories are not descended into.
fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !name.starts_with("build-")
        });

    let mut manifests = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if entry.file_type().is_file() && entry.file_name() == MANIFEST_NAME {
            manifests.push(entry.into_path());
        }
    }
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::WorkTreeBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_open_outside_worktree() {
        let tmp = TempDir::new().unwrap();
        let err = Workspace::open(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::NotAWorkTree { .. })
        ));
    }

    #[test]
    fn test_open_discovers_projects() {
        let tree = WorkTreeBuilder::new()
            .project("lib/world", "world", &[])
            .project("hello", "hello", &["world"])
            .build();

        let ws = Workspace::open(&tree.root().join("hello")).unwrap();
        assert_eq!(ws.root(), tree.root());

        let names: Vec<_> = ws.projects().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["hello", "world"]);
        assert_eq!(ws.get_project("hello").unwrap().dependencies(), ["world"]);
        assert_eq!(ws.buildable_projects().len(), 2);
    }

    #[test]
    fn test_open_is_idempotent() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &[])
            .build();

        let first = Workspace::open(tree.root()).unwrap();
        let second = Workspace::open(tree.root()).unwrap();
        assert_eq!(first.projects(), second.projects());

        let hello = second.get_project("hello").unwrap();
        let build_dir = second.build_directory_for(hello);
        assert_eq!(build_dir, first.build_directory_for(first.get_project("hello").unwrap()));
        assert!(!build_dir.exists());
        assert!(hello.build_directory().is_none());
    }

    #[test]
    fn test_skips_hidden_and_build_directories() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &[])
            .project("hello/build-linux64/copy", "copy", &[])
            .project(".hidden/other", "other", &[])
            .build();

        let ws = Workspace::open(tree.root()).unwrap();
        let names: Vec<_> = ws.projects().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["hello"]);
    }

    #[test]
    fn test_duplicate_project() {
        let tree = WorkTreeBuilder::new()
            .project("a/hello", "hello", &[])
            .project("b/hello", "hello", &[])
            .build();

        let err = Workspace::open(tree.root()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::DuplicateProject { name, .. }) if name == "hello"
        ));
    }

    #[test]
    fn test_unknown_project() {
        let ws = Workspace::new("/src", BuildConfiguration::default());
        assert!(matches!(
            ws.get_project("nope"),
            Err(WorkspaceError::UnknownProject { .. })
        ));
        assert!(matches!(
            ws.get_package("nope"),
            Err(WorkspaceError::UnknownPackage { .. })
        ));
    }

    #[test]
    fn test_toolchain_packages() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &["world"])
            .toolchain("linux64", Some("1.2"), &[("world", "packages/world")])
            .build();

        let ws = Workspace::open_with(tree.root(), BuildConfiguration::for_toolchain("linux64"))
            .unwrap();
        assert_eq!(ws.toolchain().unwrap().version(), Some("1.2"));
        assert_eq!(ws.get_package("world").unwrap().name(), "world");
    }

    #[test]
    fn test_missing_toolchain() {
        let tree = WorkTreeBuilder::new().build();
        let err = Workspace::open_with(tree.root(), BuildConfiguration::for_toolchain("nope"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::UnknownToolchain { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn test_existing_build_directory_is_recorded() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &[])
            .project("world", "world", &[])
            .build();
        std::fs::create_dir_all(tree.root().join("hello/build-linux64")).unwrap();

        let config = BuildConfiguration {
            name: Some("linux64".to_string()),
            toolchain: None,
            release: false,
        };
        let ws = Workspace::open_with(tree.root(), config).unwrap();
        assert!(ws.get_project("hello").unwrap().is_configured());
        assert!(!ws.get_project("world").unwrap().is_configured());
        assert_eq!(
            ws.build_directory_for(ws.get_project("world").unwrap()),
            tree.root().join("world/build-linux64")
        );
    }

    #[test]
    fn test_record_build_directory() {
        let mut ws = Workspace::new("/src", BuildConfiguration::default());
        ws.add_project(Project::new("hello", "/src/hello")).unwrap();

        ws.record_build_directory("hello", PathBuf::from("/src/hello/build-x"))
            .unwrap();
        assert_eq!(
            ws.get_project("hello").unwrap().build_directory(),
            Some(Path::new("/src/hello/build-x"))
        );
        assert!(ws.record_build_directory("nope", PathBuf::new()).is_err());
    }

    #[test]
    fn test_project_containing() {
        let mut ws = Workspace::new("/src", BuildConfiguration::default());
        ws.add_project(Project::new("outer", "/src/outer")).unwrap();
        ws.add_project(Project::new("inner", "/src/outer/inner")).unwrap();

        let found = ws.project_containing(Path::new("/src/outer/inner/src"));
        assert_eq!(found.map(|p| p.name()), Some("inner"));
        assert!(ws.project_containing(Path::new("/elsewhere")).is_none());
    }

    #[test]
    fn test_init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        init(tmp.path()).unwrap();
        init(tmp.path()).unwrap();
        assert_eq!(find_worktree(tmp.path()), Some(tmp.path().to_path_buf()));
    }
}
