//! Dependency resolution.
//!
//! Expands requested names into a build plan: the transitive closure of
//! their dependencies, each name resolved either to a source project or to
//! a prebuilt package, ordered so that every project is built after the
//! projects it depends on.
//!
//! A name provided both by a project and by a toolchain package resolves to
//! the package, unless the name is one of the workspace's active projects.
//!
//! The resolver is pure: it reads the workspace and never touches disk.

pub mod errors;
pub mod plan;
pub mod version;

pub use errors::ResolveError;
pub use plan::{BuildPlan, ResolutionEntry};

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::path::PathBuf;

use petgraph::graph::NodeIndex;
use petgraph::Direction;

use crate::core::{Package, Project, Workspace};

/// What a name resolves to in a workspace.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Project(&'a Project),
    Package(&'a Package),
}

/// Resolve a single name with package precedence.
pub fn classify<'a>(name: &str, ws: &'a Workspace) -> Option<Resolved<'a>> {
    if !ws.is_active(name) {
        if let Some(package) = ws.find_package(name) {
            return Some(Resolved::Package(package));
        }
    }
    ws.find_project(name).map(Resolved::Project)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolve `requested` names into an ordered build plan.
pub fn resolve<S: AsRef<str>>(requested: &[S], ws: &Workspace) -> Result<BuildPlan, ResolveError> {
    let requested: Vec<String> = requested.iter().map(|s| s.as_ref().to_string()).collect();

    for name in &requested {
        if classify(name, ws).is_none() {
            return Err(unknown_name(name, ws));
        }
    }

    let closure = dependency_closure(&requested, ws)?;

    let mut packages = Vec::new();
    let mut projects = Vec::new();
    for name in &closure {
        match classify(name, ws) {
            Some(Resolved::Package(p)) => packages.push(p),
            Some(Resolved::Project(p)) => projects.push(p),
            None => return Err(unknown_name(name, ws)),
        }
    }

    // toolchain order for packages keeps plans stable across requests
    packages.sort_by_key(|p| ws.packages().iter().position(|q| q.name() == p.name()));

    let mut entries: Vec<ResolutionEntry> = packages
        .into_iter()
        .map(|p| ResolutionEntry::Package {
            package: p.name().to_string(),
            path: p.sdk_dir().to_path_buf(),
        })
        .collect();

    for project in topological_order(&projects, ws) {
        entries.push(ResolutionEntry::Build {
            project: project.name().to_string(),
            source_path: project.source_path().to_path_buf(),
            build_directory: ws.build_directory_for(project),
            dependencies: project.dependencies().to_vec(),
            sdk_dirs: get_sdk_dirs(project, ws)?,
            version: project.version().map(str::to_string),
            toolchain_version: project.toolchain_version().map(str::to_string),
        });
    }

    tracing::debug!(
        "resolved {} into {} entries",
        requested.join(", "),
        entries.len()
    );

    Ok(BuildPlan::new(requested, entries))
}

/// Split `names` into source projects and prebuilt packages, applying the
/// package precedence rule.
pub fn split_sources_and_binaries<'a, S: AsRef<str>>(
    names: &[S],
    ws: &'a Workspace,
) -> Result<(Vec<&'a Project>, Vec<&'a Package>), ResolveError> {
    let mut sources = Vec::new();
    let mut binaries = Vec::new();

    for name in names {
        match classify(name.as_ref(), ws) {
            Some(Resolved::Project(p)) => sources.push(p),
            Some(Resolved::Package(p)) => binaries.push(p),
            None => return Err(unknown_name(name.as_ref(), ws)),
        }
    }

    Ok((sources, binaries))
}

/// SDK directories `project` needs to see, closest dependency first.
///
/// Dependencies are walked depth-first in declaration order. A project
/// contributes `<build dir>/sdk`, a package its own root. The first
/// occurrence of a directory wins.
pub fn get_sdk_dirs(project: &Project, ws: &Workspace) -> Result<Vec<PathBuf>, ResolveError> {
    let mut dirs = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(project.name().to_string());
    collect_sdk_dirs(project, ws, &mut visited, &mut dirs)?;
    Ok(dirs)
}

fn collect_sdk_dirs(
    project: &Project,
    ws: &Workspace,
    visited: &mut HashSet<String>,
    dirs: &mut Vec<PathBuf>,
) -> Result<(), ResolveError> {
    for dep in project.dependencies() {
        if !visited.insert(dep.clone()) {
            continue;
        }
        match classify(dep, ws) {
            Some(Resolved::Package(package)) => {
                push_unique(dirs, package.sdk_dir().to_path_buf());
            }
            Some(Resolved::Project(dep_project)) => {
                push_unique(dirs, ws.build_directory_for(dep_project).join("sdk"));
                collect_sdk_dirs(dep_project, ws, visited, dirs)?;
            }
            None => {
                return Err(ResolveError::UnresolvedDependency {
                    dependent: project.name().to_string(),
                    name: dep.clone(),
                })
            }
        }
    }
    Ok(())
}

fn push_unique(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if !dirs.contains(&dir) {
        dirs.push(dir);
    }
}

/// Transitive closure of `requested`, in discovery order of the walk.
///
/// Packages end the walk: their own dependencies are not part of the plan.
fn dependency_closure(requested: &[String], ws: &Workspace) -> Result<Vec<String>, ResolveError> {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut order = Vec::new();

    for name in requested {
        visit(name, ws, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
}

fn visit(
    name: &str,
    ws: &Workspace,
    marks: &mut HashMap<String, Mark>,
    stack: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<(), ResolveError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            let start = stack.iter().position(|n| n == name).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ResolveError::CyclicDependency { cycle });
        }
        None => {}
    }

    order.push(name.to_string());

    let project = match classify(name, ws) {
        Some(Resolved::Project(project)) => project,
        _ => {
            marks.insert(name.to_string(), Mark::Done);
            return Ok(());
        }
    };

    marks.insert(name.to_string(), Mark::InProgress);
    stack.push(name.to_string());

    for dep in project.dependencies() {
        if classify(dep, ws).is_none() {
            return Err(ResolveError::UnresolvedDependency {
                dependent: name.to_string(),
                name: dep.clone(),
            });
        }
        visit(dep, ws, marks, stack, order)?;
    }

    stack.pop();
    marks.insert(name.to_string(), Mark::Done);
    Ok(())
}

/// Order `projects` so that dependencies come first. Among projects whose
/// dependencies are all placed, the one discovered first in the work tree
/// goes first.
fn topological_order<'a>(projects: &[&'a Project], ws: &Workspace) -> Vec<&'a Project> {
    let (graph, _) = plan::dependency_graph(projects.iter().map(|p| (p.name(), p.dependencies())));

    let mut pending: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Outgoing).count())
        .collect();

    let rank = |node: NodeIndex| {
        let i = graph[node];
        (ws.discovery_index(projects[i].name()).unwrap_or(usize::MAX), i)
    };

    let mut ready: BinaryHeap<Reverse<((usize, usize), NodeIndex)>> = graph
        .node_indices()
        .filter(|node| pending[node.index()] == 0)
        .map(|node| Reverse((rank(node), node)))
        .collect();

    let mut order = Vec::with_capacity(projects.len());
    while let Some(Reverse((_, node))) = ready.pop() {
        order.push(projects[graph[node]]);
        for dependent in graph.neighbors_directed(node, Direction::Incoming) {
            pending[dependent.index()] -= 1;
            if pending[dependent.index()] == 0 {
                ready.push(Reverse((rank(dependent), dependent)));
            }
        }
    }

    order
}

/// Error for a name that resolves to nothing.
///
/// A work tree with a toolchain bound and no source projects can only
/// satisfy requests with packages, so the name is reported as a missing
/// package there, unless it was explicitly asked to be built from source.
fn unknown_name(name: &str, ws: &Workspace) -> ResolveError {
    if ws.toolchain().is_some() && ws.projects().is_empty() && !ws.is_active(name) {
        ResolveError::UnknownPackage {
            name: name.to_string(),
        }
    } else {
        ResolveError::UnknownProject {
            name: name.to_string(),
        }
    }
}
