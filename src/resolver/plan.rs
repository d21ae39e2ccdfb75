//! Build plans: the resolver's output.
//!
//! A plan is an ordered list of entries. Every entry comes after the entries
//! it depends on, so executing the plan front to back is always valid.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;

/// One step of a build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolutionEntry {
    /// Build a project from source, with these SDK directories visible.
    Build {
        project: String,
        source_path: PathBuf,
        build_directory: PathBuf,
        dependencies: Vec<String>,
        sdk_dirs: Vec<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        toolchain_version: Option<String>,
    },

    /// Use a prebuilt package as is.
    Package { package: String, path: PathBuf },
}

impl ResolutionEntry {
    /// Project or package name.
    pub fn name(&self) -> &str {
        match self {
            ResolutionEntry::Build { project, .. } => project,
            ResolutionEntry::Package { package, .. } => package,
        }
    }

    pub fn is_build(&self) -> bool {
        matches!(self, ResolutionEntry::Build { .. })
    }

    /// SDK directories of a build entry (empty for packages).
    pub fn sdk_dirs(&self) -> &[PathBuf] {
        match self {
            ResolutionEntry::Build { sdk_dirs, .. } => sdk_dirs,
            ResolutionEntry::Package { .. } => &[],
        }
    }

    /// Declared dependencies of a build entry (empty for packages).
    pub fn dependencies(&self) -> &[String] {
        match self {
            ResolutionEntry::Build { dependencies, .. } => dependencies,
            ResolutionEntry::Package { .. } => &[],
        }
    }

    /// Directory other entries see this entry through.
    pub fn sdk_dir(&self) -> PathBuf {
        match self {
            ResolutionEntry::Build {
                build_directory, ..
            } => build_directory.join("sdk"),
            ResolutionEntry::Package { path, .. } => path.clone(),
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            ResolutionEntry::Build { version, .. } => version.as_deref(),
            ResolutionEntry::Package { .. } => None,
        }
    }

    /// Minimum toolchain version a build entry needs to be packaged.
    pub fn toolchain_version(&self) -> Option<&str> {
        match self {
            ResolutionEntry::Build {
                toolchain_version, ..
            } => toolchain_version.as_deref(),
            ResolutionEntry::Package { .. } => None,
        }
    }

    pub fn build_directory(&self) -> Option<&Path> {
        match self {
            ResolutionEntry::Build {
                build_directory, ..
            } => Some(build_directory),
            ResolutionEntry::Package { .. } => None,
        }
    }
}

/// Dependency graph of named items.
///
/// Node weights are the items' positions in the input. Edges point from a
/// dependent to its dependency; dependencies outside the input are ignored.
pub(crate) fn dependency_graph<'a>(
    items: impl Iterator<Item = (&'a str, &'a [String])> + Clone,
) -> (DiGraph<usize, ()>, HashMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for (idx, (name, _)) in items.clone().enumerate() {
        let node = graph.add_node(idx);
        nodes.insert(name.to_string(), node);
    }

    for (name, deps) in items {
        let from = nodes[name];
        for dep in deps {
            if let Some(&to) = nodes.get(dep.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    (graph, nodes)
}

/// Ordered, precedence-resolved list of entries.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Names as requested, before expansion
    requested: Vec<String>,

    entries: Vec<ResolutionEntry>,

    /// Edges point from a dependent to its dependency
    #[serde(skip)]
    graph: DiGraph<usize, ()>,

    #[serde(skip)]
    nodes: HashMap<String, NodeIndex>,
}

impl BuildPlan {
    /// Build a plan from entries already in dependency order.
    pub fn new(requested: Vec<String>, entries: Vec<ResolutionEntry>) -> Self {
        let (graph, nodes) = dependency_graph(entries.iter().map(|e| (e.name(), e.dependencies())));

        BuildPlan {
            requested,
            entries,
            graph,
            nodes,
        }
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// All entries, dependencies first.
    pub fn entries(&self) -> &[ResolutionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ResolutionEntry> {
        self.nodes.get(name).map(|&node| &self.entries[self.graph[node]])
    }

    /// Entries built from source, in build order.
    pub fn source_entries(&self) -> impl Iterator<Item = &ResolutionEntry> {
        self.entries.iter().filter(|e| e.is_build())
    }

    /// Entries satisfied by prebuilt packages.
    pub fn package_entries(&self) -> impl Iterator<Item = &ResolutionEntry> {
        self.entries.iter().filter(|e| !e.is_build())
    }

    /// Names of the direct dependencies of `name` present in the plan.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Every entry that depends on `name`, directly or transitively, in
    /// plan order.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        let Some(&start) = self.nodes.get(name) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for next in self.graph.neighbors_directed(node, Direction::Incoming) {
                if seen.insert(self.graph[next]) {
                    stack.push(next);
                }
            }
        }

        let mut indices: Vec<usize> = seen.into_iter().collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .map(|idx| self.entries[idx].name())
            .collect()
    }

    /// Build entries grouped by dependency depth.
    ///
    /// Entries of one level only depend on entries of earlier levels, so
    /// each level can run concurrently once the previous ones completed.
    /// Indices refer to [`BuildPlan::entries`].
    pub fn levels(&self) -> Vec<Vec<usize>> {
        let mut depth = vec![0usize; self.entries.len()];
        let mut levels: Vec<Vec<usize>> = Vec::new();

        for (idx, entry) in self.entries.iter().enumerate() {
            if !entry.is_build() {
                continue;
            }
            let node = self.nodes[entry.name()];
            let level = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|dep| self.graph[dep])
                .filter(|&dep| self.entries[dep].is_build())
                .map(|dep| depth[dep] + 1)
                .max()
                .unwrap_or(0);
            depth[idx] = level;

            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(idx);
        }

        levels
    }

    /// Serialize the plan as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut indices: Vec<usize> = self
            .graph
            .neighbors_directed(node, dir)
            .map(|n| self.graph[n])
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
            .into_iter()
            .map(|idx| self.entries[idx].name())
            .collect()
    }
}
