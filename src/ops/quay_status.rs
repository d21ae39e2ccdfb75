//! Implementation of `quay status`.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

use crate::core::Workspace;

/// Build directories of one project.
#[derive(Debug, Clone)]
pub struct ProjectStatus {
    pub name: String,

    /// Source path relative to the work tree root
    pub path: PathBuf,

    pub build_dirs: Vec<BuildDirStatus>,
}

#[derive(Debug, Clone)]
pub struct BuildDirStatus {
    /// Directory name (`build-<configuration>`)
    pub name: String,

    /// Time since the directory was last modified
    pub age: Option<Duration>,
}

/// Status of every buildable project, in discovery order.
pub fn status(ws: &Workspace) -> Result<Vec<ProjectStatus>> {
    let now = SystemTime::now();

    let mut statuses = Vec::new();

    for project in ws.buildable_projects() {
        let path = pathdiff::diff_paths(project.source_path(), ws.root())
            .unwrap_or_else(|| project.source_path().to_path_buf());

        let mut build_dirs = Vec::new();
        for dir in build_directories(project.source_path())? {
            let age = std::fs::metadata(&dir)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            build_dirs.push(BuildDirStatus {
                name: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                age,
            });
        }

        statuses.push(ProjectStatus {
            name: project.name().to_string(),
            path,
            build_dirs,
        });
    }

    Ok(statuses)
}

/// Every `build-*` directory of a source tree, whatever its configuration.
pub fn build_directories(source_path: &Path) -> Result<Vec<PathBuf>> {
    let pattern = source_path.join("build-*");
    let pattern = pattern.to_string_lossy();
    let dirs = glob::glob(&pattern)
        .with_context(|| format!("invalid pattern: {}", pattern))?
        .filter_map(|p| p.ok())
        .filter(|p| p.is_dir())
        .collect();
    Ok(dirs)
}

/// `3 days, 4 hours`, `5 hours` or `12 minutes`.
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;

    if days > 0 {
        format!("{} days, {} hours", days, hours)
    } else if hours > 0 {
        format!("{} hours", hours)
    } else {
        format!("{} minutes", secs / 60)
    }
}

/// Render a status listing, build directory names aligned.
pub fn format_status(statuses: &[ProjectStatus]) -> String {
    let mut out = String::new();
    for status in statuses {
        out.push_str(&format!("{} ({})\n", status.name, status.path.display()));

        let width = status
            .build_dirs
            .iter()
            .map(|d| d.name.len())
            .max()
            .unwrap_or(0);
        for dir in &status.build_dirs {
            let age = dir.age.map(format_age).unwrap_or_else(|| "unknown".to_string());
            out.push_str(&format!("  {:width$}: ({})\n", dir.name, age, width = width));
        }
    }
    out
}
