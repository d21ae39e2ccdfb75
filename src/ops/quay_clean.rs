//! Implementation of `quay clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::Workspace;
use crate::ops::quay_plan::resolve_plan;
use crate::ops::quay_status::build_directories;
use crate::util::fs;

/// Options for `quay clean`.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Projects to clean (already selected)
    pub projects: Vec<String>,

    /// Do not clean dependencies
    pub single: bool,

    /// Every `build-*` directory, not only the current configuration's
    pub all: bool,

    /// Actually remove; otherwise only report
    pub force: bool,
}

/// Build directories of the selected projects and their source
/// dependencies.
///
/// Returns the directories removed, or the ones that would be without
/// `force`. Prebuilt packages are never touched.
pub fn clean(ws: &Workspace, opts: &CleanOptions) -> Result<Vec<PathBuf>> {
    let plan = resolve_plan(ws, &opts.projects, opts.single)?;

    let mut dirs = Vec::new();
    for entry in plan.source_entries() {
        let project = ws.get_project(entry.name())?;
        if opts.all {
            dirs.extend(build_directories(project.source_path())?);
        } else {
            let dir = ws.build_directory_for(project);
            if dir.is_dir() {
                dirs.push(dir);
            }
        }
    }

    if opts.force {
        for dir in &dirs {
            tracing::info!("Removing {}", dir.display());
            fs::remove(dir)?;
        }
    }

    Ok(dirs)
}
