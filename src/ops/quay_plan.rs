//! Implementation of `quay plan`.

use anyhow::Result;

use crate::core::Workspace;
use crate::resolver::{resolve, BuildPlan};

/// Resolve `names` into a plan.
///
/// With `single`, only the requested names are kept: their dependencies must
/// already be built, but their SDK directories are still computed.
pub fn resolve_plan(ws: &Workspace, names: &[String], single: bool) -> Result<BuildPlan> {
    let plan = resolve(names, ws)?;
    if !single {
        return Ok(plan);
    }

    let entries = plan
        .entries()
        .iter()
        .filter(|e| names.iter().any(|n| n == e.name()))
        .cloned()
        .collect();
    Ok(BuildPlan::new(plan.requested().to_vec(), entries))
}

/// Human-readable listing of a plan.
pub fn format_plan(plan: &BuildPlan) -> String {
    let mut out = String::new();

    out.push_str("projects wanted:\n");
    for name in plan.requested() {
        out.push_str(&format!("  - {}\n", name));
    }

    out.push_str("binary packages:\n");
    for entry in plan.package_entries() {
        out.push_str(&format!("  - {} ({})\n", entry.name(), entry.sdk_dir().display()));
    }

    out.push_str("source projects:\n");
    for entry in plan.source_entries() {
        out.push_str(&format!("  - {}\n", entry.name()));
        for dir in entry.sdk_dirs() {
            out.push_str(&format!("      sdk: {}\n", dir.display()));
        }
    }

    out
}
