//! Dependency scaffolding written into each build directory.
//!
//! Bootstrapping a project creates its build directory and writes
//! `quay-dependencies.cmake`, an initial-cache script that points CMake at
//! the SDK directories of the project's dependencies. Configure preloads it
//! with `cmake -C`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::cmake::cmake_path;
use crate::util::fs::{ensure_dir, write_string};

/// Name of the scaffolding file inside a build directory.
pub const DEPENDENCIES_FILE: &str = "quay-dependencies.cmake";

/// Render the scaffolding for a project.
pub fn dependencies_file_contents(project: &str, build_dir: &Path, sdk_dirs: &[PathBuf]) -> String {
    let prefix_path = sdk_dirs
        .iter()
        .map(|p| cmake_path(p))
        .collect::<Vec<_>>()
        .join(";");

    let mut out = String::new();
    out.push_str(&format!("# Dependencies of {}, generated by quay.\n", project));
    out.push_str("# Do not edit: this file is rewritten by `quay configure`.\n");
    out.push_str(&format!(
        "set(QUAY_SDK_DIR \"{}\" CACHE PATH \"\" FORCE)\n",
        cmake_path(&build_dir.join("sdk"))
    ));
    out.push_str(&format!(
        "set(CMAKE_PREFIX_PATH \"{}\" CACHE STRING \"\" FORCE)\n",
        prefix_path
    ));
    out.push_str(&format!(
        "set(CMAKE_FIND_ROOT_PATH \"{}\" CACHE STRING \"\" FORCE)\n",
        prefix_path
    ));
    out
}

/// Create the build directory and its scaffolding.
///
/// Returns `true` when the scaffolding changed. Running it twice with the
/// same inputs leaves the build directory untouched.
pub fn bootstrap(project: &str, build_dir: &Path, sdk_dirs: &[PathBuf]) -> Result<bool> {
    ensure_dir(&build_dir.join("sdk"))?;

    let path = build_dir.join(DEPENDENCIES_FILE);
    let contents = dependencies_file_contents(project, build_dir, sdk_dirs);

    if std::fs::read_to_string(&path).ok().as_deref() == Some(contents.as_str()) {
        tracing::debug!("{}: scaffolding up to date", project);
        return Ok(false);
    }

    write_string(&path, &contents)?;
    Ok(true)
}
