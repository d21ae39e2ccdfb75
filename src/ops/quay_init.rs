//! Implementation of `quay init`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::manifest::{generate_manifest, MANIFEST_NAME};
use crate::core::workspace::{self, find_worktree};

/// Create a work tree at `path`.
///
/// Initializing inside an existing work tree is refused, re-initializing
/// its root is a no-op.
pub fn init_worktree(path: &Path) -> Result<PathBuf> {
    if let Some(existing) = find_worktree(path) {
        if existing != path {
            bail!(
                "{} is already inside the work tree {}",
                path.display(),
                existing.display()
            );
        }
    }

    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    workspace::init(path)
}

/// Write a `quay.toml` for a new project in `dir`.
pub fn init_project(dir: &Path, name: &str, depends: &[String]) -> Result<PathBuf> {
    let manifest_path = dir.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, dir.display());
    }

    crate::util::fs::write_string(&manifest_path, &generate_manifest(name, depends))?;
    Ok(manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProjectManifest;
    use tempfile::TempDir;

    #[test]
    fn test_init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let marker = init_worktree(tmp.path()).unwrap();
        assert!(marker.join("toolchains").is_dir());
        assert_eq!(init_worktree(tmp.path()).unwrap(), marker);
    }

    #[test]
    fn test_init_inside_worktree_fails() {
        let tmp = TempDir::new().unwrap();
        init_worktree(tmp.path()).unwrap();
        assert!(init_worktree(&tmp.path().join("sub")).is_err());
    }

    #[test]
    fn test_init_project() {
        let tmp = TempDir::new().unwrap();
        let path = init_project(tmp.path(), "hello", &["world".to_string()]).unwrap();
        let manifest = ProjectManifest::load(&path).unwrap();
        assert_eq!(manifest.name(), "hello");
        assert_eq!(manifest.project.depends, vec!["world"]);
        assert!(init_project(tmp.path(), "hello", &[]).is_err());
    }
}
