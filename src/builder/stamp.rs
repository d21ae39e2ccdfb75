//! Configure stamps.
//!
//! A successful configure leaves a stamp in the build directory recording
//! what it was configured with. The stamp is removed before every configure,
//! so a failed configure leaves none. The build stage refuses to run without
//! one, and when the SDK directories or the build type changed since.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::{remove, write_string};
use crate::util::hash::Fingerprint;

/// Stamp file name inside a build directory.
pub const CONFIGURE_STAMP: &str = ".quay-configure.toml";

/// Inputs of the last successful configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureStamp {
    /// Fingerprint of the SDK directories
    pub sdk_dirs: String,

    pub release: bool,
}

impl ConfigureStamp {
    pub fn new(sdk_dirs: &[PathBuf], release: bool) -> Self {
        ConfigureStamp {
            sdk_dirs: fingerprint_sdk_dirs(sdk_dirs),
            release,
        }
    }

    pub fn path(build_dir: &Path) -> PathBuf {
        build_dir.join(CONFIGURE_STAMP)
    }

    /// Load the stamp of a build directory, if it was ever configured.
    pub fn load(build_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(build_dir);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let stamp = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(stamp))
    }

    pub fn save(&self, build_dir: &Path) -> Result<()> {
        let content = toml::to_string(self).context("failed to serialize configure stamp")?;
        write_string(&Self::path(build_dir), &content)
    }

    /// Forget the last configure of a build directory.
    pub fn clear(build_dir: &Path) -> Result<()> {
        remove(&Self::path(build_dir))
    }

    /// Whether the stamp was written for these SDK directories.
    pub fn matches_sdk_dirs(&self, sdk_dirs: &[PathBuf]) -> bool {
        self.sdk_dirs == fingerprint_sdk_dirs(sdk_dirs)
    }
}

fn fingerprint_sdk_dirs(sdk_dirs: &[PathBuf]) -> String {
    let mut fp = Fingerprint::new();
    fp.update_paths(sdk_dirs.iter().map(PathBuf::as_path));
    fp.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_stamp() {
        let tmp = TempDir::new().unwrap();
        assert!(ConfigureStamp::load(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let sdk_dirs = vec![PathBuf::from("/pkg/world")];
        let stamp = ConfigureStamp::new(&sdk_dirs, false);
        stamp.save(tmp.path()).unwrap();

        let loaded = ConfigureStamp::load(tmp.path()).unwrap().unwrap();
        assert_eq!(loaded, stamp);
        assert!(loaded.matches_sdk_dirs(&sdk_dirs));
        assert!(!loaded.matches_sdk_dirs(&[PathBuf::from("/src/world/build-x/sdk")]));
        assert!(!loaded.matches_sdk_dirs(&[]));
    }

    #[test]
    fn test_clear() {
        let tmp = TempDir::new().unwrap();
        ConfigureStamp::new(&[], true).save(tmp.path()).unwrap();

        ConfigureStamp::clear(tmp.path()).unwrap();
        assert!(ConfigureStamp::load(tmp.path()).unwrap().is_none());

        // Clearing twice is fine
        ConfigureStamp::clear(tmp.path()).unwrap();
    }
}
