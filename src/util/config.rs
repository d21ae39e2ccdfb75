//! Configuration file support for Quay.
//!
//! Quay reads two configuration files:
//! - Global: `<config dir>/quay/config.toml` - User-wide defaults
//! - Work tree: `.quay/config.toml` - Work-tree-specific overrides
//!
//! Work-tree config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::BuildConfiguration;
use crate::sources::RemoteConfig;

/// Quay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Credentials for remote servers, keyed by host name
    pub servers: HashMap<String, ServerAccess>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Name of the build configuration (names the build directories)
    pub config: Option<String>,

    /// Toolchain providing prebuilt packages
    pub toolchain: Option<String>,

    /// Build in release mode
    pub release: bool,

    /// Extra flags passed to every CMake configure
    pub cmake_flags: Vec<String>,

    /// Number of projects built concurrently (None = one at a time)
    pub jobs: Option<usize>,
}

/// Access information for a remote server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerAccess {
    pub username: Option<String>,
    pub password: Option<String>,

    /// Directory to change into after logging in (FTP only)
    pub root: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.config.is_some() {
            self.build.config = other.build.config;
        }
        if other.build.toolchain.is_some() {
            self.build.toolchain = other.build.toolchain;
        }
        if other.build.release {
            self.build.release = true;
        }
        if !other.build.cmake_flags.is_empty() {
            self.build.cmake_flags = other.build.cmake_flags;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }

        // Per-server entries replace each other wholesale
        self.servers.extend(other.servers);
    }

    /// The build configuration selected by this config.
    pub fn build_configuration(&self) -> BuildConfiguration {
        BuildConfiguration {
            name: self.build.config.clone(),
            toolchain: self.build.toolchain.clone(),
            release: self.build.release,
        }
    }

    /// Server credentials, for the remote fetch collaborator.
    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig::new(self.servers.clone())
    }
}

/// Load merged configuration from global and work-tree locations.
///
/// Order of precedence (highest to lowest):
/// 1. Work-tree config (.quay/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, worktree_path: Option<&Path>) -> Config {
    let mut config = Config::default();

    for path in [global_path, worktree_path].into_iter().flatten() {
        if path.exists() {
            config.merge(Config::load_or_default(path));
        }
    }

    config
}

/// Get the global quay config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "quay", "quay").map(|d| d.config_dir().to_path_buf())
}

/// Get the global config path.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.build.config.is_none());
        assert!(config.build.toolchain.is_none());
        assert!(!config.build.release);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
config = "linux64-gcc"
toolchain = "linux64"
cmake_flags = ["-DWITH_TESTS=OFF"]
jobs = 4

[servers."ftp.example.com"]
username = "john"
password = "secret"
root = "/pub"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.config.as_deref(), Some("linux64-gcc"));
        assert_eq!(config.build.toolchain.as_deref(), Some("linux64"));
        assert_eq!(config.build.cmake_flags, vec!["-DWITH_TESTS=OFF"]);
        assert_eq!(config.build.jobs, Some(4));

        let access = &config.servers["ftp.example.com"];
        assert_eq!(access.username.as_deref(), Some("john"));
        assert_eq!(access.root.as_deref(), Some("/pub"));
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let worktree_path = tmp.path().join("worktree.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
toolchain = "linux32"
jobs = 2
"#,
        )
        .unwrap();

        std::fs::write(
            &worktree_path,
            r#"
[build]
toolchain = "linux64"
"#,
        )
        .unwrap();

        let config = load_config(Some(global_path.as_path()), Some(worktree_path.as_path()));
        assert_eq!(config.build.toolchain.as_deref(), Some("linux64"));
        assert_eq!(config.build.jobs, Some(2));
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build\nthis is not toml").unwrap();

        let config = Config::load_or_default(&path);
        assert!(config.build.toolchain.is_none());
    }

    #[test]
    fn test_build_configuration_from_config() {
        let mut config = Config::default();
        config.build.toolchain = Some("linux64".to_string());
        config.build.release = true;

        let bc = config.build_configuration();
        assert_eq!(bc.build_folder_name(), "linux64-release");
    }
}
