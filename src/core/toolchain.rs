//! Toolchains: named bundles of prebuilt packages.
//!
//! Toolchains live in `<work tree>/.quay/toolchains/<name>.toml`:
//!
//! ```toml
//! [toolchain]
//! name = "linux64"
//! version = "1.12.3"
//!
//! [[package]]
//! name = "world"
//! path = "packages/world"
//! ```
//!
//! Relative package paths resolve against the directory of the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::Package;

/// A named set of packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    name: String,
    version: Option<String>,
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct RawToolchainFile {
    toolchain: RawToolchain,
    #[serde(default, rename = "package")]
    packages: Vec<RawPackage>,
}

#[derive(Debug, Deserialize)]
struct RawToolchain {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    path: PathBuf,
    #[serde(default)]
    version: Option<String>,
}

impl Toolchain {
    pub fn new(name: impl Into<String>) -> Self {
        Toolchain {
            name: name.into(),
            version: None,
            packages: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Append a package; a later package with the same name replaces the earlier one.
    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.retain(|p| p.name() != package.name());
        self.packages.push(package);
        self
    }

    /// Load a toolchain file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain file: {}", path.display()))?;
        let raw: RawToolchainFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse toolchain file: {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new("."));
        let mut toolchain = Toolchain::new(raw.toolchain.name);
        toolchain.version = raw.toolchain.version;

        for pkg in raw.packages {
            let pkg_path = if pkg.path.is_absolute() {
                pkg.path
            } else {
                base.join(pkg.path)
            };
            let mut package = Package::new(pkg.name, pkg_path);
            if let Some(version) = pkg.version {
                package = package.with_version(version);
            }
            toolchain = toolchain.with_package(package);
        }

        Ok(toolchain)
    }

    /// Location of a toolchain file inside a work tree marker directory.
    pub fn file_path(marker_dir: &Path, name: &str) -> PathBuf {
        marker_dir.join("toolchains").join(format!("{}.toml", name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Packages in declaration order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }
}
