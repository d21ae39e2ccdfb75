//! quay.toml manifest parsing and schema.
//!
//! Every source project of a work tree carries a `quay.toml` next to its
//! `CMakeLists.txt`. The manifest only names the project and lists what it
//! depends on; the build itself is described by CMake.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "quay.toml";

/// Build description that makes a project buildable.
pub const BUILD_DESCRIPTION: &str = "CMakeLists.txt";

/// The parsed quay.toml manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub project: ProjectMetadata,
}

/// The `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Project name, unique within a work tree
    pub name: String,

    /// Version used to name package archives
    #[serde(default)]
    pub version: Option<String>,

    /// Projects or packages needed at build time, in declaration order
    #[serde(default)]
    pub depends: Vec<String>,

    /// Minimum toolchain version required to package this project
    #[serde(default)]
    pub toolchain_version: Option<String>,
}

impl ProjectManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let manifest: ProjectManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let name = manifest.project.name.trim();
        if name.is_empty() {
            anyhow::bail!("manifest at {} has an empty project name", path.display());
        }
        if name.contains(char::is_whitespace) {
            anyhow::bail!(
                "invalid project name `{}` in {}: names cannot contain whitespace",
                name,
                path.display()
            );
        }

        if let Some(dup) = first_duplicate(&manifest.project.depends) {
            anyhow::bail!(
                "`{}` is listed twice in the dependencies of `{}`",
                dup,
                manifest.project.name
            );
        }

        Ok(manifest)
    }

    /// Project name.
    pub fn name(&self) -> &str {
        &self.project.name
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    names
        .iter()
        .enumerate()
        .find(|(i, name)| names[..*i].contains(name))
        .map(|(_, name)| name.as_str())
}

/// Generate the manifest written by `quay init --project`.
pub fn generate_manifest(name: &str, depends: &[String]) -> String {
    let depends = depends
        .iter()
        .map(|d| format!("\"{}\"", d))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"[project]
name = "{}"
version = "0.1.0"
depends = [{}]
"#,
        name, depends
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = ProjectManifest::parse(
            r#"
[project]
name = "hello"
version = "0.1.0"
depends = ["world", "zlib"]
toolchain_version = "1.10"
"#,
            Path::new("hello/quay.toml"),
        )
        .unwrap();

        assert_eq!(manifest.name(), "hello");
        assert_eq!(manifest.project.version.as_deref(), Some("0.1.0"));
        assert_eq!(manifest.project.depends, vec!["world", "zlib"]);
        assert_eq!(manifest.project.toolchain_version.as_deref(), Some("1.10"));
    }

    #[test]
    fn test_minimal_manifest() {
        let manifest =
            ProjectManifest::parse("[project]\nname = \"world\"\n", Path::new("quay.toml")).unwrap();
        assert!(manifest.project.depends.is_empty());
        assert!(manifest.project.version.is_none());
    }

    #[test]
    fn test_reject_empty_name() {
        let err = ProjectManifest::parse("[project]\nname = \"\"\n", Path::new("quay.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("empty project name"));
    }

    #[test]
    fn test_reject_duplicate_dependency() {
        let err = ProjectManifest::parse(
            "[project]\nname = \"hello\"\ndepends = [\"world\", \"world\"]\n",
            Path::new("quay.toml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_generated_manifest_parses() {
        let content = generate_manifest("hello", &["world".to_string()]);
        let manifest = ProjectManifest::parse(&content, Path::new("quay.toml")).unwrap();
        assert_eq!(manifest.name(), "hello");
        assert_eq!(manifest.project.depends, vec!["world"]);
    }
}
