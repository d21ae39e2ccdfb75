//! Build configurations.
//!
//! A build configuration names the build directories of every project in a
//! work tree. Two projects built with the same configuration share the same
//! folder name, so their SDK directories can be found from each other.

use serde::{Deserialize, Serialize};

/// The active build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Explicit configuration name
    pub name: Option<String>,

    /// Toolchain providing prebuilt packages
    pub toolchain: Option<String>,

    /// Release mode
    pub release: bool,
}

impl BuildConfiguration {
    /// Configuration bound to a toolchain.
    pub fn for_toolchain(toolchain: impl Into<String>) -> Self {
        BuildConfiguration {
            name: None,
            toolchain: Some(toolchain.into()),
            release: false,
        }
    }

    /// Switch to release mode.
    pub fn with_release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Name of the build folders for this configuration.
    ///
    /// Falls back from the explicit name to the toolchain name, then to a
    /// name describing the host system.
    pub fn build_folder_name(&self) -> String {
        let base = self
            .name
            .clone()
            .or_else(|| self.toolchain.clone())
            .unwrap_or_else(host_configuration_name);

        if self.release {
            format!("{}-release", base)
        } else {
            base
        }
    }
}

/// Configuration name used when neither a name nor a toolchain is set.
pub fn host_configuration_name() -> String {
    format!(
        "sys-{}-{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
