//! Fingerprints for configure stamps.

use std::path::Path;

use sha2::{Digest, Sha256};

/// A hasher for building fingerprints from multiple components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Create a new fingerprint builder.
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component to the fingerprint.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Add a path component.
    pub fn update_path(&mut self, path: &Path) -> &mut Self {
        self.update_str(&path.to_string_lossy())
    }

    /// Add a list of paths, prefixed by its length so that
    /// `[a, b] + []` and `[a] + [b]` never collide.
    pub fn update_paths<'a>(&mut self, paths: impl IntoIterator<Item = &'a Path>) -> &mut Self {
        let paths: Vec<&Path> = paths.into_iter().collect();
        self.update_str(&paths.len().to_string());
        for path in paths {
            self.update_path(path);
        }
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
