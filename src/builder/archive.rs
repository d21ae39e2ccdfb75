//! Package archives.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::util::fs::ensure_dir;

/// Write `src_dir` into a `.tar.gz` archive, under a top-level `prefix`
/// directory. Symlinks are stored as symlinks.
pub fn create_tar_gz(src_dir: &Path, archive: &Path, prefix: &str) -> Result<()> {
    if let Some(parent) = archive.parent() {
        ensure_dir(parent)?;
    }

    let file = File::create(archive)
        .with_context(|| format!("failed to create archive: {}", archive.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());

    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder
        .append_dir_all(prefix, src_dir)
        .with_context(|| format!("failed to archive {}", src_dir.display()))?;

    let encoder = builder
        .into_inner()
        .with_context(|| format!("failed to finish archive: {}", archive.display()))?;
    encoder
        .finish()
        .with_context(|| format!("failed to compress archive: {}", archive.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    #[test]
    fn test_archive_has_prefix() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("stage");
        std::fs::create_dir_all(src.join("lib")).unwrap();
        std::fs::write(src.join("lib/libhello.so"), "elf").unwrap();
        std::fs::write(src.join("README"), "hello").unwrap();

        let archive = tmp.path().join("out/hello-0.1.tar.gz");
        create_tar_gz(&src, &archive, "hello-0.1").unwrap();

        let mut tar = tar::Archive::new(GzDecoder::new(File::open(&archive).unwrap()));
        let mut names: Vec<String> = tar
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().trim_end_matches('/').to_string())
            .collect();
        names.sort();

        assert!(names.contains(&"hello-0.1/README".to_string()));
        assert!(names.contains(&"hello-0.1/lib/libhello.so".to_string()));
    }
}
