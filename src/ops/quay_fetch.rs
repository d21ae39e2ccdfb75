//! Implementation of `quay fetch`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::sources::{download, RemoteConfig, Transfer};

/// Options for `quay fetch`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub url: String,

    /// Directory receiving the file
    pub output_dir: PathBuf,

    /// File name (defaults to the last segment of the URL)
    pub name: Option<String>,

    /// Keep an existing file instead of downloading again
    pub no_clobber: bool,
}

/// Download one file, reporting progress through `progress`.
pub fn fetch(
    opts: &FetchOptions,
    remote: &RemoteConfig,
    progress: &mut dyn FnMut(&Transfer),
) -> Result<PathBuf> {
    tracing::info!("Fetching {}", opts.url);
    let path = download(
        &opts.url,
        &opts.output_dir,
        opts.name.as_deref(),
        !opts.no_clobber,
        remote,
        progress,
    )?;
    tracing::info!("Saved {}", display_relative(&path, &opts.output_dir));
    Ok(path)
}

fn display_relative(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
