//! Filesystem utilities.
//!
//! `install` is the workhorse of the install and package stages: it mirrors
//! a tree into a destination, keeping symlinks as symlinks, overwriting
//! whatever is already there and creating missing directories. Which files
//! get copied is decided by an [`InstallFilter`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// Decides whether a path, relative to the install source, is installed.
pub trait InstallFilter {
    fn include(&self, relative: &Path) -> bool;
}

impl<F> InstallFilter for F
where
    F: Fn(&Path) -> bool,
{
    fn include(&self, relative: &Path) -> bool {
        self(relative)
    }
}

/// Installs everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFiles;

impl InstallFilter for AllFiles {
    fn include(&self, _relative: &Path) -> bool {
        true
    }
}

/// Operating system family used to pick runtime file extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    MacOs,
    Windows,
}

impl TargetOs {
    /// The OS this binary was compiled for.
    pub fn host() -> Self {
        if cfg!(windows) {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else {
            TargetOs::Linux
        }
    }

    fn shared_lib_ext(&self) -> &'static str {
        match self {
            TargetOs::Linux => ".so",
            TargetOs::MacOs => ".dylib",
            TargetOs::Windows => ".dll",
        }
    }
}

/// Selects the runtime part of an installed tree.
///
/// Executables, shared libraries, python modules and `share/` data are kept.
/// Headers, static libraries, CMake config files and man pages are dropped.
/// Anything the rules do not mention is kept.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeFilter {
    os: TargetOs,
}

impl RuntimeFilter {
    /// Create a filter for the given OS.
    pub fn new(os: TargetOs) -> Self {
        RuntimeFilter { os }
    }

    /// Create a filter for the host OS.
    pub fn for_host() -> Self {
        Self::new(TargetOs::host())
    }
}

impl Default for RuntimeFilter {
    fn default() -> Self {
        Self::for_host()
    }
}

impl InstallFilter for RuntimeFilter {
    fn include(&self, relative: &Path) -> bool {
        let mut components = relative.components();
        let first = match components.next() {
            Some(c) => c.as_os_str().to_string_lossy().into_owned(),
            None => return true,
        };
        let second = components
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned());
        let rel = relative.to_string_lossy();
        let basename = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match first.as_str() {
            "bin" => {
                if self.os == TargetOs::Windows {
                    basename.ends_with(".exe") || basename.ends_with(".dll")
                } else {
                    true
                }
            }
            "lib" => {
                if rel.contains("python") && basename.ends_with("Makefile") {
                    return true;
                }
                basename.contains(self.os.shared_lib_ext())
                    || basename.ends_with(".py")
                    || basename.ends_with(".pyd")
            }
            "share" => !matches!(second.as_deref(), Some("cmake") | Some("man")),
            "include" => basename == "pyconfig.h",
            _ => true,
        }
    }
}

/// Create a directory. Does not fail if it already exists.
pub fn mkdir(path: &Path, recursive: bool) -> Result<()> {
    let result = if recursive {
        fs::create_dir_all(path)
    } else {
        fs::create_dir(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to create directory: {}", path.display()))
        }
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    mkdir(path, true)
}

/// Remove a file, symlink or directory tree.
///
/// Missing paths are fine, and so are read-only entries: permissions are
/// relaxed before removal.
pub fn remove(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to stat {}", path.display()));
        }
    };

    if metadata.is_dir() {
        tracing::debug!("Removing directory: {}", path.display());
        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            if entry.path_is_symlink() {
                continue;
            }
            make_writable(entry.path())?;
        }
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    } else {
        tracing::debug!("Removing {}", path.display());
        if !metadata.file_type().is_symlink() && metadata.permissions().readonly() {
            make_writable(path)?;
        }
        fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_writable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)?;
    let mut perms = metadata.permissions();
    let mode = perms.mode();
    let wanted = if metadata.is_dir() {
        mode | 0o700
    } else {
        mode | 0o200
    };
    if wanted != mode {
        perms.set_mode(wanted);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to make {} writable", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_writable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to make {} writable", path.display()))?;
    }
    Ok(())
}

/// Install `src` into `dest`, returning the installed destination paths.
///
/// When `src` is a file and `dest` an existing directory, the file lands
/// inside `dest` (like `install(1)`).
pub fn install(src: &Path, dest: &Path, filter: &dyn InstallFilter) -> Result<Vec<PathBuf>> {
    if fs::symlink_metadata(src).is_err() {
        bail!(
            "could not install '{}' to '{}': source does not exist",
            src.display(),
            dest.display()
        );
    }
    tracing::debug!("Installing {} -> {}", src.display(), dest.display());

    let mut installed = Vec::new();

    if !src.is_dir() {
        let dest = if dest.is_dir() {
            match src.file_name() {
                Some(name) => dest.join(name),
                None => dest.to_path_buf(),
            }
        } else {
            dest.to_path_buf()
        };
        if let Some(parent) = dest.parent() {
            mkdir(parent, true)?;
        }
        copy_file(src, &dest)?;
        installed.push(dest);
        return Ok(installed);
    }

    for entry in WalkDir::new(src).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} escapes {}", entry.path().display(), src.display()))?;

        if !filter.include(relative) {
            continue;
        }

        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            if let Some(parent) = target.parent() {
                mkdir(parent, true)?;
            }
            copy_link(entry.path(), &target)?;
            installed.push(target);
        } else if file_type.is_dir() {
            if target.exists() && !target.is_dir() {
                bail!("expecting a directory but found a file: {}", target.display());
            }
            mkdir(&target, true)?;
        } else {
            if target.is_dir() && !target.is_symlink() {
                bail!("expecting a file but found a directory: {}", target.display());
            }
            if let Some(parent) = target.parent() {
                mkdir(parent, true)?;
            }
            copy_file(entry.path(), &target)?;
            installed.push(target);
        }
    }

    Ok(installed)
}

fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    // A read-only destination is replaced, not written through.
    remove(dest)?;
    fs::copy(src, dest)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;
    Ok(())
}

fn copy_link(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src)
        .with_context(|| format!("failed to read link: {}", src.display()))?;
    remove(dest)?;
    symlink(&target, dest).with_context(|| {
        format!(
            "failed to create symlink {} -> {}",
            dest.display(),
            target.display()
        )
    })
}

/// Sorted list of the files below `dir`, relative to it.
/// Empty directories are listed with a trailing `/`.
pub fn ls_r(dir: &Path) -> Result<Vec<String>> {
    let mut res = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        let relative = relative_path(dir, entry.path());
        let rel = relative.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            let empty = fs::read_dir(entry.path())
                .map(|mut it| it.next().is_none())
                .unwrap_or(false);
            if empty {
                res.push(format!("{}/", rel));
            }
        } else {
            res.push(rel);
        }
    }
    res.sort();
    Ok(res)
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_mkdir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");

        mkdir(&dir, true).unwrap();
        mkdir(&dir, true).unwrap();
        mkdir(&dir, false).unwrap();
        assert!(dir.is_dir());

        assert!(mkdir(&tmp.path().join("x/y"), false).is_err());
    }

    #[test]
    fn test_remove_missing_and_readonly() {
        let tmp = TempDir::new().unwrap();
        remove(&tmp.path().join("does-not-exist")).unwrap();

        let dir = tmp.path().join("tree");
        let file = dir.join("sub/file.txt");
        touch(&file);
        let mut perms = fs::metadata(&file).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&file, perms).unwrap();

        remove(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_install_with_closure_filter() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        touch(&src.join("keep/a.txt"));
        touch(&src.join("skip/b.txt"));

        let filter = |p: &Path| !p.starts_with("skip");
        let installed = install(&src, &dest, &filter).unwrap();

        assert_eq!(installed, vec![dest.join("keep/a.txt")]);
        assert!(dest.join("keep/a.txt").exists());
        assert!(!dest.join("skip").exists());
    }

    #[test]
    fn test_install_overwrites_readonly_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        touch(&src.join("f.txt"));
        fs::write(src.join("f.txt"), "new").unwrap();

        touch(&dest.join("f.txt"));
        let mut perms = fs::metadata(dest.join("f.txt")).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(dest.join("f.txt"), perms).unwrap();

        install(&src, &dest, &AllFiles).unwrap();
        assert_eq!(fs::read_to_string(dest.join("f.txt")).unwrap(), "new");
    }

    #[test]
    fn test_install_single_file_into_directory() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("lone.txt");
        let dest = tmp.path().join("out");
        touch(&src);
        fs::create_dir_all(&dest).unwrap();

        install(&src, &dest, &AllFiles).unwrap();
        assert!(dest.join("lone.txt").exists());
    }

    #[test]
    fn test_install_missing_source() {
        let tmp = TempDir::new().unwrap();
        let err = install(&tmp.path().join("nope"), &tmp.path().join("out"), &AllFiles)
            .unwrap_err()
            .to_string();
        assert!(err.contains("does not exist"));
    }

    #[cfg(unix)]
    #[test]
    fn test_install_preserves_relative_symlinks() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        touch(&src.join("Versions/4.0/lib"));
        symlink(Path::new("4.0"), &src.join("Versions/Current")).unwrap();

        install(&src, &dest, &AllFiles).unwrap();

        let link = dest.join("Versions/Current");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("4.0"));
    }

    #[test]
    fn test_runtime_filter_linux() {
        let filter = RuntimeFilter::new(TargetOs::Linux);

        assert!(filter.include(Path::new("bin/hello")));
        assert!(filter.include(Path::new("lib/libworld.so")));
        assert!(filter.include(Path::new("lib/libworld.so.1.2")));
        assert!(filter.include(Path::new("lib/python2.7/site.py")));
        assert!(filter.include(Path::new("lib/python2.7/config/Makefile")));
        assert!(!filter.include(Path::new("lib/libworld.a")));
        assert!(filter.include(Path::new("share/hello/data.txt")));
        assert!(!filter.include(Path::new("share/cmake/world/world-config.cmake")));
        assert!(!filter.include(Path::new("share/man/man1/hello.1")));
        assert!(!filter.include(Path::new("include/world/world.h")));
        assert!(filter.include(Path::new("include/python2.7/pyconfig.h")));
        assert!(filter.include(Path::new("Qt.framework/Qt")));
        assert!(filter.include(Path::new("etc/hello.conf")));
    }

    #[test]
    fn test_runtime_filter_windows() {
        let filter = RuntimeFilter::new(TargetOs::Windows);

        assert!(filter.include(Path::new("bin/hello.exe")));
        assert!(filter.include(Path::new("bin/world.dll")));
        assert!(!filter.include(Path::new("bin/hello.pdb")));
        assert!(!filter.include(Path::new("lib/world.lib")));
    }

    #[test]
    fn test_ls_r() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("spam/a"));
        touch(&tmp.path().join("spam/b"));
        touch(&tmp.path().join("eggs/c"));
        touch(&tmp.path().join("top"));
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let files = ls_r(tmp.path()).unwrap();
        assert_eq!(files, vec!["eggs/c", "empty/", "spam/a", "spam/b", "top"]);
    }
}
