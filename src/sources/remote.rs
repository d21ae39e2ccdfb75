//! Remote downloads.
//!
//! Fetches a single file over HTTP(S) or FTP into a local directory.
//! Credentials come from the `[servers]` table of the configuration, keyed
//! by host name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::util::config::ServerAccess;
use crate::util::fs::{ensure_dir, remove};

/// Size of the chunks copied between the network and the file.
const CHUNK_SIZE: usize = 100 * 1024;

/// Download failure.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum TransferError {
    #[error("could not download {url}: {message}")]
    #[diagnostic(
        code(quay::remote::transfer_failed),
        help("check the URL and the credentials in the [servers] configuration")
    )]
    TransferFailed { url: String, message: String },

    #[error("unsupported URL scheme `{scheme}`")]
    #[diagnostic(
        code(quay::remote::unsupported_scheme),
        help("use an http, https or ftp URL")
    )]
    UnsupportedScheme { scheme: String },
}

impl TransferError {
    fn failed(url: &Url, message: impl std::fmt::Display) -> Self {
        TransferError::TransferFailed {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Progress of one transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transfer {
    /// Expected size, when the server announced one
    pub total: Option<u64>,

    /// Bytes written so far
    pub done: u64,
}

impl Transfer {
    fn advance(&mut self, bytes: usize, progress: &mut dyn FnMut(&Transfer)) {
        self.done += bytes as u64;
        progress(self);
    }
}

/// Server credentials, loaded once from the configuration.
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    servers: HashMap<String, ServerAccess>,
}

impl RemoteConfig {
    pub fn new(servers: HashMap<String, ServerAccess>) -> Self {
        RemoteConfig { servers }
    }

    /// Access for the host of `url`: `host:port` entries win over `host`.
    pub fn access_for(&self, url: &Url) -> Option<&ServerAccess> {
        let host = url.host_str()?;
        url.port()
            .and_then(|port| self.servers.get(&format!("{}:{}", host, port)))
            .or_else(|| self.servers.get(host))
    }
}

/// Download `url` into `dest_dir`.
///
/// The file is named `name`, or after the last segment of the URL path.
/// When `overwrite` is false and the file already exists, nothing is
/// downloaded. A failed transfer leaves no partial file behind.
pub fn download(
    url: &str,
    dest_dir: &Path,
    name: Option<&str>,
    overwrite: bool,
    remote: &RemoteConfig,
    progress: &mut dyn FnMut(&Transfer),
) -> Result<PathBuf, TransferError> {
    let parsed = Url::parse(url).map_err(|e| TransferError::TransferFailed {
        url: url.to_string(),
        message: format!("invalid URL: {}", e),
    })?;

    let dest = dest_dir.join(file_name(&parsed, name)?);
    if dest.exists() && !overwrite {
        tracing::debug!("{} already exists, not downloading", dest.display());
        return Ok(dest);
    }

    match parsed.scheme() {
        "http" | "https" | "ftp" => {}
        other => {
            return Err(TransferError::UnsupportedScheme {
                scheme: other.to_string(),
            })
        }
    }

    ensure_dir(dest_dir).map_err(|e| TransferError::failed(&parsed, format!("{:#}", e)))?;
    let mut file = File::create(&dest).map_err(|e| {
        TransferError::failed(&parsed, format!("could not create {}: {}", dest.display(), e))
    })?;

    tracing::debug!("Downloading {} to {}", parsed, dest.display());
    let result = match parsed.scheme() {
        "ftp" => fetch_ftp(&parsed, remote, &mut file, progress),
        _ => fetch_http(&parsed, remote, &mut file, progress),
    }
    .and_then(|()| file.flush().map_err(|e| TransferError::failed(&parsed, e)));

    drop(file);
    if let Err(e) = result {
        if let Err(rm) = remove(&dest) {
            tracing::warn!("could not remove {}: {:#}", dest.display(), rm);
        }
        return Err(e);
    }

    Ok(dest)
}

/// Name of the downloaded file.
fn file_name(url: &Url, name: Option<&str>) -> Result<String, TransferError> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TransferError::failed(url, "URL has no file name, pass one explicitly"))
}

fn fetch_http(
    url: &Url,
    remote: &RemoteConfig,
    out: &mut File,
    progress: &mut dyn FnMut(&Transfer),
) -> Result<(), TransferError> {
    let client = reqwest::blocking::Client::new();
    let mut request = client.get(url.clone());
    if let Some(access) = remote.access_for(url) {
        if let Some(username) = &access.username {
            request = request.basic_auth(username, access.password.as_ref());
        }
    }

    let mut response = request
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| TransferError::failed(url, e))?;

    let mut transfer = Transfer {
        total: response.content_length(),
        done: 0,
    };
    copy_with_progress(&mut response, out, &mut transfer, progress).map_err(|e| TransferError::failed(url, e))
}

fn fetch_ftp(
    url: &Url,
    remote: &RemoteConfig,
    out: &mut File,
    progress: &mut dyn FnMut(&Transfer),
) -> Result<(), TransferError> {
    let host = url
        .host_str()
        .ok_or_else(|| TransferError::failed(url, "missing host"))?;
    let port = url.port().unwrap_or(21);

    let access = remote.access_for(url);
    let username = access
        .and_then(|a| a.username.as_deref())
        .unwrap_or("anonymous");
    let password = access
        .and_then(|a| a.password.as_deref())
        .unwrap_or("anonymous");
    let root = access.and_then(|a| a.root.as_deref());

    let mut ftp = suppaftp::FtpStream::connect(format!("{}:{}", host, port))
        .map_err(|e| TransferError::failed(url, e))?;
    ftp.login(username, password)
        .map_err(|e| TransferError::failed(url, e))?;

    // With a root configured, URL paths are relative to it.
    let path = match root {
        Some(root) => {
            ftp.cwd(root).map_err(|e| TransferError::failed(url, e))?;
            url.path().trim_start_matches('/')
        }
        None => url.path(),
    };

    let mut transfer = Transfer {
        total: ftp.size(path).ok().map(|size| size as u64),
        done: 0,
    };

    let mut stream = ftp
        .retr_as_stream(path)
        .map_err(|e| TransferError::failed(url, e))?;
    copy_with_progress(&mut stream, out, &mut transfer, progress)
        .map_err(|e| TransferError::failed(url, e))?;
    ftp.finalize_retr_stream(stream)
        .map_err(|e| TransferError::failed(url, e))?;

    if let Err(e) = ftp.quit() {
        tracing::debug!("ftp quit failed: {}", e);
    }
    Ok(())
}

fn copy_with_progress(
    input: &mut dyn Read,
    out: &mut File,
    transfer: &mut Transfer,
    progress: &mut dyn FnMut(&Transfer),
) -> std::io::Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        out.write_all(&buf[..n])?;
        transfer.advance(n, progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_progress(_: &Transfer) {}

    #[test]
    fn test_file_name_from_url() {
        let url = Url::parse("https://example.com/toolchains/linux64.tar.gz").unwrap();
        assert_eq!(file_name(&url, None).unwrap(), "linux64.tar.gz");
        assert_eq!(file_name(&url, Some("tc.tgz")).unwrap(), "tc.tgz");

        let bare = Url::parse("https://example.com/").unwrap();
        assert!(matches!(
            file_name(&bare, None),
            Err(TransferError::TransferFailed { .. })
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        let tmp = TempDir::new().unwrap();
        let err = download(
            "gopher://example.com/file.txt",
            tmp.path(),
            None,
            true,
            &RemoteConfig::default(),
            &mut no_progress,
        )
        .unwrap_err();

        assert!(matches!(err, TransferError::UnsupportedScheme { ref scheme } if scheme == "gopher"));
        assert!(!tmp.path().join("file.txt").exists());
    }

    #[test]
    fn test_no_clobber_keeps_existing_file() {
        let tmp = TempDir::new().unwrap();
        let existing = tmp.path().join("linux64.tar.gz");
        std::fs::write(&existing, "cached").unwrap();

        let path = download(
            "http://127.0.0.1:1/linux64.tar.gz",
            tmp.path(),
            None,
            false,
            &RemoteConfig::default(),
            &mut no_progress,
        )
        .unwrap();

        assert_eq!(path, existing);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "cached");
    }

    #[test]
    fn test_failed_transfer_removes_partial_file() {
        let tmp = TempDir::new().unwrap();
        let err = download(
            "http://127.0.0.1:1/linux64.tar.gz",
            tmp.path(),
            None,
            true,
            &RemoteConfig::default(),
            &mut no_progress,
        )
        .unwrap_err();

        assert!(matches!(err, TransferError::TransferFailed { .. }));
        assert!(!tmp.path().join("linux64.tar.gz").exists());
    }

    #[test]
    fn test_access_for_host() {
        let mut servers = HashMap::new();
        servers.insert(
            "ftp.example.com".to_string(),
            ServerAccess {
                username: Some("user".to_string()),
                password: Some("secret".to_string()),
                root: Some("/pub".to_string()),
            },
        );
        servers.insert(
            "ftp.example.com:2121".to_string(),
            ServerAccess {
                username: Some("other".to_string()),
                ..ServerAccess::default()
            },
        );
        let remote = RemoteConfig::new(servers);

        let url = Url::parse("ftp://ftp.example.com/toolchains/linux64.tar.gz").unwrap();
        assert_eq!(remote.access_for(&url).unwrap().root.as_deref(), Some("/pub"));

        let url = Url::parse("ftp://ftp.example.com:2121/x").unwrap();
        assert_eq!(remote.access_for(&url).unwrap().username.as_deref(), Some("other"));

        let url = Url::parse("https://elsewhere.org/x").unwrap();
        assert!(remote.access_for(&url).is_none());
    }
}
