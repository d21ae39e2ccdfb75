//! Remote sources.
//!
//! Toolchain archives and other inputs are fetched from HTTP(S) or FTP
//! servers.

pub mod remote;

pub use remote::{download, RemoteConfig, Transfer, TransferError};
