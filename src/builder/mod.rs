//! Per-project build stages.
//!
//! This module drives the native build of each plan entry: it writes the
//! dependency scaffolding, then configures, builds, installs and packages
//! through a [`BuildBackend`] (CMake in practice).

pub mod archive;
pub mod backend;
pub mod bootstrap;
pub mod cmake;
pub mod errors;
pub mod pipeline;
pub mod stage;
pub mod stamp;

pub use backend::{BuildBackend, Invocation};
pub use cmake::CMakeBackend;
pub use errors::StageError;
pub use pipeline::{EntryOutcome, Pipeline, PipelineOptions, PipelineReport};
pub use stage::{Stage, StageSet};
