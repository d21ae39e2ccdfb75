//! Quay - a multi-project build orchestrator for CMake work trees
//!
//! This crate provides the core library functionality for Quay: work tree
//! discovery, dependency resolution between source projects and prebuilt
//! packages, and the staged build pipeline driving CMake.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities for Quay unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides an on-disk work tree builder and a recording build backend.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildBackend, CMakeBackend, Pipeline, PipelineOptions, Stage, StageSet};
pub use core::{BuildConfiguration, Package, Project, Toolchain, Workspace};
pub use resolver::{resolve, BuildPlan, ResolutionEntry};
pub use util::context::GlobalContext;
