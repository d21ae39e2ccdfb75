//! Stage execution errors.

use thiserror::Error;

use crate::builder::Stage;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while running a stage for one project.
#[derive(Debug, Clone, Error, miette::Diagnostic)]
pub enum StageError {
    #[error("`{project}` is not configured: {reason}")]
    #[diagnostic(
        code(quay::stage::not_configured),
        help("run `quay configure` before building")
    )]
    NotConfigured { project: String, reason: String },

    #[error("{stage} of `{project}` failed{}", .exit_code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    #[diagnostic(code(quay::stage::backend_failed))]
    BackendInvocationFailed {
        project: String,
        stage: Stage,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("`{project}` requires toolchain version {required} or later, found {found}")]
    #[diagnostic(code(quay::stage::incompatible_toolchain))]
    IncompatibleToolchain {
        project: String,
        required: String,
        found: String,
    },

    #[error("{stage} of `{project}` failed: {message}")]
    #[diagnostic(code(quay::stage::io))]
    Io {
        project: String,
        stage: Stage,
        message: String,
    },

    #[error("{stage} of `{project}` has no output directory")]
    #[diagnostic(code(quay::stage::missing_destination))]
    MissingDestination { project: String, stage: Stage },
}

impl StageError {
    /// Wrap an error from the filesystem layer.
    pub fn io(project: &str, stage: Stage, err: anyhow::Error) -> Self {
        StageError::Io {
            project: project.to_string(),
            stage,
            message: format!("{:#}", err),
        }
    }

    /// Project the error is about.
    pub fn project(&self) -> &str {
        match self {
            StageError::NotConfigured { project, .. }
            | StageError::BackendInvocationFailed { project, .. }
            | StageError::IncompatibleToolchain { project, .. }
            | StageError::Io { project, .. }
            | StageError::MissingDestination { project, .. } => project,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            StageError::NotConfigured { .. } => diag.with_suggestion(suggestions::NOT_CONFIGURED),
            StageError::BackendInvocationFailed { output, .. } => {
                let tail: Vec<&str> = output.lines().rev().take(20).collect();
                tail.into_iter()
                    .rev()
                    .fold(diag, |diag, line| diag.with_context(line))
            }
            StageError::IncompatibleToolchain { .. } => {
                diag.with_suggestion("Select a more recent toolchain with `--toolchain`")
            }
            StageError::Io { .. } | StageError::MissingDestination { .. } => diag,
        }
    }
}
