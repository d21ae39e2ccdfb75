//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during dependency resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum ResolveError {
    #[error("unknown project `{name}`")]
    #[diagnostic(code(quay::resolve::unknown_project))]
    UnknownProject { name: String },

    #[error("unknown package `{name}`")]
    #[diagnostic(code(quay::resolve::unknown_package))]
    UnknownPackage { name: String },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    #[diagnostic(code(quay::resolve::cyclic_dependency))]
    CyclicDependency { cycle: Vec<String> },

    #[error("`{dependent}` depends on `{name}`, which is neither a project nor a package")]
    #[diagnostic(code(quay::resolve::unresolved_dependency))]
    UnresolvedDependency { dependent: String, name: String },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnknownProject { name } => {
                Diagnostic::error(format!("no project named `{}` in this work tree", name))
                    .with_suggestion("Check that the project name is spelled correctly")
                    .with_suggestion(suggestions::PROJECT_NOT_FOUND)
            }

            ResolveError::UnknownPackage { name } => {
                Diagnostic::error(format!("no package named `{}` in the toolchain", name))
                    .with_suggestion("Select the toolchain providing it with `--toolchain`")
            }

            ResolveError::CyclicDependency { cycle } => {
                let mut diag = Diagnostic::error("cycle detected in dependency graph");

                for pair in cycle.windows(2) {
                    diag = diag.with_context(format!("`{}` depends on `{}`", pair[0], pair[1]));
                }

                diag.with_suggestion("Break the cycle by removing one of these dependencies")
            }

            ResolveError::UnresolvedDependency { dependent, name } => Diagnostic::error(format!(
                "could not find `{}`, needed by `{}`",
                name, dependent
            ))
            .with_context(format!("`{}` is neither a project nor a package", name))
            .with_suggestion(format!("Add `{}` to the work tree", name))
            .with_suggestion("Select a toolchain that provides it"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_diagnostic() {
        let err = ResolveError::CyclicDependency {
            cycle: vec![
                "hello".to_string(),
                "world".to_string(),
                "hello".to_string(),
            ],
        };

        assert_eq!(
            err.to_string(),
            "cyclic dependency: hello -> world -> hello"
        );

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("`hello` depends on `world`"));
        assert!(output.contains("`world` depends on `hello`"));
    }

    #[test]
    fn test_unresolved_diagnostic_names_both_sides() {
        let err = ResolveError::UnresolvedDependency {
            dependent: "hello".to_string(),
            name: "zlib".to_string(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("could not find `zlib`, needed by `hello`"));
    }
}
