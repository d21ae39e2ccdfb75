//! Implementation of `quay configure`, `quay make`, `quay test`,
//! `quay install` and `quay package`.
//!
//! All of them resolve the selected projects into a plan and run a stage set
//! over it; they differ only in the stages and their destinations.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::{BuildBackend, Pipeline, PipelineOptions, PipelineReport, Stage, StageSet};
use crate::core::Workspace;
use crate::ops::quay_plan::resolve_plan;
use crate::resolver::BuildPlan;
use crate::util::config::Config;

/// Options shared by the stage-running commands.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Projects to process (already selected)
    pub projects: Vec<String>,

    /// Do not process dependencies
    pub single: bool,

    /// Keep going after a failure
    pub ignore_errors: bool,

    /// Number of parallel jobs (overrides the configuration)
    pub jobs: Option<usize>,

    /// Extra configure flags, appended to the configured ones
    pub cmake_flags: Vec<String>,

    /// Destination of `quay install`
    pub install_dest: Option<PathBuf>,

    /// Install headers and CMake files too
    pub all_files: bool,

    /// Output directory of `quay package`
    pub package_dir: Option<PathBuf>,
}

/// Which command is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCommand {
    Configure,
    Make,
    Test,
    Install,
    Package,
}

impl BuildCommand {
    pub fn stages(self) -> StageSet {
        match self {
            BuildCommand::Configure => StageSet::configure(),
            BuildCommand::Make => StageSet::build(),
            BuildCommand::Test => StageSet::test(),
            BuildCommand::Install => StageSet::install(),
            BuildCommand::Package => StageSet::package(),
        }
    }
}

/// Result of a stage-running command.
#[derive(Debug)]
pub struct BuildResult {
    pub plan: BuildPlan,
    pub report: PipelineReport,
}

/// Resolve the selected projects and run `command` over them.
///
/// Build directories created by bootstrap are recorded on the workspace.
/// Tests only run for the selected projects, never their dependencies.
pub fn run_build(
    ws: &mut Workspace,
    config: &Config,
    backend: &dyn BuildBackend,
    command: BuildCommand,
    opts: &BuildOptions,
) -> Result<BuildResult> {
    let single = opts.single || command == BuildCommand::Test;
    let plan = resolve_plan(ws, &opts.projects, single)?;

    let packages: Vec<&str> = plan.package_entries().map(|e| e.name()).collect();
    let sources: Vec<&str> = plan.source_entries().map(|e| e.name()).collect();
    if !packages.is_empty() {
        tracing::info!("Using packages: {}", packages.join(", "));
    }
    tracing::info!("Source projects: {}", sources.join(", "));

    let options = pipeline_options(ws, config, opts);
    let stages = command.stages();
    let report = Pipeline::new(backend, options).run(&plan, &stages)?;

    if stages.contains(Stage::Bootstrap) {
        for entry in plan.source_entries() {
            if let Some(dir) = entry.build_directory().filter(|d| d.is_dir()) {
                ws.record_build_directory(entry.name(), dir.to_path_buf())?;
            }
        }
    }

    Ok(BuildResult { plan, report })
}

/// Merge configuration and command-line options for the pipeline.
pub fn pipeline_options(ws: &Workspace, config: &Config, opts: &BuildOptions) -> PipelineOptions {
    let mut cmake_flags = config.build.cmake_flags.clone();
    cmake_flags.extend(opts.cmake_flags.iter().cloned());

    PipelineOptions {
        ignore_errors: opts.ignore_errors,
        jobs: opts.jobs.or(config.build.jobs).unwrap_or(1).max(1),
        cmake_flags,
        release: ws.configuration().release,
        install_dest: opts.install_dest.clone(),
        runtime_only: !opts.all_files,
        package_dir: opts.package_dir.clone(),
        toolchain_version: ws
            .toolchain()
            .and_then(|t| t.version())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EntryOutcome;
    use crate::test_support::{RecordingBackend, WorkTreeBuilder};

    fn options(projects: &[&str]) -> BuildOptions {
        BuildOptions {
            projects: projects.iter().map(|p| p.to_string()).collect(),
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_configure_then_make() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &["world"])
            .project("world", "world", &[])
            .build();
        let mut ws = Workspace::open(tree.root()).unwrap();
        let backend = RecordingBackend::new();
        let config = Config::default();

        run_build(&mut ws, &config, &backend, BuildCommand::Configure, &options(&["hello"])).unwrap();
        assert!(ws.get_project("world").unwrap().is_configured());
        assert!(ws.get_project("hello").unwrap().is_configured());

        let result = run_build(&mut ws, &config, &backend, BuildCommand::Make, &options(&["hello"])).unwrap();
        assert!(result.report.is_success());
        assert_eq!(backend.calls().len(), 4);
    }

    #[test]
    fn test_tests_run_for_selected_projects_only() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &["world"])
            .project("world", "world", &[])
            .build();
        let mut ws = Workspace::open(tree.root()).unwrap();
        let backend = RecordingBackend::new();
        let config = Config::default();

        run_build(&mut ws, &config, &backend, BuildCommand::Configure, &options(&["hello"])).unwrap();
        let result = run_build(&mut ws, &config, &backend, BuildCommand::Test, &options(&["hello"])).unwrap();

        assert!(result.report.is_success());
        let tests: Vec<String> = backend
            .calls()
            .iter()
            .filter(|c| c.stage == Stage::Test)
            .map(|c| c.project.clone())
            .collect();
        assert_eq!(tests, vec!["hello"]);
    }

    #[test]
    fn test_make_reports_failures_with_ignore_errors() {
        let tree = WorkTreeBuilder::new()
            .project("hello", "hello", &["world"])
            .project("world", "world", &[])
            .build();
        let mut ws = Workspace::open(tree.root()).unwrap();
        let config = Config::default();

        let backend = RecordingBackend::new().fail_on("world", Stage::Configure);
        let opts = BuildOptions {
            ignore_errors: true,
            ..options(&["hello"])
        };
        let result = run_build(&mut ws, &config, &backend, BuildCommand::Configure, &opts).unwrap();

        assert!(matches!(
            result.report.outcome("hello"),
            Some(EntryOutcome::Skipped { .. })
        ));
    }

    #[test]
    fn test_pipeline_options_merge_flags() {
        let ws = Workspace::new("/src", crate::core::BuildConfiguration::default());
        let mut config = Config::default();
        config.build.cmake_flags = vec!["-DFOO=ON".to_string()];
        config.build.jobs = Some(4);

        let opts = BuildOptions {
            cmake_flags: vec!["-DBAR=OFF".to_string()],
            ..BuildOptions::default()
        };
        let options = pipeline_options(&ws, &config, &opts);
        assert_eq!(options.cmake_flags, vec!["-DFOO=ON", "-DBAR=OFF"]);
        assert_eq!(options.jobs, 4);
        assert!(options.runtime_only);
    }
}
