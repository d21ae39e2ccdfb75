//! Build pipeline.
//!
//! Runs a set of stages over every build entry of a plan, in plan order.
//! A failed entry stops its remaining stages and every entry depending on it
//! is skipped. Without `ignore_errors` the first failure aborts the run.
//!
//! With more than one job, entries of the same dependency level run
//! concurrently on a rayon pool; a level starts once the previous one is
//! done.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::builder::archive::create_tar_gz;
use crate::builder::backend::{BuildBackend, Invocation};
use crate::builder::bootstrap::bootstrap;
use crate::builder::stamp::ConfigureStamp;
use crate::builder::{Stage, StageError, StageSet};
use crate::resolver::version;
use crate::resolver::{BuildPlan, ResolutionEntry};
use crate::util::fs::{self, AllFiles, InstallFilter, RuntimeFilter};

/// Directory receiving `cmake --install` before filtering.
const INSTALL_STAGING: &str = "quay-install";

/// Directory receiving the tree of a package archive.
const PACKAGE_STAGING: &str = "quay-package";

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Keep going after a failure
    pub ignore_errors: bool,

    /// Entries run concurrently (1 = one at a time)
    pub jobs: usize,

    /// Extra configure flags
    pub cmake_flags: Vec<String>,

    pub release: bool,

    /// Destination of the install stage
    pub install_dest: Option<PathBuf>,

    /// Only install runtime files
    pub runtime_only: bool,

    /// Output directory of the package stage
    pub package_dir: Option<PathBuf>,

    /// Version of the workspace toolchain, checked by the package stage
    pub toolchain_version: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            ignore_errors: false,
            jobs: 1,
            cmake_flags: Vec::new(),
            release: false,
            install_dest: None,
            runtime_only: true,
            package_dir: None,
            toolchain_version: None,
        }
    }
}

/// What happened to one build entry.
#[derive(Debug, Clone)]
pub enum EntryOutcome {
    Completed,
    Failed { stage: Stage, error: StageError },
    Skipped { blocked_by: String },
}

impl EntryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, EntryOutcome::Completed)
    }
}

/// Per-entry outcomes of a run, in plan order.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    outcomes: Vec<(String, EntryOutcome)>,
}

impl PipelineReport {
    pub fn outcomes(&self) -> &[(String, EntryOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<&EntryOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_completed())
            .map(|(n, _)| n.as_str())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, Stage, &StageError)> {
        self.outcomes.iter().filter_map(|(n, o)| match o {
            EntryOutcome::Failed { stage, error } => Some((n.as_str(), *stage, error)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(n, o)| match o {
            EntryOutcome::Skipped { blocked_by } => Some((n.as_str(), blocked_by.as_str())),
            _ => None,
        })
    }

    /// True when every entry completed.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_completed())
    }
}

/// Drives stages through a backend.
pub struct Pipeline<'a> {
    backend: &'a dyn BuildBackend,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(backend: &'a dyn BuildBackend, options: PipelineOptions) -> Self {
        Pipeline { backend, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run `stages` over every build entry of `plan`.
    pub fn run(&self, plan: &BuildPlan, stages: &StageSet) -> Result<PipelineReport, StageError> {
        let mut outcomes: HashMap<String, EntryOutcome> = HashMap::new();

        if self.options.jobs > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.jobs)
                .build()
            {
                Ok(pool) => {
                    for level in plan.levels() {
                        self.run_level(plan, &level, stages, &pool, &mut outcomes)?;
                    }
                    return Ok(self.report(plan, outcomes));
                }
                Err(e) => {
                    tracing::warn!("failed to start {} jobs, building sequentially: {}", self.options.jobs, e);
                }
            }
        }

        for entry in plan.source_entries() {
            let outcome = match blocker(plan, entry.name(), &outcomes) {
                Some(blocked_by) => self.skip(entry.name(), blocked_by),
                None => self.outcome_of(entry, self.run_entry(entry, stages)),
            };
            if let EntryOutcome::Failed { error, .. } = &outcome {
                if !self.options.ignore_errors {
                    return Err(error.clone());
                }
            }
            outcomes.insert(entry.name().to_string(), outcome);
        }

        Ok(self.report(plan, outcomes))
    }

    fn run_level(
        &self,
        plan: &BuildPlan,
        level: &[usize],
        stages: &StageSet,
        pool: &rayon::ThreadPool,
        outcomes: &mut HashMap<String, EntryOutcome>,
    ) -> Result<(), StageError> {
        let entries = plan.entries();
        let mut runnable = Vec::new();

        for &idx in level {
            let name = entries[idx].name();
            match blocker(plan, name, outcomes) {
                Some(blocked_by) => {
                    let outcome = self.skip(name, blocked_by);
                    outcomes.insert(name.to_string(), outcome);
                }
                None => runnable.push(idx),
            }
        }

        let results: Vec<(usize, Result<(), (Stage, StageError)>)> = pool.install(|| {
            runnable
                .par_iter()
                .map(|&idx| (idx, self.run_entry(&entries[idx], stages)))
                .collect()
        });

        let mut first_error = None;
        for (idx, result) in results {
            let entry = &entries[idx];
            let outcome = self.outcome_of(entry, result);
            if let EntryOutcome::Failed { error, .. } = &outcome {
                first_error.get_or_insert_with(|| error.clone());
            }
            outcomes.insert(entry.name().to_string(), outcome);
        }

        match first_error {
            Some(e) if !self.options.ignore_errors => Err(e),
            _ => Ok(()),
        }
    }

    fn skip(&self, name: &str, blocked_by: String) -> EntryOutcome {
        tracing::warn!("Skipping {}: `{}` failed", name, blocked_by);
        EntryOutcome::Skipped { blocked_by }
    }

    fn outcome_of(
        &self,
        entry: &ResolutionEntry,
        result: Result<(), (Stage, StageError)>,
    ) -> EntryOutcome {
        match result {
            Ok(()) => EntryOutcome::Completed,
            Err((stage, error)) => {
                if self.options.ignore_errors {
                    tracing::error!("{}: {}", entry.name(), error);
                }
                EntryOutcome::Failed { stage, error }
            }
        }
    }

    fn report(&self, plan: &BuildPlan, mut outcomes: HashMap<String, EntryOutcome>) -> PipelineReport {
        PipelineReport {
            outcomes: plan
                .source_entries()
                .filter_map(|e| {
                    outcomes
                        .remove(e.name())
                        .map(|outcome| (e.name().to_string(), outcome))
                })
                .collect(),
        }
    }

    /// Run every stage of one entry, stopping at the first failure.
    pub fn run_entry(
        &self,
        entry: &ResolutionEntry,
        stages: &StageSet,
    ) -> Result<(), (Stage, StageError)> {
        let ResolutionEntry::Build {
            project,
            source_path,
            build_directory,
            sdk_dirs,
            ..
        } = entry
        else {
            return Ok(());
        };

        let inv = Invocation {
            project,
            source_dir: source_path,
            build_dir: build_directory,
            sdk_dirs,
            flags: &self.options.cmake_flags,
            release: self.options.release,
        };

        for stage in stages.iter() {
            tracing::info!("{} {}", stage_verb(stage), project);

            let result = match stage {
                Stage::Bootstrap => self.bootstrap(&inv),
                Stage::Configure => self.configure(&inv),
                Stage::Build => self.build(&inv),
                Stage::Test => self.test(&inv),
                Stage::Install => self.install(&inv),
                Stage::Package => self.package(entry, &inv),
            };
            result.map_err(|e| (stage, e))?;
        }

        Ok(())
    }

    fn bootstrap(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        bootstrap(inv.project, inv.build_dir, inv.sdk_dirs)
            .map(|_| ())
            .map_err(|e| StageError::io(inv.project, Stage::Bootstrap, e))
    }

    fn configure(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        fs::ensure_dir(inv.build_dir).map_err(|e| StageError::io(inv.project, Stage::Configure, e))?;
        ConfigureStamp::clear(inv.build_dir).map_err(|e| StageError::io(inv.project, Stage::Configure, e))?;

        self.backend.configure(inv)?;

        ConfigureStamp::new(inv.sdk_dirs, inv.release)
            .save(inv.build_dir)
            .map_err(|e| StageError::io(inv.project, Stage::Configure, e))
    }

    fn build(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.check_configured(inv, Stage::Build)?;
        self.backend.build(inv)
    }

    fn test(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        self.check_configured(inv, Stage::Test)?;
        self.backend.test(inv)
    }

    /// The build directory must hold a successful configure for these inputs.
    fn check_configured(&self, inv: &Invocation<'_>, stage: Stage) -> Result<(), StageError> {
        let stamp = ConfigureStamp::load(inv.build_dir).map_err(|e| StageError::io(inv.project, stage, e))?;

        let reason = match stamp {
            None => "configure has not been run",
            Some(stamp) if !stamp.matches_sdk_dirs(inv.sdk_dirs) => {
                "SDK directories changed since the last configure"
            }
            Some(stamp) if stamp.release != inv.release => "build type changed since the last configure",
            Some(_) => return Ok(()),
        };

        Err(StageError::NotConfigured {
            project: inv.project.to_string(),
            reason: reason.to_string(),
        })
    }

    fn install(&self, inv: &Invocation<'_>) -> Result<(), StageError> {
        let dest = self
            .options
            .install_dest
            .as_deref()
            .ok_or_else(|| StageError::MissingDestination {
                project: inv.project.to_string(),
                stage: Stage::Install,
            })?;

        let staging = inv.build_dir.join(INSTALL_STAGING);
        self.stage_install(inv, &staging, Stage::Install)?;

        let runtime = RuntimeFilter::for_host();
        let filter: &dyn InstallFilter = if self.options.runtime_only {
            &runtime
        } else {
            &AllFiles
        };

        let installed = fs::install(&staging, dest, filter)
            .map_err(|e| StageError::io(inv.project, Stage::Install, e))?;
        tracing::debug!("{}: installed {} files to {}", inv.project, installed.len(), dest.display());
        Ok(())
    }

    fn package(&self, entry: &ResolutionEntry, inv: &Invocation<'_>) -> Result<(), StageError> {
        if let (Some(required), Some(found)) = (
            entry.toolchain_version(),
            self.options.toolchain_version.as_deref(),
        ) {
            if version::compare(found, required).is_lt() {
                return Err(StageError::IncompatibleToolchain {
                    project: inv.project.to_string(),
                    required: required.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let package_dir = self
            .options
            .package_dir
            .as_deref()
            .ok_or_else(|| StageError::MissingDestination {
                project: inv.project.to_string(),
                stage: Stage::Package,
            })?;

        let stem = archive_stem(inv.project, entry.version());
        let staging = inv.build_dir.join(PACKAGE_STAGING).join(&stem);
        self.stage_install(inv, &staging, Stage::Package)?;

        let archive = package_dir.join(format!("{}.tar.gz", stem));
        create_tar_gz(&staging, &archive, &stem)
            .map_err(|e| StageError::io(inv.project, Stage::Package, e))?;

        tracing::info!("Wrote {}", archive.display());
        Ok(())
    }

    /// Run the backend install into a fresh staging directory.
    fn stage_install(&self, inv: &Invocation<'_>, staging: &Path, stage: Stage) -> Result<(), StageError> {
        fs::remove(staging).map_err(|e| StageError::io(inv.project, stage, e))?;

        self.backend.install(inv, staging).map_err(|e| match e {
            StageError::BackendInvocationFailed {
                project,
                exit_code,
                output,
                ..
            } => StageError::BackendInvocationFailed {
                project,
                stage,
                exit_code,
                output,
            },
            other => other,
        })
    }
}

/// `<name>[-<version>]`
pub fn archive_stem(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{}-{}", name, v),
        None => name.to_string(),
    }
}

fn stage_verb(stage: Stage) -> &'static str {
    match stage {
        Stage::Bootstrap => "Bootstrapping",
        Stage::Configure => "Configuring",
        Stage::Build => "Building",
        Stage::Test => "Testing",
        Stage::Install => "Installing",
        Stage::Package => "Packaging",
    }
}

/// The failed entry that prevents `name` from running, if any.
fn blocker(plan: &BuildPlan, name: &str, outcomes: &HashMap<String, EntryOutcome>) -> Option<String> {
    plan.dependencies_of(name)
        .into_iter()
        .find_map(|dep| match outcomes.get(dep) {
            Some(EntryOutcome::Failed { .. }) => Some(dep.to_string()),
            Some(EntryOutcome::Skipped { blocked_by }) => Some(blocked_by.clone()),
            _ => None,
        })
}
