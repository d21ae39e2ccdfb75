//! Pipeline stages.

use std::fmt;

use serde::Serialize;

/// One step of the per-project pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Bootstrap,
    Configure,
    Build,
    Test,
    Install,
    Package,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Bootstrap,
        Stage::Configure,
        Stage::Build,
        Stage::Test,
        Stage::Install,
        Stage::Package,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Bootstrap => "bootstrap",
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Test => "test",
            Stage::Install => "install",
            Stage::Package => "package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of stages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageSet {
    stages: Vec<Stage>,
}

impl StageSet {
    /// Stages are always executed in pipeline order, whatever the input order.
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Self {
        let mut stages: Vec<Stage> = stages.into_iter().collect();
        stages.sort();
        stages.dedup();
        StageSet { stages }
    }

    /// `bootstrap` then `configure`.
    pub fn configure() -> Self {
        Self::new([Stage::Bootstrap, Stage::Configure])
    }

    pub fn build() -> Self {
        Self::new([Stage::Build])
    }

    pub fn test() -> Self {
        Self::new([Stage::Test])
    }

    pub fn install() -> Self {
        Self::new([Stage::Install])
    }

    pub fn package() -> Self {
        Self::new([Stage::Package])
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for StageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(Stage::as_str).collect();
        f.write_str(&names.join(", "))
    }
}
