//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Quay - build a work tree of interdependent CMake projects
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Work tree to use (defaults to the one containing the current directory)
    #[arg(short, long, global = true, env = "QUAY_WORK_TREE")]
    pub work_tree: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a work tree
    Init(InitArgs),

    /// Bootstrap and configure projects and their dependencies
    Configure(ConfigureArgs),

    /// Build configured projects
    Make(MakeArgs),

    /// Run the tests of built projects with ctest
    Test(TestArgs),

    /// Install the runtime files of projects into a directory
    Install(InstallArgs),

    /// Create package archives
    Package(PackageArgs),

    /// Show the build plan
    Plan(PlanArgs),

    /// List projects and their build directories
    Status(StatusArgs),

    /// Remove build directories
    Clean(CleanArgs),

    /// Run a command in every buildable project
    Foreach(ForeachArgs),

    /// Download a file (toolchain archives, packages)
    Fetch(FetchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Build configuration selection, shared by the commands opening a work tree.
#[derive(Args, Clone, Default)]
pub struct ConfigArgs {
    /// Build configuration name (names the build directories)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Toolchain providing prebuilt packages
    #[arg(short, long)]
    pub toolchain: Option<String>,

    /// Build in release mode
    #[arg(long)]
    pub release: bool,

    /// Build NAME from source even if the toolchain provides it
    #[arg(long = "use-source", value_name = "NAME")]
    pub use_source: Vec<String>,
}

/// Project selection, shared by the stage-running commands.
#[derive(Args, Clone, Default)]
pub struct ProjectArgs {
    /// Projects to process (defaults to the current project, or all)
    pub projects: Vec<String>,

    /// Do not process dependencies
    #[arg(short, long)]
    pub single: bool,
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,

    /// Also create a quay.toml for a project named NAME in PATH
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,
}

#[derive(Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub select: ProjectArgs,

    /// Additional CMake flag (-D FOO=ON)
    #[arg(short = 'D', value_name = "FLAG")]
    pub cmake_flags: Vec<String>,

    /// Continue with the other projects after a failure
    #[arg(long)]
    pub ignore_errors: bool,
}

#[derive(Args)]
pub struct MakeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub select: ProjectArgs,

    /// Continue with the other projects after a failure
    #[arg(long)]
    pub ignore_errors: bool,

    /// Number of projects built concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct TestArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Projects to test (defaults to the current project, or all)
    pub projects: Vec<String>,

    /// Continue with the other projects after a failure
    #[arg(long)]
    pub ignore_errors: bool,
}

#[derive(Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Projects to install, then the destination directory
    #[arg(required = true, num_args = 1..)]
    pub args: Vec<String>,

    /// Do not install dependencies
    #[arg(short, long)]
    pub single: bool,

    /// Install headers and CMake files too
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub select: ProjectArgs,

    /// Output directory for the archives
    #[arg(short, long, default_value = "package")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub select: ProjectArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub select: ProjectArgs,

    /// Remove the build directories of every configuration
    #[arg(long)]
    pub all: bool,

    /// Remove the directories instead of listing them
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ForeachArgs {
    /// Continue with the other projects when the command fails
    #[arg(long)]
    pub ignore_errors: bool,

    /// Command to run (use -- to separate it from quay options)
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct FetchArgs {
    /// URL to download (http, https or ftp)
    pub url: String,

    /// Directory receiving the file
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// File name (defaults to the last segment of the URL)
    #[arg(long)]
    pub name: Option<String>,

    /// Keep an existing file instead of downloading it again
    #[arg(long)]
    pub no_clobber: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
