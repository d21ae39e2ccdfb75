//! Quay CLI - a multi-project build orchestrator for CMake work trees

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use quay::builder::StageError;
use quay::resolver::ResolveError;
use quay::util::diagnostic::emit;
use quay::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let ctx = GlobalContext::new()?.with_work_tree(cli.work_tree);

    // Execute command
    match cli.command {
        Commands::Init(args) => commands::init::execute(args, &ctx),
        Commands::Configure(args) => commands::configure::execute(args, &ctx),
        Commands::Make(args) => commands::make::execute(args, &ctx),
        Commands::Test(args) => commands::test::execute(args, &ctx),
        Commands::Install(args) => commands::install::execute(args, &ctx),
        Commands::Package(args) => commands::package::execute(args, &ctx),
        Commands::Plan(args) => commands::plan::execute(args, &ctx),
        Commands::Status(args) => commands::status::execute(args, &ctx),
        Commands::Clean(args) => commands::clean::execute(args, &ctx),
        Commands::Foreach(args) => commands::foreach::execute(args, &ctx),
        Commands::Fetch(args) => commands::fetch::execute(args, &ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Resolution and stage errors get the detailed diagnostic format.
fn report(e: &anyhow::Error, color: bool) {
    if let Some(err) = e.downcast_ref::<ResolveError>() {
        emit(&err.to_diagnostic(), color);
    } else if let Some(err) = e.downcast_ref::<StageError>() {
        emit(&err.to_diagnostic(), color);
    } else {
        eprintln!("error: {:#}", e);
    }
}
