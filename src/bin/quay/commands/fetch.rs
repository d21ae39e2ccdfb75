//! `quay fetch` command

use std::io::IsTerminal;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::FetchArgs;
use quay::ops::{fetch, FetchOptions};
use quay::sources::{RemoteConfig, Transfer};
use quay::GlobalContext;

pub fn execute(args: FetchArgs, ctx: &GlobalContext) -> Result<()> {
    // Server credentials come from the work tree config when there is one
    let root = ctx.find_worktree();
    let remote: RemoteConfig = ctx.load_config(root.as_deref()).remote();

    let opts = FetchOptions {
        url: args.url,
        output_dir: ctx.cwd().join(args.output),
        name: args.name,
        no_clobber: args.no_clobber,
    };

    let bar = std::io::stderr().is_terminal().then(progress_bar);
    let path = fetch(&opts, &remote, &mut |transfer: &Transfer| {
        if let Some(bar) = &bar {
            if let Some(total) = transfer.total {
                bar.set_length(total);
            }
            bar.set_position(transfer.done);
        }
    });

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    println!("{}", path?.display());
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}
