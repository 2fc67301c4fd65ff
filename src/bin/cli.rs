// src/bin/cli.rs
use std::process::ExitCode;

use clap::Parser;
use seat_watch::{cli, log};

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let args = cli::Cli::parse();
    let opts = args.options()?;
    let _log_guard = log::init(&opts.store.dir);
    cli::run(&args, &opts)
}
