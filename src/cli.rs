// src/cli.rs
use std::{path::PathBuf, process::ExitCode};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};

use crate::config::options::AppOptions;
use crate::core::clock;
use crate::file::parse_date;
use crate::pipeline::{self, CycleSummary, FailureKind};
use crate::progress::Progress;
use crate::store::{self, Appended, SnapshotStore};

#[derive(Debug, Parser)]
#[command(name = "seat_watch", version, about = "Capture seat occupancy into per-day CSV files")]
pub struct Cli {
    /// TOML config file; missing keys keep their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the per-day CSV files
    #[arg(short, long, global = true)]
    pub out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one capture cycle (default)
    Run(RunArgs),
    /// Print the latest recorded availability per area for a day
    Show {
        /// Day to read (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Day to capture for (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Area id of the seat tree root
    #[arg(long)]
    pub area: Option<u32>,

    /// Never fall back to a browser session
    #[arg(long)]
    pub no_browser: bool,
}

impl Cli {
    /// Config file (if any) with command-line overrides applied.
    pub fn options(&self) -> Result<AppOptions> {
        let mut opts = match &self.config {
            Some(path) => AppOptions::load(path).map_err(|e| eyre!("{e}"))?,
            None => AppOptions::default(),
        };
        if let Some(dir) = &self.out {
            opts.store.dir = dir.clone();
        }
        if let Some(Command::Run(args)) = &self.command {
            if let Some(area) = args.area {
                opts.target.area_id = area;
            }
            if args.no_browser {
                opts.session.browser.enabled = false;
            }
        }
        Ok(opts)
    }
}

pub fn run(cli: &Cli, opts: &AppOptions) -> Result<ExitCode> {
    match &cli.command {
        None => run_cycle(&RunArgs::default(), opts),
        Some(Command::Run(args)) => run_cycle(args, opts),
        Some(Command::Show { date }) => show(date.unwrap_or_else(clock::today), opts),
    }
}

/// Stderr status lines for interactive runs.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }
}

fn run_cycle(args: &RunArgs, opts: &AppOptions) -> Result<ExitCode> {
    let date = args.date.unwrap_or_else(clock::today);
    let report = pipeline::run_cycle(opts, date, &mut ConsoleProgress);

    match &report.outcome {
        Ok(summary) => {
            print_summary(opts.target.area_id, summary);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e.one_line());
            // Empty is a warning-class outcome; keep it distinguishable for schedulers.
            Ok(if e.kind() == FailureKind::Empty { ExitCode::from(2) } else { ExitCode::FAILURE })
        }
    }
}

fn print_summary(area_id: u32, s: &CycleSummary) {
    println!(
        "\n=== Area {} · {} · {} ({}) ===",
        area_id, s.date, clock::minute_label(s.minute), s.strategy
    );
    for r in &s.areas {
        println!("{:<16} free {:>4}/{:<4}", r.name, r.available, r.total);
    }
    println!("{:<16} free {:>4}/{:<4}", "Total", s.available, s.total);
    if let Appended::Rows { path, rows, created } = &s.appended {
        let verb = if *created { "Created" } else { "Appended to" };
        println!("{verb} {} ({rows} rows)", path.display());
    }
}

fn show(date: NaiveDate, opts: &AppOptions) -> Result<ExitCode> {
    let store = SnapshotStore::new(opts.store.dir.clone());
    let rows = store.load_day(date)?;
    let latest = store::latest_by_area(&rows);
    if latest.is_empty() {
        println!("No rows recorded for {date}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("=== {} · {} rows · {} areas ===", date, rows.len(), latest.len());
    for r in &latest {
        println!(
            "{:<16} free {:>4}/{:<4} at {}",
            r.name, r.available, r.total, clock::minute_label(r.minute)
        );
    }
    Ok(ExitCode::SUCCESS)
}
