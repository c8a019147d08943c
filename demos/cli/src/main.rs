use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use deadline_core::memory::{FixedClock, ManualTimers, MemoryHost, MemoryPage, TableFixture};
use deadline_core::{
    classify, format_remaining, parse_timestamp, Clock, ScanConfig, ScanController,
    SystemClock, Urgency,
};
use flexi_logger::Logger;

#[derive(Parser, Debug)]
#[command(
    name = "deadline-cli",
    about = "Classify placement-portal deadlines outside the browser."
)]
struct Args {
    /// Log level written to stderr (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify `DD-MM-YYYY HH:MM` timestamps.
    Classify {
        timestamps: Vec<String>,
        /// Reference instant, same format. Defaults to the local time.
        #[arg(long)]
        now: Option<String>,
    },
    /// Run scan ticks over a JSON table fixture.
    Scan {
        #[arg(short, long)]
        table: PathBuf,
        #[arg(long)]
        now: Option<String>,
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        #[arg(long)]
        first_row: Option<u32>,
        #[arg(long)]
        last_row: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = Logger::try_with_str(&args.log_level)
        .with_context(|| format!("invalid log level {:?}", args.log_level))?
        .start()
        .context("cannot start logger")?;

    match args.command {
        Command::Classify { timestamps, now } => run_classify(&timestamps, now.as_deref()),
        Command::Scan {
            table,
            now,
            ticks,
            first_row,
            last_row,
        } => run_scan(&table, now.as_deref(), ticks, first_row, last_row),
    }
}

fn run_classify(timestamps: &[String], now: Option<&str>) -> anyhow::Result<()> {
    let now = now_or(now)?;
    for text in timestamps {
        match parse_timestamp(text) {
            Some(deadline) => {
                let status = classify(deadline.instant(), now);
                println!(
                    "{text}\t{}\t{}",
                    status.urgency.label(),
                    format_remaining(deadline.instant(), now)
                );
            }
            None => println!("{text}\tunparseable"),
        }
    }
    Ok(())
}

fn run_scan(
    table: &Path,
    now: Option<&str>,
    ticks: u32,
    first_row: Option<u32>,
    last_row: Option<u32>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(table)
        .with_context(|| format!("cannot read table {table:?}"))?;
    let fixture: TableFixture =
        serde_json::from_str(&raw).with_context(|| format!("invalid table {table:?}"))?;

    let defaults = ScanConfig::default();
    let config = ScanConfig {
        first_row: first_row.unwrap_or(defaults.first_row),
        last_row: last_row.unwrap_or(defaults.last_row),
        ..defaults
    };
    let page = MemoryPage::from_fixture(config.address_template()?, &fixture);
    let host = MemoryHost::new().with_frame(&config.frame_name, page.clone());
    let clock = FixedClock::new(now_or(now)?);

    let mut scanner = ScanController::new(config, host, ManualTimers::new(), clock)?;
    scanner.start()?;
    for tick in 1..=ticks {
        let report = scanner.tick();
        println!(
            "tick {tick}: {} rows with text, {} highlighted",
            report.resolved, report.highlighted
        );
    }
    scanner.stop();

    for row in &fixture.rows {
        let Some(cell) = page.deadline_cell(row.row) else {
            continue;
        };
        let status = Urgency::ALL
            .into_iter()
            .find(|urgency| cell.has_class(urgency.css_class()))
            .map(Urgency::label)
            .unwrap_or("-");
        let title = cell.title();
        let remaining = title.lines().last().unwrap_or_default();
        println!("row {}\t{:?}\t{status}\t{remaining}", row.row, cell.text());
    }
    Ok(())
}

/// Parses `--now`, falling back to the local wall-clock time.
fn now_or(text: Option<&str>) -> anyhow::Result<NaiveDateTime> {
    match text {
        Some(text) => parse_timestamp(text)
            .map(|deadline| deadline.instant())
            .ok_or_else(|| anyhow!("--now must look like DD-MM-YYYY HH:MM, got {text:?}")),
        None => Ok(SystemClock.now()),
    }
}
