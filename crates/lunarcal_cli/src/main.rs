//! `lunarcal` command-line entry point.
//!
//! Builds the day store on first use, then writes the requested date range
//! as an iCalendar file.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::info;
use lunarcal_core::db::open_db;
use lunarcal_core::{
    default_log_level, init_logging, CalendarConfig, CalendarService, DateRange, DirectorySource,
    SqliteDayRepository,
};
use std::path::{Path, PathBuf};
use std::process;

/// Chinese lunar calendar (1901-2100) as iCalendar, from the Hong Kong
/// Observatory tables.
#[derive(Parser)]
#[command(name = "lunarcal", version, about)]
struct Cli {
    /// First day to export (YYYY-MM-DD). Defaults to Jan 1 of last year.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day to export (YYYY-MM-DD). Defaults to Dec 31 of next year.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Application directory holding `db/`, `source/` and generated files.
    #[arg(long, default_value = ".")]
    app_dir: PathBuf,

    /// Override the day store path.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Override the directory of pre-downloaded `T{year}c.txt` files.
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Override the output `.ics` path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rebuild the day store even if it already exists.
    #[arg(long)]
    rebuild: bool,

    /// Log directory. Defaults to `<app-dir>/logs`.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Reject bad ranges before touching the store or the network cache.
    let range = requested_range(cli.start, cli.end, Local::now().date_naive())?;

    let app_dir = absolute(&cli.app_dir)?;
    let log_dir = match &cli.log_dir {
        Some(dir) => absolute(dir)?,
        None => app_dir.join("logs"),
    };
    let level = match cli.verbose {
        0 => default_log_level(),
        1 => "debug",
        _ => "trace",
    };
    init_logging(level, &log_dir).map_err(anyhow::Error::msg)?;

    let mut config = CalendarConfig::in_dir(&app_dir);
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(source_dir) = cli.source_dir {
        config.source_dir = source_dir;
    }

    let fresh = !config.store_exists();
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    let mut conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open day store `{}`", config.db_path.display()))?;
    let repo = SqliteDayRepository::try_new(&mut conn)?;
    let mut service = CalendarService::new(repo);

    if fresh || cli.rebuild {
        let source = DirectorySource::new(&config.source_dir);
        info!(
            "event=rebuild module=cli status=start fresh={fresh} source_dir={}",
            config.source_dir.display()
        );
        if let Err(err) = service.rebuild(&source) {
            drop(service);
            drop(conn);
            if fresh {
                discard_store(&config.db_path);
            }
            return Err(err).context("failed to build the day store");
        }
    }

    let output = match cli.output {
        Some(path) => path,
        None => config.output_path(range.explicit.as_ref()),
    };
    let events = service
        .export_to_file(&range.range, &output)
        .context("failed to export calendar")?;
    println!(
        "iCal lunar calendar from {} to {} saved to {} ({events} days)",
        range.range.start(),
        range.range.end(),
        output.display()
    );
    Ok(())
}

struct RequestedRange {
    range: DateRange,
    /// Set when the user named the range, which selects the output name.
    explicit: Option<DateRange>,
}

fn requested_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<RequestedRange> {
    let range = DateRange::from_bounds(start, end, today)?;
    let explicit = (start.is_some() || end.is_some()).then_some(range);
    Ok(RequestedRange { range, explicit })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

/// Removes a half-built store so the next run rebuilds it from scratch.
fn discard_store(db_path: &Path) {
    if let Err(err) = std::fs::remove_file(db_path) {
        log::warn!(
            "event=rebuild module=cli status=warn error_code=discard_failed path={} error={err}",
            db_path.display()
        );
    }
}
