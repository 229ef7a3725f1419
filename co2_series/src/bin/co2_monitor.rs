use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use co2_series::{
    DayKey, Monitor, SystemClock,
    config::{Settings, load_settings_path},
    db::migrate,
    ingest,
    store::SqliteStore,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "CO2 monitor CLI")]
struct Cli {
    /// Settings file (TOML); built-in defaults when omitted.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create or upgrade the database schema.
    Migrate,
    /// Print today's payload once.
    Live,
    /// Print today's payload every poll interval until Ctrl-C.
    Watch,
    /// Print the payload for one day.
    History {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: DayKey,
    },
    /// List days that have readings, newest first.
    Days,
    /// Store bare integer lines from stdin as readings.
    Ingest,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let settings = match &cli.config {
        Some(path) => load_settings_path(path)?,
        None => Settings::default(),
    }
    .with_env_overrides()?;

    match cli.cmd {
        Cmd::Migrate => {
            migrate::run_all(&settings.database_url)?;
            info!(database_url = %settings.database_url, "migrations applied");
        }
        Cmd::Live => {
            let monitor = open_monitor(&settings)?;
            emit(&monitor.live_payload())?;
        }
        Cmd::Watch => watch(&settings)?,
        Cmd::History { date } => {
            let monitor = open_monitor(&settings)?;
            let payload = monitor.history_payload(date);
            if payload.is_none() {
                warn!(%date, "no readings on this day");
            }
            emit(&payload)?;
        }
        Cmd::Days => {
            let monitor = open_monitor(&settings)?;
            emit(&monitor.available_days())?;
        }
        Cmd::Ingest => {
            let mut store = open_store(&settings)?;
            let report = ingest::ingest_lines(io::stdin().lock(), &mut store, &SystemClock)?;
            if report.failed > 0 {
                warn!(failed = report.failed, "some readings were not stored");
            }
        }
    }

    Ok(())
}

fn open_store(settings: &Settings) -> Result<SqliteStore> {
    migrate::run_all(&settings.database_url)?;
    SqliteStore::open(&settings.database_url, settings.calendar()?)
}

fn open_monitor(settings: &Settings) -> Result<Monitor<SqliteStore, SystemClock>> {
    Monitor::new(open_store(settings)?, SystemClock, settings)
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn watch(settings: &Settings) -> Result<()> {
    let monitor = open_monitor(settings)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    rt.block_on(poll_until_interrupted(&monitor, settings))
}

async fn poll_until_interrupted(
    monitor: &Monitor<SqliteStore, SystemClock>,
    settings: &Settings,
) -> Result<()> {
    let mut tick = tokio::time::interval(settings.poll_interval());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(every = ?settings.poll_interval(), "watching for new readings");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Some(payload) = monitor.live_payload() {
                    emit(&payload)?;
                }
            }
            res = tokio::signal::ctrl_c() => {
                res.context("listen for ctrl-c")?;
                info!("stopping");
                return Ok(());
            }
        }
    }
}
