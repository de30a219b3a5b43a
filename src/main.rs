//! CLI entry point for the fuel rater.
//!
//! Provides subcommands for rating drivers against their lines' fuel goals,
//! listing segmented trips, and listing per-line goal statistics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuel_rater::analyzers::analyzer::run;
use fuel_rater::output::{print_pretty, write_csv, write_csv_file, write_json_report};
use fuel_rater::settings::Settings;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fuel_rater")]
#[command(about = "Segment fleet telemetry into trips and rate drivers' fuel consumption", long_about = None)]
struct Cli {
    /// Settings file (falls back to $RATER_SETTINGS, then settings.json)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Override the number of telemetry rows to read
    #[arg(long, global = true)]
    max_rows: Option<usize>,

    /// Sort each driver's records by start timestamp before segmenting
    #[arg(long, global = true, default_value_t = false)]
    sort_by_start_time: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate every driver against the fuel goals of the lines they drove
    Report {
        /// File to write the report to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a JSON document instead of CSV
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the trips carved out of the telemetry
    Trips {
        /// CSV file to write trips to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List per-line consumption statistics and goals
    Lines {
        /// CSV file to write line statistics to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fuel_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fuel_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings_path = cli
        .settings
        .or_else(|| std::env::var_os("RATER_SETTINGS").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("settings.json"));
    let mut settings = Settings::load(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    if cli.max_rows.is_some() {
        settings.max_rows = cli.max_rows;
    }
    if cli.sort_by_start_time {
        settings.sort_by_start_time = true;
    }

    info!(
        settings = %settings_path.display(),
        periods = settings.periods.len(),
        max_rows = settings.max_rows,
        sort_by_start_time = settings.sort_by_start_time,
        "Settings loaded"
    );

    let output = run(&settings).context("rating run failed")?;

    match cli.command {
        Commands::Report { output: path, json } => {
            print_pretty(&output.drivers);
            let flagged = output
                .drivers
                .iter()
                .filter(|d| d.exceeds_goal == Some(true))
                .count();
            info!(drivers = output.drivers.len(), flagged, "Driver report");

            if json {
                let multiplier = settings.fuel_goal_std_multiplier;
                match path {
                    Some(path) => {
                        write_json_report(File::create(&path)?, output.drivers, multiplier)?;
                        info!(path = %path.display(), "JSON report written");
                    }
                    None => {
                        write_json_report(std::io::stdout().lock(), output.drivers, multiplier)?
                    }
                }
            } else {
                emit_csv(path.as_deref(), &output.drivers)?;
            }
        }
        Commands::Trips { output: path } => {
            let undefined = output
                .trips
                .iter()
                .filter(|t| t.avg_fuel_consumption.is_none())
                .count();
            info!(trips = output.trips.len(), undefined, "Trip list");
            emit_csv(path.as_deref(), &output.trips)?;
        }
        Commands::Lines { output: path } => {
            info!(lines = output.lines.len(), "Line statistics");
            emit_csv(path.as_deref(), &output.lines)?;
        }
    }

    Ok(())
}

/// Writes `rows` as CSV to `path`, or to stdout when no path is given.
fn emit_csv<T: Serialize>(path: Option<&Path>, rows: &[T]) -> Result<()> {
    match path {
        Some(path) => {
            write_csv_file(path, rows)?;
            info!(path = %path.display(), rows = rows.len(), "CSV written");
        }
        None => write_csv(std::io::stdout().lock(), rows)?,
    }
    Ok(())
}
