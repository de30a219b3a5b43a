use crate::analyzers::aggregate::aggregate_drivers;
use crate::analyzers::types::{DriverStats, LineStats};
use crate::branches::BranchDirectory;
use crate::error::Result;
use crate::segmenter::{Trip, segment, segment_chronological};
use crate::settings::Settings;
use crate::sources::{RawTelemetryRow, read_branches, read_telemetry, read_valid_lines};
use crate::telemetry::normalize;
use std::collections::HashMap;
use tracing::info;

/// Everything a run derives, from trips up to the driver report.
#[derive(Debug)]
pub struct RunOutput {
    pub trips: Vec<Trip>,
    pub lines: Vec<LineStats>,
    pub drivers: Vec<DriverStats>,
}

/// Builds the branch directory, with its valid-line allow-list, from the
/// sources named in `settings`.
pub fn load_directory(settings: &Settings) -> Result<BranchDirectory> {
    let branches = read_branches(&settings.branches_path)?;
    let lines = read_valid_lines(&settings.valid_lines_path)?;

    Ok(BranchDirectory::load(branches)?.with_valid_lines(lines.iter().map(|l| &l.line_id)))
}

/// Runs the pipeline over already-loaded rows.
///
/// The directory is borrowed for both branch matching and goal computation.
pub fn rate(
    rows: &[RawTelemetryRow],
    directory: &BranchDirectory,
    settings: &Settings,
) -> Result<RunOutput> {
    let records = normalize(rows, directory, settings.normalize_options())?;

    let trips = if settings.sort_by_start_time {
        segment_chronological(&records, &settings.timestamp_format)?
    } else {
        segment(&records)
    };

    let lines = directory.line_stats(&trips, settings.fuel_goal_std_multiplier);
    let goals: HashMap<String, f64> = lines
        .iter()
        .map(|l| (l.line_id.clone(), l.goal))
        .collect();
    let drivers = aggregate_drivers(&trips, &goals);

    let flagged = drivers.iter().filter(|d| d.exceeds_goal == Some(true)).count();
    info!(
        trips = trips.len(),
        lines = lines.len(),
        drivers = drivers.len(),
        flagged,
        "Rating complete"
    );

    Ok(RunOutput {
        trips,
        lines,
        drivers,
    })
}

/// Loads every source named in `settings` and runs the full pipeline.
/// Fails on the first malformed or missing input.
#[tracing::instrument(skip_all, fields(periods = settings.periods.len()))]
pub fn run(settings: &Settings) -> Result<RunOutput> {
    let directory = load_directory(settings)?;
    info!(
        branches = directory.branches().len(),
        valid_lines = directory.valid_lines().len(),
        "Branch directory ready"
    );

    let rows = read_telemetry(&settings.telemetry_dir, &settings.periods, settings.max_rows)?;
    rate(&rows, &directory, settings)
}
