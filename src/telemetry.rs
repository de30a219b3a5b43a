//! Turns raw telemetry rows into typed records annotated with nearby branches.

use serde::Serialize;
use tracing::{debug, info};

use crate::branches::BranchDirectory;
use crate::error::Result;
use crate::parser::{Coordinates, parse_coordinates, parse_decimal};
use crate::sources::RawTelemetryRow;

/// Driver id used by the telemetry provider when no driver is assigned.
pub const UNASSIGNED_DRIVER: &str = "-";

/// Thresholds applied while normalizing.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Rows with a shorter distance are idle/noise readings and are dropped.
    pub minimum_displacement_km: f64,
    /// A coordinate strictly closer than this to a branch is "at" the branch.
    pub branch_proximity_threshold_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub fleet: String,
    pub driver_id: String,
    pub start: String,
    pub end: String,
    pub initial_coord: Coordinates,
    pub final_coord: Coordinates,
    pub distance_km: f64,
    pub fuel_liters: f64,
    pub initial_branch: Option<String>,
    pub final_branch: Option<String>,
}

/// Parses, filters and annotates `rows`, preserving their order.
///
/// Rows without an assigned driver and rows below the minimum displacement
/// are dropped. Every numeric field is parsed before filtering, so a
/// malformed value fails the run even on a row that would have been dropped.
///
/// # Errors
///
/// Returns [`crate::error::RaterError::MalformedNumericField`] on the first
/// unparsable distance, fuel or coordinate value.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn normalize(
    rows: &[RawTelemetryRow],
    directory: &BranchDirectory,
    options: NormalizeOptions,
) -> Result<Vec<TelemetryRecord>> {
    let mut records = Vec::with_capacity(rows.len());
    let mut unassigned = 0usize;
    let mut too_short = 0usize;

    for row in rows {
        let distance_km = parse_decimal("Distância (Km)", &row.distance)?;
        let fuel_liters = parse_decimal("Total Litros Consumido", &row.fuel)?;
        let initial_coord = parse_coordinates("Lat/Long inicial", &row.initial_coord)?;
        let final_coord = parse_coordinates("Lat/Long final", &row.final_coord)?;

        if row.driver_id == UNASSIGNED_DRIVER {
            unassigned += 1;
            continue;
        }

        if distance_km < options.minimum_displacement_km {
            too_short += 1;
            continue;
        }

        let threshold = options.branch_proximity_threshold_km;
        records.push(TelemetryRecord {
            fleet: row.fleet.clone(),
            driver_id: row.driver_id.clone(),
            start: row.start.clone(),
            end: row.end.clone(),
            initial_coord,
            final_coord,
            distance_km,
            fuel_liters,
            initial_branch: directory
                .closest_branch(initial_coord, threshold)
                .map(str::to_string),
            final_branch: directory
                .closest_branch(final_coord, threshold)
                .map(str::to_string),
        });
    }

    debug!(unassigned, too_short, "Rows dropped during normalization");
    info!(records = records.len(), "Telemetry normalized");
    Ok(records)
}
