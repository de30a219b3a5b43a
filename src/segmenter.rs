//! Trip segmentation.
//!
//! Records are grouped per (fleet, driver) and each group is scanned forward.
//! A trip opens at the first record whose initial coordinate is at a branch
//! and closes at the first later-or-same record whose final coordinate is at
//! a *different* branch. Scanning resumes right after the closing record.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::error::{RaterError, Result};
use crate::telemetry::TelemetryRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub fleet: String,
    pub driver_id: String,
    /// Origin and destination ids concatenated, without separator.
    pub line_id: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub fuel_liters: f64,
    pub record_count: usize,
    /// `distance / fuel`; `None` when no fuel was recorded over the span.
    pub avg_fuel_consumption: Option<f64>,
}

/// Splits `records` into (fleet, driver) groups. Groups come out in order of
/// first appearance and keep their records in ingestion order.
pub fn group_by_fleet_driver(records: &[TelemetryRecord]) -> Vec<Vec<&TelemetryRecord>> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<Vec<&TelemetryRecord>> = Vec::new();

    for record in records {
        let key = (record.fleet.as_str(), record.driver_id.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    groups
}

/// Extracts the trips of a single (fleet, driver) group.
pub fn segment_group(group: &[&TelemetryRecord]) -> Vec<Trip> {
    let mut trips = Vec::new();
    let mut cursor = 0;

    while cursor < group.len() {
        let Some((start, origin)) = group[cursor..]
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.initial_branch.as_deref().map(|b| (cursor + i, b)))
        else {
            break;
        };

        // Arriving back at the origin is not a trip; keep looking past it.
        let Some((end, destination)) =
            group[start..]
                .iter()
                .enumerate()
                .find_map(|(i, r)| match r.final_branch.as_deref() {
                    Some(b) if b != origin => Some((start + i, b)),
                    _ => None,
                })
        else {
            break;
        };

        let span = &group[start..=end];
        let distance_km: f64 = span.iter().map(|r| r.distance_km).sum();
        let fuel_liters: f64 = span.iter().map(|r| r.fuel_liters).sum();

        trips.push(Trip {
            fleet: group[start].fleet.clone(),
            driver_id: group[start].driver_id.clone(),
            line_id: format!("{origin}{destination}"),
            origin: origin.to_string(),
            destination: destination.to_string(),
            distance_km,
            fuel_liters,
            record_count: span.len(),
            avg_fuel_consumption: (fuel_liters > 0.0).then(|| distance_km / fuel_liters),
        });

        cursor = end + 1;
    }

    trips
}

/// Segments every group of `records`, assuming ingestion order is
/// chronological order.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn segment(records: &[TelemetryRecord]) -> Vec<Trip> {
    let groups = group_by_fleet_driver(records);
    let trips: Vec<Trip> = groups.iter().flat_map(|g| segment_group(g)).collect();

    debug!(groups = groups.len(), trips = trips.len(), "Segmentation finished");
    trips
}

/// Like [`segment`], but first sorts each group by start timestamp. The sort
/// is stable, so records sharing a timestamp keep their ingestion order.
///
/// # Errors
///
/// Returns [`RaterError::MalformedTimestamp`] if any start timestamp does not
/// match `format`.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn segment_chronological(records: &[TelemetryRecord], format: &str) -> Result<Vec<Trip>> {
    let mut trips = Vec::new();

    for group in group_by_fleet_driver(records) {
        let mut keyed = group
            .into_iter()
            .map(|r| Ok((parse_timestamp(&r.start, format)?, r)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by_key(|(ts, _)| *ts);

        let sorted: Vec<&TelemetryRecord> = keyed.into_iter().map(|(_, r)| r).collect();
        trips.extend(segment_group(&sorted));
    }

    debug!(trips = trips.len(), "Chronological segmentation finished");
    Ok(trips)
}

fn parse_timestamp(value: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), format).map_err(|_| {
        RaterError::MalformedTimestamp {
            value: value.to_string(),
            format: format.to_string(),
        }
    })
}
