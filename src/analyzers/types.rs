//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fuel consumption statistics for one delivery line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStats {
    pub line_id: String,
    pub trip_count: usize,
    pub avg_fuel_consumption: f64,
    /// Sample standard deviation; `None` with a single observation.
    pub stddev: Option<f64>,
    /// `avg + k * stddev`, or just `avg` when `stddev` is undefined.
    pub goal: f64,
}

/// Per-driver summary, one row of the driver report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStats {
    pub driver_id: String,
    pub trip_count: usize,
    pub avg_fuel_consumption: Option<f64>,
    pub avg_fuel_consumption_goal: Option<f64>,
    /// `avg_fuel_consumption > avg_fuel_consumption_goal`; `None` if either is undefined.
    pub exceeds_goal: Option<bool>,
}

/// Driver report document written by the `report --json` command.
#[derive(Debug, Serialize)]
pub struct DriverReport {
    pub generated_at: DateTime<Utc>,
    pub fuel_goal_std_multiplier: f64,
    pub drivers: Vec<DriverStats>,
}
