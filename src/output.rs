//! Output formatting and persistence for rating results.
//!
//! Supports pretty-printing through the log, CSV tables and a JSON driver report.

use anyhow::Result;
use chrono::Utc;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::{DriverReport, DriverStats};

/// Logs driver statistics using Rust's debug pretty-print format.
pub fn print_pretty(drivers: &[DriverStats]) {
    for driver in drivers {
        debug!("{:#?}", driver);
    }
}

/// Writes `rows` as a CSV table to `writer`, with a header row.
///
/// `None` fields become empty cells.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `rows` as a CSV table to the file at `path`, replacing it.
pub fn write_csv_file<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV");
    write_csv(File::create(path)?, rows)
}

/// Writes the driver report as a JSON document stamped with the current time.
pub fn write_json_report<W: Write>(
    writer: W,
    drivers: Vec<DriverStats>,
    fuel_goal_std_multiplier: f64,
) -> Result<()> {
    let report = DriverReport {
        generated_at: Utc::now(),
        fuel_goal_std_multiplier,
        drivers,
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn drivers() -> Vec<DriverStats> {
        vec![
            DriverStats {
                driver_id: "222".to_string(),
                trip_count: 2,
                avg_fuel_consumption: Some(3.5),
                avg_fuel_consumption_goal: Some(3.0),
                exceeds_goal: Some(true),
            },
            DriverStats {
                driver_id: "111".to_string(),
                trip_count: 1,
                avg_fuel_consumption: Some(2.0),
                avg_fuel_consumption_goal: None,
                exceeds_goal: None,
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&drivers());
    }

    #[test]
    fn test_write_csv_header_and_empty_cells() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &drivers()).unwrap();

        let content = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "driver_id,trip_count,avg_fuel_consumption,avg_fuel_consumption_goal,exceeds_goal",
                "222,2,3.5,3.0,true",
                "111,1,2.0,,",
            ]
        );
    }

    #[test]
    fn test_write_csv_file_replaces_content() {
        let path = temp_path("fuel_rater_test_report.csv");
        let _ = fs::remove_file(&path);

        write_csv_file(&path, &drivers()).unwrap();
        write_csv_file(&path, &drivers()[..1]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_report() {
        let mut buf = Vec::new();
        write_json_report(&mut buf, drivers(), 1.5).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["fuel_goal_std_multiplier"], 1.5);
        assert_eq!(value["drivers"][0]["driver_id"], "222");
        assert!(value["drivers"][1]["exceeds_goal"].is_null());
        assert!(value["generated_at"].is_string());
    }
}
