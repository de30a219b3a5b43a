//! Run settings, loaded from a JSON file.
//!
//! ```json
//! {
//!   "minimum_displacement_km": 1.0,
//!   "branch_proximity_threshold_km": 5.0,
//!   "fuel_goal_std_multiplier": 1.0,
//!   "branches_path": "data/branches.csv",
//!   "valid_lines_path": "data/valid_lines.csv",
//!   "telemetry_dir": "data/telemetry",
//!   "periods": [[2024, 1], [2024, 2]]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the settings file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RaterError, Result};
use crate::telemetry::NormalizeOptions;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub minimum_displacement_km: f64,
    pub branch_proximity_threshold_km: f64,
    #[serde(default)]
    pub fuel_goal_std_multiplier: f64,
    pub branches_path: PathBuf,
    pub valid_lines_path: PathBuf,
    pub telemetry_dir: PathBuf,
    /// `(year, month)` reporting periods, read in this order.
    pub periods: Vec<(u16, u8)>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub sort_by_start_time: bool,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl Settings {
    /// Loads and validates the settings at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| RaterError::MissingSourceFile {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or(Path::new("."));

        Self::from_json(&content, base)
    }

    /// Parses settings from JSON text, resolving relative paths against `base`.
    pub fn from_json(content: &str, base: &Path) -> Result<Self> {
        let mut settings: Settings = serde_json::from_str(content)
            .map_err(|e| RaterError::InvalidSettings(e.to_string()))?;

        settings.branches_path = base.join(&settings.branches_path);
        settings.valid_lines_path = base.join(&settings.valid_lines_path);
        settings.telemetry_dir = base.join(&settings.telemetry_dir);

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("minimum_displacement_km", self.minimum_displacement_km),
            ("branch_proximity_threshold_km", self.branch_proximity_threshold_km),
            ("fuel_goal_std_multiplier", self.fuel_goal_std_multiplier),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(RaterError::InvalidSettings(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.periods.is_empty() {
            return Err(RaterError::InvalidSettings(
                "periods must list at least one [year, month]".to_string(),
            ));
        }
        if let Some((year, month)) = self.periods.iter().find(|(_, m)| !(1..=12).contains(m)) {
            return Err(RaterError::InvalidSettings(format!(
                "invalid month in period [{year}, {month}]"
            )));
        }

        Ok(())
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            minimum_displacement_km: self.minimum_displacement_km,
            branch_proximity_threshold_km: self.branch_proximity_threshold_km,
        }
    }
}
