//! Parsers for the locale-formatted fields of the telemetry and branch sources.

use geo::Point;
use serde::Serialize;

use crate::error::{RaterError, Result};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `geo` points are `(x, y)`, i.e. longitude first.
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Parses a decimal that may use a comma as its decimal separator (`"12,5"`).
///
/// # Errors
///
/// Returns [`RaterError::MalformedNumericField`] if the value is not a finite number.
pub fn parse_decimal(field: &str, value: &str) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| RaterError::numeric(field, value))?;

    if !parsed.is_finite() {
        return Err(RaterError::numeric(field, value));
    }
    Ok(parsed)
}

/// Parses a `"lat, long"` pair. The halves are split on the first `", "`, so
/// each half may itself use a decimal comma (`"-23,55, -46,63"`).
///
/// # Errors
///
/// Returns [`RaterError::MalformedNumericField`] if the separator is missing
/// or either half is not a number.
pub fn parse_coordinates(field: &str, value: &str) -> Result<Coordinates> {
    let (lat, lon) = value
        .split_once(", ")
        .ok_or_else(|| RaterError::numeric(field, value))?;

    let lat = parse_decimal(field, lat).map_err(|_| RaterError::numeric(field, value))?;
    let lon = parse_decimal(field, lon).map_err(|_| RaterError::numeric(field, value))?;

    Ok(Coordinates { lat, lon })
}
