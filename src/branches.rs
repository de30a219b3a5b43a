//! Known branch locations and the per-line goals derived from them.

use std::collections::{HashMap, HashSet};

use geo::{Distance, Geodesic};
use serde::Serialize;
use tracing::debug;

use crate::analyzers::aggregate::aggregate_lines;
use crate::analyzers::types::LineStats;
use crate::error::{RaterError, Result};
use crate::parser::{Coordinates, parse_coordinates};
use crate::segmenter::Trip;
use crate::sources::BranchRow;

/// A depot or terminal used as a trip boundary marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub id: String,
    pub address: String,
    pub coordinates: Coordinates,
}

/// The set of known branches, in source order, plus the allow-list of
/// lines that may receive a fuel goal.
///
/// Built once per run and only ever borrowed afterwards.
#[derive(Debug, Default)]
pub struct BranchDirectory {
    branches: Vec<Branch>,
    valid_lines: Vec<String>,
}

impl BranchDirectory {
    /// Builds a directory from already-typed branches.
    ///
    /// # Errors
    ///
    /// Returns [`RaterError::MalformedBranchRecord`] if two branches share an identifier.
    pub fn new(branches: Vec<Branch>) -> Result<Self> {
        let mut seen = HashSet::new();
        for branch in &branches {
            if !seen.insert(branch.id.as_str()) {
                return Err(RaterError::MalformedBranchRecord {
                    branch: branch.id.clone(),
                    reason: "duplicate identifier".to_string(),
                });
            }
        }

        Ok(Self {
            branches,
            valid_lines: Vec::new(),
        })
    }

    /// Parses raw branch rows, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`RaterError::MalformedBranchRecord`] if a coordinate cannot be parsed.
    pub fn load(rows: Vec<BranchRow>) -> Result<Self> {
        let branches = rows
            .into_iter()
            .map(|row| {
                let coordinates = parse_coordinates("LAT/LONG", &row.coordinates).map_err(|_| {
                    RaterError::MalformedBranchRecord {
                        branch: row.id.clone(),
                        reason: format!("unparsable coordinates {:?}", row.coordinates),
                    }
                })?;

                Ok(Branch {
                    id: row.id,
                    address: row.address,
                    coordinates,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = branches.len(), "Branches loaded");
        Self::new(branches)
    }

    /// Attaches the valid-line allow-list. Dashes are stripped from each id
    /// (`"SPO-RIO"` becomes `"SPORIO"`) and duplicates collapse to one.
    pub fn with_valid_lines<I, S>(mut self, line_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        self.valid_lines = line_ids
            .into_iter()
            .map(|id| id.as_ref().replace('-', ""))
            .filter(|id| seen.insert(id.clone()))
            .collect();

        debug!(count = self.valid_lines.len(), "Valid lines attached");
        self
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn valid_lines(&self) -> &[String] {
        &self.valid_lines
    }

    /// Returns the first branch, in directory order, whose geodesic distance
    /// to `coord` is strictly below `threshold_km`.
    ///
    /// This is a first-match search, not a nearest-match one: when several
    /// branches qualify, the one listed first wins even if another is closer.
    /// Line ids are built from this choice, so it must stay stable.
    pub fn closest_branch(&self, coord: Coordinates, threshold_km: f64) -> Option<&str> {
        let point = coord.to_point();

        self.branches
            .iter()
            .find(|branch| {
                Geodesic::distance(branch.coordinates.to_point(), point) / 1000.0 < threshold_km
            })
            .map(|branch| branch.id.as_str())
    }

    /// Per-line statistics for every allow-listed line observed in `trips`.
    pub fn line_stats(&self, trips: &[Trip], std_multiplier: f64) -> Vec<LineStats> {
        let valid: HashSet<&str> = self.valid_lines.iter().map(String::as_str).collect();
        aggregate_lines(trips, &valid, std_multiplier)
    }

    /// Maps each allow-listed, observed line id to its fuel consumption goal.
    pub fn line_goal(&self, trips: &[Trip], std_multiplier: f64) -> HashMap<String, f64> {
        self.line_stats(trips, std_multiplier)
            .into_iter()
            .map(|line| (line.line_id, line.goal))
            .collect()
    }
}
