//! Trip aggregation and driver rating.
//!
//! This module computes per-line fuel consumption goals from segmented trips,
//! rates each driver against the goals of the lines they drove, and wires the
//! sources, normalizer and segmenter into a single run.

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;
