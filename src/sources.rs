//! CSV readers for the branch, valid-line and telemetry sources.
//!
//! The sources carry Portuguese headers; they are mapped onto typed rows here
//! so that nothing downstream depends on the original column names.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{RaterError, Result};

/// A branch row as it appears in the branch source.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRow {
    #[serde(rename = "SIGLA")]
    pub id: String,
    #[serde(rename = "ENDEREÇO")]
    pub address: String,
    #[serde(rename = "LAT/LONG")]
    pub coordinates: String,
}

/// A row of the valid-line allow-list. Only `line_id` feeds the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidLineRow {
    #[serde(rename = "Origem")]
    pub origin: String,
    #[serde(rename = "Destino")]
    pub destination: String,
    #[serde(rename = "Org e Dst")]
    pub line_id: String,
    #[serde(rename = "Classificação de Linhas", default)]
    pub classification: String,
    #[serde(rename = "Linha", default)]
    pub name: String,
}

/// A raw telemetry row. Every field is still text; see
/// [`crate::telemetry::normalize`] for the typed form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTelemetryRow {
    #[serde(rename = "Frota")]
    pub fleet: String,
    #[serde(rename = "CPF")]
    pub driver_id: String,
    #[serde(rename = "Início")]
    pub start: String,
    #[serde(rename = "Fim")]
    pub end: String,
    #[serde(rename = "Lat/Long inicial")]
    pub initial_coord: String,
    #[serde(rename = "Lat/Long final")]
    pub final_coord: String,
    #[serde(rename = "Distância (Km)")]
    pub distance: String,
    #[serde(rename = "Total Litros Consumido")]
    pub fuel: String,
}

/// Path of the telemetry file for one reporting period: `{dir}/YYYY-MM.csv`.
///
/// If the plain file is absent but a gzip-compressed `YYYY-MM.csv.gz` sits
/// next to it, that one is used instead.
pub fn telemetry_path(dir: &Path, year: u16, month: u8) -> PathBuf {
    let plain = dir.join(format!("{year:04}-{month:02}.csv"));
    if plain.exists() {
        return plain;
    }

    let gz = dir.join(format!("{year:04}-{month:02}.csv.gz"));
    if gz.exists() { gz } else { plain }
}

fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|source| RaterError::MissingSourceFile {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn read_rows<T>(path: &Path, delimiter: u8) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let reader = open_source(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Source rows read");
    Ok(rows)
}

/// Reads the comma-delimited branch source.
pub fn read_branches(path: &Path) -> Result<Vec<BranchRow>> {
    read_rows(path, b',')
}

/// Reads the comma-delimited valid-line source.
pub fn read_valid_lines(path: &Path) -> Result<Vec<ValidLineRow>> {
    read_rows(path, b',')
}

/// Reads one semicolon-delimited telemetry file.
pub fn read_telemetry_file(path: &Path) -> Result<Vec<RawTelemetryRow>> {
    read_rows(path, b';')
}

/// Reads and concatenates the telemetry files of every period, in the order
/// given, keeping at most `max_rows` rows overall.
///
/// Every period file is read before the cap applies, so a missing period is
/// an error even when earlier periods already hold `max_rows` rows.
#[tracing::instrument(skip(dir, periods), fields(dir = %dir.display(), periods = periods.len()))]
pub fn read_telemetry(
    dir: &Path,
    periods: &[(u16, u8)],
    max_rows: Option<usize>,
) -> Result<Vec<RawTelemetryRow>> {
    let mut rows = Vec::new();

    for &(year, month) in periods {
        let path = telemetry_path(dir, year, month);
        let period_rows = read_telemetry_file(&path)?;
        if period_rows.is_empty() {
            warn!(path = %path.display(), "Telemetry file has no rows");
        }
        rows.extend(period_rows);
    }

    if let Some(max) = max_rows {
        rows.truncate(max);
    }

    info!(rows = rows.len(), "Telemetry rows loaded");
    Ok(rows)
}
