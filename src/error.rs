//! Error taxonomy for a rating run.
//!
//! Every variant is fatal: a run either processes the whole dataset or stops
//! at the first defect it finds.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RaterError {
    /// A decimal or coordinate field could not be parsed.
    #[error("malformed numeric field `{field}`: {value:?}")]
    MalformedNumericField { field: String, value: String },

    /// A branch row is unusable (bad coordinates or duplicate identifier).
    #[error("malformed branch record `{branch}`: {reason}")]
    MalformedBranchRecord { branch: String, reason: String },

    /// One of the input files could not be opened.
    #[error("cannot read source file {}: {source}", .path.display())]
    MissingSourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed timestamp {value:?} (expected format `{format}`)")]
    MalformedTimestamp { value: String, format: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl RaterError {
    pub(crate) fn numeric(field: &str, value: &str) -> Self {
        RaterError::MalformedNumericField {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RaterError>;
