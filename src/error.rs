//! Error types for the dashboard engine.
//!
//! `thiserror` enums cover the library surface; the binary wraps them with
//! `anyhow` context.

use crate::models::Field;
use thiserror::Error;

/// Failures while reading a dataset or a lookup table.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is missing required column `{column}`")]
    MissingColumn { name: String, column: String },

    #[error("malformed row {line} in {name}: {reason}")]
    MalformedRow {
        name: String,
        line: u64,
        reason: String,
    },

    #[error("failed to parse {name}: {source}")]
    Csv {
        name: String,
        #[source]
        source: csv::Error,
    },
}

/// Caller-side mistakes in filter, chart or reduction setup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("unsupported reduction `{0}` (expected mean, count, min, max, median or sum)")]
    UnsupportedReduction(String),

    #[error("unknown sort order `{0}` (expected ascending, descending or none)")]
    UnknownOrder(String),

    #[error("unknown chart kind `{0}`")]
    UnknownChartKind(String),

    #[error("field `{0}` cannot be used as a group")]
    NotGroupable(Field),

    #[error("field `{0}` is not numeric and cannot take a range filter")]
    NotNumeric(Field),

    #[error("invalid range for `{field}`: {lo} > {hi}")]
    InvalidRange { field: Field, lo: f64, hi: f64 },

    #[error("malformed range `{0}` (expected LO..HI)")]
    MalformedRange(String),

    #[error("histogram needs at least one bin")]
    ZeroBins,

    #[error("chart `{0}` needs a group field")]
    MissingGroupField(String),

    #[error("chart `{0}` needs a secondary field")]
    MissingSecondaryField(String),
}

/// Failures while writing a filtered record set out.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
