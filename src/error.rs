//! Error types for a conversion run.

use std::path::PathBuf;
use thiserror::Error;

use crate::schema::{arrow::StorageType, types::TypeTag};

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Everything that aborts a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    // === Input ===
    /// The CSV file cannot be opened.
    #[error("cannot open input {path}: {source}")]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a record failed (I/O or invalid UTF-8).
    #[error("cannot read input {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The input has no header row.
    #[error("input {path} has no header row")]
    MissingHeader { path: PathBuf },

    // === Content ===
    /// A data row whose cell count differs from the header.
    #[error("row {row} has {found} cells but the header has {expected} columns")]
    MalformedRow {
        row: u64,
        expected: usize,
        found: usize,
    },

    /// A cell that does not parse as its column's inferred type.
    #[error(
        "row {row}, column `{column}`: value {value:?} is not a valid {expected} \
         (try a larger --sample-limit or fix the source data)"
    )]
    UnparsableCell {
        row: u64,
        column: String,
        value: String,
        expected: TypeTag,
    },

    /// An empty cell in a column the sample saw no empty cells in.
    #[error(
        "row {row}, column `{column}`: empty cell in a column inferred as not nullable \
         (try a larger --sample-limit or fix the source data)"
    )]
    UnexpectedNull { row: u64, column: String },

    // === Outer ===
    #[error("storage sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConvertError {
    /// Process exit status: 3 for sink failures, 2 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Sink(_) => 3,
            _ => 2,
        }
    }
}

/// Failures raised by a storage sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// A coerced value that does not fit its column's storage type.
    #[error("column `{column}` expects {storage} values, got {value}")]
    ValueMismatch {
        column: String,
        storage: StorageType,
        value: String,
    },

    /// Calls made out of order (rows before a table, writes after finish).
    #[error("invalid sink state: {0}")]
    State(&'static str),
}

/// Invalid run options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("field separator must be a single ASCII character, got {0:?}")]
    Delimiter(String),

    #[error("batch size must be greater than zero")]
    BatchSize,

    #[error("unknown compression {0:?} (expected uncompressed, snappy, gzip, zstd or brotli)")]
    Compression(String),
}
