//! Run options, optionally loaded from a YAML file.

use parquet::basic::Compression;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::ConfigError;
use crate::process::convert::{CoerceOptions, IntNullPolicy, TextEscape};
use crate::schema::derive::DEFAULT_SAMPLE_LIMIT;
use crate::sink::parquet::{parse_compression, DEFAULT_BATCH_SIZE};

/// Options for one conversion run.
///
/// ```yaml
/// delimiter: ";"
/// sample_limit: 500
/// int_nulls: zero-fill
/// text_escape: quotes
/// batch_size: 10000
/// compression: zstd
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    pub delimiter: String,
    pub sample_limit: usize,
    pub int_nulls: IntNullPolicy,
    pub text_escape: TextEscape,
    pub batch_size: usize,
    pub compression: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".into(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            int_nulls: IntNullPolicy::default(),
            text_escape: TextEscape::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            compression: "snappy".into(),
        }
    }
}

impl ConvertOptions {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check everything that can be checked before touching the input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter_byte()?;
        self.compression()?;
        if self.batch_size == 0 {
            return Err(ConfigError::BatchSize);
        }
        Ok(())
    }

    /// The field separator as a single byte; `\t` is accepted for tab.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_str() {
            "\\t" | "tab" => Ok(b'\t'),
            d if d.len() == 1 && d.is_ascii() => Ok(d.as_bytes()[0]),
            other => Err(ConfigError::Delimiter(other.to_string())),
        }
    }

    pub fn compression(&self) -> Result<Compression, ConfigError> {
        parse_compression(&self.compression)
    }

    pub fn coerce_options(&self) -> CoerceOptions {
        CoerceOptions {
            int_nulls: self.int_nulls,
            text_escape: self.text_escape,
        }
    }
}
