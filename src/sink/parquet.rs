// src/sink/parquet.rs

use arrow::{
    array::{
        ArrayRef, BooleanBuilder, Date32Builder, Float64Builder, Int64Builder, StringBuilder,
        Time64MicrosecondBuilder, TimestampMicrosecondBuilder,
    },
    datatypes::Schema as ArrowSchema,
    record_batch::RecordBatch,
};
use chrono::{NaiveDate, Timelike};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression, GzipLevel, ZstdLevel},
    file::{
        properties::WriterProperties,
        reader::{FileReader, SerializedFileReader},
    },
    format::KeyValue,
};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

use super::{Sink, TableName};
use crate::error::{ConfigError, SinkError};
use crate::process::convert::{CellValue, TypedRow};
use crate::schema::arrow::{build_arrow_schema, ColumnSpec, StorageType};

pub const DEFAULT_BATCH_SIZE: usize = 65_536;

/// Parquet key/value metadata keys for the target table.
pub const META_SCHEMA: &str = "csvcast.schema";
pub const META_TABLE: &str = "csvcast.table";

/// Parse a compression name as accepted on the command line.
pub fn parse_compression(name: &str) -> Result<Compression, ConfigError> {
    let c = match name.to_ascii_lowercase().as_str() {
        "uncompressed" | "none" => Compression::UNCOMPRESSED,
        "snappy" => Compression::SNAPPY,
        "gzip" => Compression::GZIP(GzipLevel::default()),
        "zstd" => Compression::ZSTD(ZstdLevel::default()),
        "brotli" => Compression::BROTLI(
            BrotliLevel::try_new(5).map_err(|_| ConfigError::Compression(name.to_string()))?,
        ),
        _ => return Err(ConfigError::Compression(name.to_string())),
    };
    Ok(c)
}

/// Writes one table into a single Parquet file.
///
/// Data goes to `<output>.tmp` first and is renamed over `<output>` on
/// [`Sink::finish`], replacing any previous file. Dropping the sink before
/// that removes the temp file.
pub struct ParquetSink {
    final_path: PathBuf,
    tmp_path: PathBuf,
    compression: Compression,
    batch_size: usize,
    columns: Vec<ColumnSpec>,
    schema: Option<Arc<ArrowSchema>>,
    writer: Option<ArrowWriter<File>>,
    rows_written: u64,
    /// `tmp_path` exists on disk and has not been moved into place.
    tmp_live: bool,
}

impl ParquetSink {
    pub fn new<P: AsRef<Path>>(output: P, compression: Compression, batch_size: usize) -> Self {
        let final_path = output.as_ref().to_path_buf();
        let mut tmp_name = final_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        Self {
            final_path,
            tmp_path: PathBuf::from(tmp_name),
            compression,
            batch_size: batch_size.max(1),
            columns: Vec::new(),
            schema: None,
            writer: None,
            rows_written: 0,
            tmp_live: false,
        }
    }

    fn build_batch(&self, schema: &Arc<ArrowSchema>, rows: &[TypedRow]) -> Result<RecordBatch, SinkError> {
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());
        for (idx, spec) in self.columns.iter().enumerate() {
            arrays.push(build_column(spec, idx, rows)?);
        }
        RecordBatch::try_new(schema.clone(), arrays).map_err(Into::into)
    }
}

impl Sink for ParquetSink {
    #[tracing::instrument(level = "info", skip(self, columns), fields(path = %self.final_path.display()))]
    fn create_table(&mut self, table: &TableName, columns: &[ColumnSpec]) -> Result<(), SinkError> {
        if self.writer.is_some() || self.schema.is_some() {
            return Err(SinkError::State("table already created"));
        }
        if let Some(dir) = self.final_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| SinkError::Io {
                action: "creating directory",
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut metadata = vec![KeyValue::new(META_TABLE.to_string(), table.name.clone())];
        if let Some(schema) = &table.schema {
            metadata.push(KeyValue::new(META_SCHEMA.to_string(), schema.clone()));
        }
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_dictionary_enabled(true)
            .set_key_value_metadata(Some(metadata))
            .build();

        let schema = build_arrow_schema(columns);
        let file = File::create(&self.tmp_path).map_err(|source| SinkError::Io {
            action: "creating",
            path: self.tmp_path.clone(),
            source,
        })?;
        self.tmp_live = true;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        self.columns = columns.to_vec();
        self.schema = Some(schema);
        self.writer = Some(writer);
        info!(table = %table, columns = columns.len(), "table created");
        Ok(())
    }

    fn insert_rows(&mut self, rows: &[TypedRow]) -> Result<u64, SinkError> {
        let schema = self
            .schema
            .clone()
            .ok_or(SinkError::State("rows inserted before the table was created"))?;
        if self.writer.is_none() {
            return Err(SinkError::State("rows inserted after finish"));
        }

        for (chunk_idx, chunk) in rows.chunks(self.batch_size).enumerate() {
            let batch = self.build_batch(&schema, chunk)?;
            let writer = self
                .writer
                .as_mut()
                .ok_or(SinkError::State("rows inserted after finish"))?;
            writer.write(&batch)?;
            debug!(chunk = chunk_idx, rows = batch.num_rows(), "wrote batch");
        }
        self.rows_written += rows.len() as u64;
        Ok(rows.len() as u64)
    }

    /// Close the file, move it into place and read back its row count.
    fn finish(&mut self) -> Result<u64, SinkError> {
        let writer = self
            .writer
            .take()
            .ok_or(SinkError::State("finish called without an open table"))?;
        writer.close()?;

        fs::rename(&self.tmp_path, &self.final_path).map_err(|source| SinkError::Io {
            action: "renaming temp file onto",
            path: self.final_path.clone(),
            source,
        })?;
        self.tmp_live = false;

        let file = File::open(&self.final_path).map_err(|source| SinkError::Io {
            action: "reopening",
            path: self.final_path.clone(),
            source,
        })?;
        let reader = SerializedFileReader::new(file)?;
        let confirmed = reader.metadata().file_metadata().num_rows() as u64;
        if confirmed != self.rows_written {
            warn!(confirmed, written = self.rows_written, "parquet row count differs");
        }
        info!(path = %self.final_path.display(), rows = confirmed, "parquet file written");
        Ok(confirmed)
    }
}

impl Drop for ParquetSink {
    fn drop(&mut self) {
        drop(self.writer.take());
        if self.tmp_live {
            if let Err(e) = fs::remove_file(&self.tmp_path) {
                warn!(path = %self.tmp_path.display(), "could not remove temp file: {}", e);
            }
        }
    }
}

/// Build the Arrow array for column `idx` of `rows`.
fn build_column(spec: &ColumnSpec, idx: usize, rows: &[TypedRow]) -> Result<ArrayRef, SinkError> {
    let cells = rows.iter().map(|r| r.get(idx).unwrap_or(&CellValue::Null));
    let mismatch = |v: &CellValue| SinkError::ValueMismatch {
        column: spec.name.clone(),
        storage: spec.storage_type,
        value: format!("{:?}", v),
    };

    let array: ArrayRef = match spec.storage_type {
        StorageType::Text => {
            let mut b = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Text(s) => b.append_value(s),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
        StorageType::BigInt => {
            let mut b = Int64Builder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Int(v) => b.append_value(*v),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
        StorageType::Double => {
            let mut b = Float64Builder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Float(v) => b.append_value(*v),
                    CellValue::Int(v) => b.append_value(*v as f64),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
        StorageType::Date => {
            let mut b = Date32Builder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Date(d) => b.append_value(days_since_epoch(*d)),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
        StorageType::Time => {
            let mut b = Time64MicrosecondBuilder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Time(t) => b.append_value(
                        t.num_seconds_from_midnight() as i64 * 1_000_000
                            + (t.nanosecond() / 1_000) as i64,
                    ),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
        StorageType::Timestamp => {
            let mut b = TimestampMicrosecondBuilder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Timestamp(ts) => b.append_value(ts.and_utc().timestamp_micros()),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
        StorageType::Bool => {
            let mut b = BooleanBuilder::with_capacity(rows.len());
            for cell in cells {
                match cell {
                    CellValue::Null => b.append_null(),
                    CellValue::Bool(v) => b.append_value(*v),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(b.finish())
        }
    };
    Ok(array)
}

fn days_since_epoch(d: NaiveDate) -> i32 {
    d.signed_duration_since(NaiveDate::default()).num_days() as i32
}
