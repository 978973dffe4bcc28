// src/sink/mod.rs
pub mod parquet;

use std::fmt;

use crate::error::SinkError;
use crate::process::convert::{CellValue, TypedRow};
use crate::schema::arrow::ColumnSpec;

pub use self::parquet::ParquetSink;

/// Optional schema plus table name of the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.filter(|s| !s.is_empty()),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "\"{}\".\"{}\"", schema, self.name),
            None => write!(f, "\"{}\"", self.name),
        }
    }
}

/// Storage that receives the emitted schema and the coerced rows.
///
/// Calls arrive in order: `create_table`, any number of `insert_rows`,
/// then `finish`, which returns the row count the storage confirms.
pub trait Sink {
    fn create_table(&mut self, table: &TableName, columns: &[ColumnSpec])
        -> Result<(), SinkError>;
    fn insert_rows(&mut self, rows: &[TypedRow]) -> Result<u64, SinkError>;
    fn finish(&mut self) -> Result<u64, SinkError>;
}

/// Keeps everything in memory; handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub table: Option<TableName>,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<TypedRow>,
    pub finished: bool,
}

impl Sink for MemorySink {
    fn create_table(
        &mut self,
        table: &TableName,
        columns: &[ColumnSpec],
    ) -> Result<(), SinkError> {
        if self.table.is_some() {
            return Err(SinkError::State("table already created"));
        }
        self.table = Some(table.clone());
        self.columns = columns.to_vec();
        Ok(())
    }

    fn insert_rows(&mut self, rows: &[TypedRow]) -> Result<u64, SinkError> {
        if self.table.is_none() {
            return Err(SinkError::State("rows inserted before the table was created"));
        }
        if self.finished {
            return Err(SinkError::State("rows inserted after finish"));
        }
        for row in rows {
            for (spec, cell) in self.columns.iter().zip(row) {
                if !spec.nullable && *cell == CellValue::Null {
                    return Err(SinkError::ValueMismatch {
                        column: spec.name.clone(),
                        storage: spec.storage_type,
                        value: "NULL".into(),
                    });
                }
            }
        }
        self.rows.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    fn finish(&mut self) -> Result<u64, SinkError> {
        self.finished = true;
        Ok(self.rows.len() as u64)
    }
}
