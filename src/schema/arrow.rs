// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::debug;

use super::types::{ColumnStructure, TypeTag};

/// Column types a storage sink has to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Text,
    BigInt,
    Double,
    Date,
    Time,
    Timestamp,
    Bool,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageType::Text => "TEXT",
            StorageType::BigInt => "BIGINT",
            StorageType::Double => "DOUBLE PRECISION",
            StorageType::Date => "DATE",
            StorageType::Time => "TIME",
            StorageType::Timestamp => "TIMESTAMP",
            StorageType::Bool => "BOOLEAN",
        };
        f.write_str(s)
    }
}

/// One emitted column: what a sink needs to create it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub storage_type: StorageType,
    pub nullable: bool,
}

/// Map an inferred tag to its storage type.
///
/// - empty, str          → Text
/// - bool                → Bool
/// - int                 → BigInt
/// - float-*             → Double
/// - date-*              → Date
/// - time-*              → Time
/// - datetime-*          → Timestamp
///
/// `empty` (a column never seen with a value) lands on Text, the same as the
/// catch-all.
pub fn map_to_storage_type(tag: TypeTag) -> StorageType {
    match tag {
        TypeTag::Bool => StorageType::Bool,
        TypeTag::Int => StorageType::BigInt,
        TypeTag::FloatDot | TypeTag::FloatComma => StorageType::Double,
        TypeTag::DateYmd | TypeTag::DateMdy | TypeTag::DateDmy => StorageType::Date,
        TypeTag::Time24 | TypeTag::Time12 => StorageType::Time,
        TypeTag::DateTime24Ymd | TypeTag::DateTime12Mdy | TypeTag::DateTime24Dmy => {
            StorageType::Timestamp
        }
        TypeTag::Empty | TypeTag::Str => StorageType::Text,
    }
}

/// Arrow type used to carry a storage type into Parquet.
pub fn map_to_arrow_type(ty: StorageType) -> DataType {
    match ty {
        StorageType::Text => DataType::Utf8,
        StorageType::BigInt => DataType::Int64,
        StorageType::Double => DataType::Float64,
        StorageType::Date => DataType::Date32,
        StorageType::Time => DataType::Time64(TimeUnit::Microsecond),
        StorageType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        StorageType::Bool => DataType::Boolean,
    }
}

/// Emit the storage schema for a detected structure, in ordinal order.
pub fn emit_schema(structure: &[ColumnStructure]) -> Vec<ColumnSpec> {
    let mut cols: Vec<&ColumnStructure> = structure.iter().collect();
    cols.sort_by_key(|c| c.ordinal);
    cols.into_iter()
        .map(|col| {
            let storage_type = map_to_storage_type(col.ty);
            debug!(
                ordinal = col.ordinal,
                column = %col.name,
                ty = %col.ty,
                storage = %storage_type,
                "column mapped"
            );
            ColumnSpec {
                name: col.name.clone(),
                storage_type,
                nullable: col.nullable,
            }
        })
        .collect()
}

/// Build an ArrowSchema (inside an Arc) from emitted column specs.
pub fn build_arrow_schema(cols: &[ColumnSpec]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col.storage_type), col.nullable))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
