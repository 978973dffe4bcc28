use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::process::{check_width, date_parser, utils, RowSource};
use crate::schema::types::{ColumnStructure, TypeTag};

/// A single coerced cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Text(String),
}

/// Cells of one data row, aligned by ordinal with the detected structure.
pub type TypedRow = Vec<CellValue>;

/// What an empty cell in a nullable `int` column becomes.
///
/// `ZeroFill` exists for storage engines whose insert path cannot carry a
/// null integer; everything else should keep `Preserve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntNullPolicy {
    #[default]
    Preserve,
    ZeroFill,
}

/// Escaping applied to `str` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEscape {
    /// Pass text through unchanged (binary sinks).
    #[default]
    None,
    /// Backslash-escape `"` for textual bulk loaders.
    Quotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoerceOptions {
    pub int_nulls: IntNullPolicy,
    pub text_escape: TextEscape,
}

/// Convert one non-empty cell to the native value of `tag`.
///
/// Returns `None` when the text is not valid for the tag. Empty cells are
/// handled by the caller.
pub fn coerce_cell(raw: &str, tag: TypeTag) -> Option<CellValue> {
    let value = match tag {
        TypeTag::Empty | TypeTag::Str => CellValue::Text(raw.to_string()),
        TypeTag::Bool => CellValue::Bool(utils::parse_bool(raw)?),
        TypeTag::Int => CellValue::Int(utils::parse_int(raw)?),
        TypeTag::FloatDot | TypeTag::FloatComma => {
            let sep = tag.decimal_separator()?;
            // integers are valid members of a float column
            match utils::parse_int(raw) {
                Some(i) => CellValue::Float(i as f64),
                None => CellValue::Float(utils::parse_float(raw, sep)?),
            }
        }
        TypeTag::DateYmd | TypeTag::DateMdy | TypeTag::DateDmy => {
            CellValue::Date(date_parser::parse_date(raw, tag.date_order()?)?)
        }
        TypeTag::Time24 | TypeTag::Time12 => {
            CellValue::Time(date_parser::parse_time(raw, tag.clock()?)?)
        }
        TypeTag::DateTime24Ymd | TypeTag::DateTime12Mdy | TypeTag::DateTime24Dmy => {
            let (clock, order) = (tag.clock()?, tag.date_order()?);
            // bare dates widen to midnight
            match date_parser::parse_date(raw, order) {
                Some(d) => CellValue::Timestamp(d.and_hms_opt(0, 0, 0)?),
                None => CellValue::Timestamp(date_parser::parse_datetime(raw, clock, order)?),
            }
        }
    };
    Some(value)
}

/// Re-scan every row of `source` and convert each cell to its column's type.
///
/// Any malformed row or unparsable cell aborts the whole run; no rows are
/// returned in that case.
#[tracing::instrument(level = "info", skip(source, structure))]
pub fn convert_to_final_types<S: RowSource + ?Sized>(
    source: &S,
    structure: &[ColumnStructure],
    opts: CoerceOptions,
) -> Result<Vec<TypedRow>> {
    let start = Instant::now();
    for col in structure {
        debug!(ordinal = col.ordinal, column = %col.name, ty = %col.ty, "coercing column");
    }

    let mut out = Vec::new();
    for (idx, row) in source.rows()?.enumerate() {
        let row = row?;
        let row_no = idx as u64 + 1;
        check_width(row_no, structure.len(), &row)?;

        let typed = structure
            .iter()
            .zip(&row)
            .map(|(col, cell)| coerce_column_cell(row_no, col, cell, opts))
            .collect::<Result<TypedRow>>()?;
        out.push(typed);
    }

    info!(rows = out.len(), elapsed = ?start.elapsed(), "coerced rows");
    Ok(out)
}

fn coerce_column_cell(
    row_no: u64,
    col: &ColumnStructure,
    raw: &str,
    opts: CoerceOptions,
) -> Result<CellValue> {
    if raw.is_empty() {
        return match (col.ty, opts.int_nulls) {
            (TypeTag::Int, IntNullPolicy::ZeroFill) if col.nullable => Ok(CellValue::Int(0)),
            _ if col.nullable => Ok(CellValue::Null),
            _ => Err(ConvertError::UnexpectedNull {
                row: row_no,
                column: col.name.clone(),
            }),
        };
    }
    match coerce_cell(raw, col.ty) {
        Some(CellValue::Text(s)) if opts.text_escape == TextEscape::Quotes => {
            Ok(CellValue::Text(utils::escape_quotes(&s)))
        }
        Some(v) => Ok(v),
        None => Err(ConvertError::UnparsableCell {
            row: row_no,
            column: col.name.clone(),
            value: raw.to_string(),
            expected: col.ty,
        }),
    }
}
