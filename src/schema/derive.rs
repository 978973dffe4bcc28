use tracing::{debug, info};

use super::classify::classify;
use super::lattice::join;
use super::types::{ColumnStructure, TypeTag};
use crate::error::Result;
use crate::process::{check_width, RowSource};

/// Default number of rows after the first that refine the inferred types.
pub const DEFAULT_SAMPLE_LIMIT: usize = 200;

/// Infer one [`ColumnStructure`] per header column.
///
/// Looks at the first `sample_limit + 1` data rows:
///  - every cell is classified and joined into its column's type
///  - an empty cell marks the column nullable
///  - `max_length` tracks the longest non-empty cell (reported for `str` only)
///
/// Rows past the sample are not read here; they may still disagree with the
/// inferred type and are caught during coercion.
#[tracing::instrument(level = "info", skip(source))]
pub fn derive_types<S: RowSource + ?Sized>(
    source: &S,
    sample_limit: usize,
) -> Result<Vec<ColumnStructure>> {
    let headers = source.headers();
    let mut cols: Vec<ColumnStructure> = headers
        .iter()
        .enumerate()
        .map(|(ordinal, name)| ColumnStructure::new(ordinal, name.as_str()))
        .collect();
    let mut longest = vec![0usize; cols.len()];

    let mut sampled_rows = 0u64;
    for (idx, row) in source.rows()?.take(sample_limit.saturating_add(1)).enumerate() {
        let row = row?;
        let row_no = idx as u64 + 1;
        check_width(row_no, cols.len(), &row)?;

        for (i, (col, cell)) in cols.iter_mut().zip(&row).enumerate() {
            observe(col, &mut longest[i], row_no, cell);
        }
        sampled_rows = row_no;
    }

    for (col, len) in cols.iter_mut().zip(longest) {
        if col.ty == TypeTag::Str {
            col.max_length = Some(len);
        }
    }

    info!(
        columns = cols.len(),
        sampled_rows, "detected csv structure"
    );
    Ok(cols)
}

/// Fold a single sampled cell into its column.
fn observe(col: &mut ColumnStructure, longest: &mut usize, row_no: u64, cell: &str) {
    let seen = classify(cell);
    col.sampled += 1;

    if seen == TypeTag::Empty {
        if !col.nullable {
            debug!(row = row_no, column = %col.name, "first empty cell, column is nullable");
        }
        col.nullable = true;
        col.null_count += 1;
        return;
    }
    *longest = (*longest).max(cell.chars().count());

    let joined = join(col.ty, seen);
    if joined != col.ty {
        debug!(
            row = row_no,
            column = %col.name,
            ordinal = col.ordinal,
            value = cell,
            seen = %seen,
            from = %col.ty,
            to = %joined,
            "column type upgraded"
        );
        col.ty = joined;
    }
}
