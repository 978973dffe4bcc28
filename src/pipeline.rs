use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::ConvertOptions;
use crate::error::Result;
use crate::process::{convert::convert_to_final_types, RowSource};
use crate::schema::{arrow::emit_schema, derive::derive_types, ColumnSpec, ColumnStructure};
use crate::sink::{Sink, TableName};

/// Outcome of a finished conversion.
#[derive(Debug)]
pub struct ConversionReport {
    pub structure: Vec<ColumnStructure>,
    pub schema: Vec<ColumnSpec>,
    pub rows_coerced: u64,
    pub rows_confirmed: u64,
    pub elapsed: Duration,
}

/// Detect, emit, coerce, then hand schema and rows to `sink`.
///
/// Every row is coerced before the sink sees anything, so a bad row leaves
/// the sink untouched.
#[tracing::instrument(level = "info", skip_all, fields(table = %table))]
pub fn convert<S, K>(
    source: &S,
    sink: &mut K,
    table: &TableName,
    opts: &ConvertOptions,
) -> Result<ConversionReport>
where
    S: RowSource + ?Sized,
    K: Sink + ?Sized,
{
    let start = Instant::now();
    opts.validate()?;

    let structure = derive_types(source, opts.sample_limit)?;
    let schema = emit_schema(&structure);
    let rows = convert_to_final_types(source, &structure, opts.coerce_options())?;
    let rows_coerced = rows.len() as u64;

    sink.create_table(table, &schema)?;
    let inserted = sink.insert_rows(&rows)?;
    drop(rows);
    let rows_confirmed = sink.finish()?;

    if rows_confirmed != rows_coerced || inserted != rows_coerced {
        warn!(
            rows_coerced,
            inserted, rows_confirmed, "sink row count does not match coerced rows"
        );
    }
    let elapsed = start.elapsed();
    info!(rows = rows_confirmed, ?elapsed, "conversion complete");

    Ok(ConversionReport {
        structure,
        schema,
        rows_coerced,
        rows_confirmed,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConvertError, SinkError};
    use crate::process::{convert::CellValue, CsvFile, MemoryRows};
    use crate::schema::{StorageType, TypeTag};
    use crate::sink::{MemorySink, ParquetSink};
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use parquet::basic::Compression;
    use std::{fs::File, io::Write};
    use tempfile::tempdir;

    fn table() -> TableName {
        TableName::new(None, "Extract")
    }

    #[test]
    fn converts_into_memory_sink() {
        let src = MemoryRows::new(
            ["id", "name", "joined"],
            [["1", "Ann", "2021-05-01"], ["2", "Bo", "2021-12-31"]],
        );
        let mut sink = MemorySink::default();
        let report = convert(&src, &mut sink, &table(), &ConvertOptions::default()).unwrap();

        assert_eq!(report.rows_coerced, 2);
        assert_eq!(report.rows_confirmed, 2);
        assert_eq!(
            sink.columns
                .iter()
                .map(|c| c.storage_type)
                .collect::<Vec<_>>(),
            vec![StorageType::BigInt, StorageType::Text, StorageType::Date]
        );
        assert_eq!(
            sink.rows[1][2],
            CellValue::Date(NaiveDate::from_ymd_opt(2021, 12, 31).unwrap())
        );
    }

    #[test]
    fn malformed_row_produces_no_output() {
        let src = MemoryRows::new(["a", "b"], vec![vec!["1", "2"], vec!["3"]]);
        let mut sink = MemorySink::default();
        let err = convert(&src, &mut sink, &table(), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedRow { .. }));
        assert!(sink.table.is_none());
        assert!(sink.rows.is_empty());
    }

    #[test]
    fn unparsable_cell_produces_no_output() {
        let src = MemoryRows::new(["n"], [["1"], ["2"], ["x"]]);
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("out.parquet");
        let mut sink = ParquetSink::new(&out, Compression::SNAPPY, 100);
        let opts = ConvertOptions {
            sample_limit: 1,
            ..Default::default()
        };
        let err = convert(&src, &mut sink, &table(), &opts).unwrap_err();
        assert!(matches!(err, ConvertError::UnparsableCell { row: 3, .. }));
        drop(sink);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn sink_failure_is_distinguishable() {
        struct FailingSink;
        impl Sink for FailingSink {
            fn create_table(&mut self, _: &TableName, _: &[ColumnSpec]) -> Result<(), SinkError> {
                Err(SinkError::State("read-only"))
            }
            fn insert_rows(&mut self, _: &[crate::process::convert::TypedRow]) -> Result<u64, SinkError> {
                Ok(0)
            }
            fn finish(&mut self) -> Result<u64, SinkError> {
                Ok(0)
            }
        }

        let src = MemoryRows::new(["a"], [["1"]]);
        let err = convert(&src, &mut FailingSink, &table(), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Sink(SinkError::State("read-only"))));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn csv_file_to_parquet_end_to_end() {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("people.csv");
        let mut f = File::create(&input).unwrap();
        write!(
            f,
            "id;name;score;joined;active\n\
             1;Ann;1,5;2021-05-01;true\n\
             2;Bo;;2021-12-31;false\n\
             3;\"Cy \"\"the\"\" third\";2;2022-01-15 08:30:00;TRUE\n"
        )
        .unwrap();
        drop(f);

        let opts = ConvertOptions {
            delimiter: ";".into(),
            ..Default::default()
        };
        let src = CsvFile::open(&input, opts.delimiter_byte().unwrap()).unwrap();
        let out = tmp.path().join("people.parquet");
        let mut sink = ParquetSink::new(&out, opts.compression().unwrap(), opts.batch_size);
        let report = convert(&src, &mut sink, &table(), &opts).unwrap();

        let types: Vec<TypeTag> = report.structure.iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![
                TypeTag::Int,
                TypeTag::Str,
                TypeTag::FloatComma,
                TypeTag::DateTime24Ymd,
                TypeTag::Bool
            ]
        );
        assert!(report.structure[2].nullable);
        assert_eq!(report.rows_confirmed, 3);

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&out).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 3);
    }

    #[test]
    fn header_only_file_creates_empty_text_table() {
        let src = MemoryRows::new(["a", "b"], Vec::<Vec<String>>::new());
        let mut sink = MemorySink::default();
        let report = convert(&src, &mut sink, &table(), &ConvertOptions::default()).unwrap();
        assert_eq!(report.rows_confirmed, 0);
        assert!(sink
            .columns
            .iter()
            .all(|c| c.storage_type == StorageType::Text));
    }
}
