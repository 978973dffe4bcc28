// src/process/mod.rs
pub mod convert;
pub mod date_parser;
pub mod utils;

use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{ConvertError, Result};

/// One data row as raw text cells.
pub type RawRow = Vec<String>;

/// Boxed pass over the data rows of a source.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<RawRow>> + 'a>;

/// Sequential access to a header plus data rows.
///
/// Each call to [`RowSource::rows`] starts a fresh pass from the first data
/// row, so detection and coercion scan independently.
pub trait RowSource {
    fn headers(&self) -> &[String];
    fn rows(&self) -> Result<RowIter<'_>>;
}

/// A delimited text file on disk.
#[derive(Debug)]
pub struct CsvFile {
    path: PathBuf,
    delimiter: u8,
    headers: Vec<String>,
}

impl CsvFile {
    /// Open `path` and read its header row.
    #[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut rdr = Self::reader(&path, delimiter)?;
        let record = rdr
            .headers()
            .map_err(|source| ConvertError::InputRead {
                path: path.clone(),
                source,
            })?
            .clone();
        if record.is_empty() {
            return Err(ConvertError::MissingHeader { path });
        }
        let headers: Vec<String> = record
            .iter()
            .enumerate()
            .map(|(i, h)| match i {
                0 => h.trim_start_matches('\u{feff}').to_string(),
                _ => h.to_string(),
            })
            .collect();
        debug!(columns = headers.len(), "read header");

        Ok(Self {
            path,
            delimiter,
            headers,
        })
    }

    fn reader(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
        let file = File::open(path).map_err(|source| ConvertError::InputAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            // width is checked against the header by detection/coercion
            .flexible(true)
            .from_reader(BufReader::new(file)))
    }
}

impl RowSource for CsvFile {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn rows(&self) -> Result<RowIter<'_>> {
        let records: StringRecordsIntoIter<BufReader<File>> =
            Self::reader(&self.path, self.delimiter)?.into_records();
        Ok(Box::new(records.map(move |res| {
            res.map(|rec| rec.iter().map(str::to_string).collect())
                .map_err(|source| ConvertError::InputRead {
                    path: self.path.clone(),
                    source,
                })
        })))
    }
}

/// Header and rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl MemoryRows {
    pub fn new<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl RowSource for MemoryRows {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn rows(&self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

/// Reject a row whose width differs from the header's.
///
/// `row` is the 1-based data row number (header excluded).
pub fn check_width(row: u64, expected: usize, cells: &[String]) -> Result<()> {
    if cells.len() != expected {
        return Err(ConvertError::MalformedRow {
            row,
            expected,
            found: cells.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn csv_file_reads_header_and_rows() {
        let tmp = write_csv("\u{feff}id;name\n1;\"Ann; the first\"\n2;Bo\n");
        let src = CsvFile::open(tmp.path(), b';').unwrap();
        assert_eq!(src.headers(), ["id", "name"]);

        let rows: Vec<RawRow> = src.rows().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(rows, vec![vec!["1", "Ann; the first"], vec!["2", "Bo"]]);

        // a second pass starts over
        assert_eq!(src.rows().unwrap().count(), 2);
    }

    #[test]
    fn csv_file_keeps_ragged_rows_for_later_checks() {
        let tmp = write_csv("a,b\n1,2\n3\n");
        let src = CsvFile::open(tmp.path(), b',').unwrap();
        let rows: Vec<RawRow> = src.rows().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(rows[1], vec!["3"]);
        assert!(matches!(
            check_width(2, 2, &rows[1]),
            Err(ConvertError::MalformedRow {
                row: 2,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn missing_file_is_an_input_access_failure() {
        let err = CsvFile::open("/definitely/not/here.csv", b',').unwrap_err();
        assert!(matches!(err, ConvertError::InputAccess { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_file_has_no_header() {
        let tmp = write_csv("");
        let err = CsvFile::open(tmp.path(), b',').unwrap_err();
        assert!(matches!(err, ConvertError::MissingHeader { .. }));
    }

    #[test]
    fn memory_rows_replay() {
        let src = MemoryRows::new(["a"], [["1"], ["2"]]);
        assert_eq!(src.rows().unwrap().count(), 2);
        assert_eq!(src.rows().unwrap().count(), 2);
    }
}
