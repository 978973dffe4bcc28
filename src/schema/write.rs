use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::arrow::ColumnSpec;
use super::types::ColumnStructure;
use serde::Serialize;

#[derive(Serialize)]
struct StructureReport<'a> {
    columns: &'a [ColumnStructure],
    schema: &'a [ColumnSpec],
}

/// Write the detected structure and its emitted schema as pretty JSON.
///
/// The document lands in `<path>.tmp` first and is renamed over `path`; the
/// temp file is removed if the rename fails.
pub fn write_structure<P: AsRef<Path>>(
    path: P,
    columns: &[ColumnStructure],
    schema: &[ColumnSpec],
) -> io::Result<()> {
    let path = path.as_ref();
    let mut json = serde_json::to_string_pretty(&StructureReport { columns, schema })
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    json.push('\n');

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, json)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io::Error::new(
            e.kind(),
            format!("moving {} onto {}: {}", tmp_path.display(), path.display(), e),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{arrow::emit_schema, types::TypeTag};
    use tempfile::tempdir;

    #[test]
    fn writes_structure_json() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("people.json");

        let mut name = ColumnStructure::new(0, "name");
        name.ty = TypeTag::Str;
        name.max_length = Some(3);
        let cols = vec![name];
        let schema = emit_schema(&cols);

        write_structure(&path, &cols, &schema).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["columns"][0]["name"], "name");
        assert_eq!(json["columns"][0]["type"], "str");
        assert_eq!(json["columns"][0]["max_length"], 3);
        assert_eq!(json["schema"][0]["storage_type"], "text");
        // temp file is gone
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_cleans_up() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "x").unwrap();

        let cols = vec![ColumnStructure::new(0, "a")];
        assert!(write_structure(&path, &cols, &emit_schema(&cols)).is_err());
        assert!(!tmp.path().join("taken.tmp").exists());
    }
}
