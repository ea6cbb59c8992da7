//! Tabular sinks for validated tables.
//!
//! The workbook file format itself (XLSX encoding, styling) is an external
//! collaborator's job; these sinks cover the plain formats the CLI writes:
//! one CSV or JSON Lines file per sheet in an output directory.

use crate::flatten::capacity::{Sheet, ValidatedTable};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait TableSink {
    fn write_table(&mut self, table: &ValidatedTable) -> Result<()>;
}

/// Writes each sheet as `<name>.csv` with a header row. Null cells become
/// empty fields; everything else renders as plain text.
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
        Ok(CsvSink {
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }
}

impl TableSink for CsvSink {
    fn write_table(&mut self, table: &ValidatedTable) -> Result<()> {
        for sheet in &table.sheets {
            let path = self.output_dir.join(format!("{}.csv", sheet.name));
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            write_sheet_csv(&mut writer, &table.columns, sheet)?;
            writer.flush().context("Failed to flush CSV writer")?;
        }
        Ok(())
    }
}

/// Emit one sheet to an already-open CSV writer. The flatten binary reuses
/// this for stdout output.
pub fn write_sheet_csv<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    columns: &[String],
    sheet: &Sheet,
) -> Result<()> {
    writer
        .write_record(columns)
        .context("Failed to write CSV header")?;

    for row in &sheet.rows {
        let cells: Vec<String> = row.iter().map(csv_cell).collect();
        writer
            .write_record(&cells)
            .context("Failed to write CSV row")?;
    }
    Ok(())
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Writes each sheet as `<name>.jsonl`, one column->value object per row,
/// keeping explicit nulls so sparse cells stay distinguishable.
pub struct JsonLinesSink {
    output_dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
        Ok(JsonLinesSink {
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }
}

impl TableSink for JsonLinesSink {
    fn write_table(&mut self, table: &ValidatedTable) -> Result<()> {
        for sheet in &table.sheets {
            let path = self.output_dir.join(format!("{}.jsonl", sheet.name));
            let mut file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;

            for row in &sheet.rows {
                let object = row_to_object(&table.columns, row);
                let line =
                    serde_json::to_string(&object).context("Failed to serialize row")?;
                writeln!(file, "{}", line).context("Failed to write row")?;
            }
        }
        Ok(())
    }
}

pub fn row_to_object(columns: &[String], row: &[Value]) -> Map<String, Value> {
    let mut object = Map::new();
    for (column, cell) in columns.iter().zip(row) {
        object.insert(column.clone(), cell.clone());
    }
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table() -> ValidatedTable {
        ValidatedTable {
            columns: vec!["name".into(), "tags.id".into()],
            sheets: vec![Sheet {
                name: "Sheet1".into(),
                rows: vec![
                    vec![json!("Alice"), json!(1)],
                    vec![json!("Bob"), Value::Null],
                ],
            }],
        }
    }

    #[test]
    fn test_csv_output_null_fills_as_empty_field() {
        let table = sample_table();
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_sheet_csv(&mut writer, &table.columns, &table.sheets[0]).unwrap();

        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "name,tags.id");
        assert_eq!(lines[1], "Alice,1");
        assert_eq!(lines[2], "Bob,");
    }

    #[test]
    fn test_row_object_keeps_explicit_nulls() {
        let table = sample_table();
        let object = row_to_object(&table.columns, &table.sheets[0].rows[1]);

        assert_eq!(object.get("name"), Some(&json!("Bob")));
        assert_eq!(object.get("tags.id"), Some(&Value::Null));
    }
}
