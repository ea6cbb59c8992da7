//! crucible-flatten: Convert nested JSON into flat spreadsheet tables
//!
//! Usage:
//!   # Read from file, print CSV to stdout
//!   crucible-flatten data.json
//!
//!   # Read from stdin
//!   echo '{"id": 1, "tags": [{"t": "a"}]}' | crucible-flatten
//!
//!   # Collapse arrays into delimited cells instead of expanding rows
//!   crucible-flatten --array-handling join data.json
//!
//!   # Process NDJSON, restrict columns, write one CSV per sheet
//!   crucible-flatten --ndjson events.jsonl --fields id,user.name -o ./out
//!
//!   # Split row overflow across sheets instead of failing
//!   crucible-flatten --partition --max-rows 100000 big.json -o ./out

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use crucible::analyze::analyze;
use crucible::flatten::writer::{row_to_object, write_sheet_csv};
use crucible::{
    convert, ArrayHandling, CsvSink, FieldProjector, JsonLinesSink, SheetLimits, SheetOptions,
    TableSink, ValidatedTable,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "crucible-flatten")]
#[command(about = "Convert nested JSON into flat spreadsheet tables", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Name of the (first) output sheet
    #[arg(long, default_value = "Sheet1")]
    sheet_name: String,

    /// Array handling: "expand" multiplies rows, "join" collapses into one
    /// cell (default: recommended by structural analysis)
    #[arg(long)]
    array_handling: Option<ArrayHandling>,

    /// Flatten top-level arrays in chunks of this many elements
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Comma-separated column allow-list, also fixing output column order
    #[arg(long)]
    fields: Option<String>,

    /// Split row overflow into additional sheets instead of failing
    #[arg(long)]
    partition: bool,

    /// Maximum rows per sheet (default: XLSX limit)
    #[arg(long, default_value_t = 1_048_576)]
    max_rows: usize,

    /// Maximum number of columns (default: XLSX limit)
    #[arg(long, default_value_t = 16_384)]
    max_columns: usize,

    /// Output directory, one file per sheet; stdout if omitted
    #[arg(long, short = 'o')]
    output_dir: Option<String>,

    /// Output format: "csv" or "jsonl"
    #[arg(long, default_value = "csv")]
    format: String,
}

/// Caller-assembled run summary, printed to stderr after conversion.
struct ConversionSummary {
    rows: usize,
    columns: usize,
    sheets: usize,
    complexity: String,
    nesting_level: usize,
    array_count: usize,
    elapsed: std::time::Duration,
}

impl std::fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} rows x {} columns across {} sheet(s) in {:.2?}",
            self.rows, self.columns, self.sheets, self.elapsed
        )?;
        write!(
            f,
            "complexity: {} (nesting level {}, {} array(s))",
            self.complexity, self.nesting_level, self.array_count
        )
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let options = SheetOptions {
        sheet_name: args.sheet_name.clone(),
        array_handling: args.array_handling,
        chunk_size: args.chunk_size,
        fields: args
            .fields
            .as_deref()
            .map(|list| FieldProjector::from_comma_list(list).columns().to_vec()),
        partition: args.partition,
    };
    let limits = SheetLimits {
        max_rows: args.max_rows,
        max_columns: args.max_columns,
    };

    let value = read_value(args.input.as_deref(), args.ndjson)?;

    let start = Instant::now();
    let info = analyze(&value);
    let table = convert(&value, &options, &limits)?;
    let elapsed = start.elapsed();

    match &args.output_dir {
        Some(dir) => write_to_directory(&table, dir, &args.format)?,
        None => write_to_stdout(&table, &args.format)?,
    }

    let summary = ConversionSummary {
        rows: table.row_count(),
        columns: table.column_count(),
        sheets: table.sheets.len(),
        complexity: format!("{:?}", info.complexity_level),
        nesting_level: info.max_nesting_level,
        array_count: info.array_count,
        elapsed,
    };
    eprintln!("{}", summary);

    Ok(())
}

/// Read and parse the input using SIMD-accelerated parsing when possible,
/// falling back to serde_json.
fn read_value(input_file: Option<&str>, ndjson: bool) -> Result<Value> {
    let reader: Box<dyn Read> = if let Some(file_path) = input_file {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        ))
    } else {
        Box::new(std::io::stdin())
    };

    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    parse_content(content, ndjson)
}

fn parse_content(mut content: Vec<u8>, ndjson: bool) -> Result<Value> {
    if ndjson {
        let text = String::from_utf8_lossy(&content);
        let mut elements = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).context("Failed to parse JSON line")?;
            elements.push(value);
        }
        return Ok(Value::Array(elements));
    }

    // Try SIMD parsing first (faster), fall back to serde_json. Deserializing
    // straight into serde_json::Value keeps document key order, which the
    // output column order depends on.
    match simd_json::serde::from_slice::<Value>(&mut content) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_slice(&content).context("Failed to parse JSON"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_key_order_for_wide_objects() {
        let keys: Vec<String> = (0..64).map(|i| format!("k{:03}", 63 - i)).collect();
        let body: Vec<String> = keys.iter().map(|k| format!("\"{}\": 1", k)).collect();
        let input = format!("{{{}}}", body.join(", "));

        let value = parse_content(input.into_bytes(), false).unwrap();

        let parsed: Vec<&String> = value.as_object().unwrap().keys().collect();
        let expected: Vec<&String> = keys.iter().collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_ndjson_lines_become_array_elements() {
        let input = b"{\"a\": 1}\n\n{\"b\": 2}\n".to_vec();

        let value = parse_content(input, true).unwrap();

        let elements = value.as_array().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0]["a"], 1);
        assert_eq!(elements[1]["b"], 2);
    }
}

fn write_to_directory(table: &ValidatedTable, dir: &str, format: &str) -> Result<()> {
    match format {
        "csv" => CsvSink::new(dir)?.write_table(table),
        "jsonl" => JsonLinesSink::new(dir)?.write_table(table),
        other => anyhow::bail!("unknown format '{}' (expected 'csv' or 'jsonl')", other),
    }
}

fn write_to_stdout(table: &ValidatedTable, format: &str) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    match format {
        "csv" => {
            for sheet in &table.sheets {
                if table.sheets.len() > 1 {
                    writeln!(handle, "# {}", sheet.name)?;
                }
                let mut writer = csv::Writer::from_writer(&mut handle);
                write_sheet_csv(&mut writer, &table.columns, sheet)?;
                writer.flush()?;
            }
        }
        "jsonl" => {
            for sheet in &table.sheets {
                for row in &sheet.rows {
                    let mut object = row_to_object(&table.columns, row);
                    if table.sheets.len() > 1 {
                        object.insert("_sheet".to_string(), Value::String(sheet.name.clone()));
                    }
                    let line = serde_json::to_string(&object)?;
                    writeln!(handle, "{}", line)?;
                }
            }
        }
        other => anyhow::bail!("unknown format '{}' (expected 'csv' or 'jsonl')", other),
    }

    Ok(())
}
