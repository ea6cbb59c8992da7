//! crucible-info: Analyze JSON structure and validate spreadsheet capacity
//!
//! Usage:
//!   # Print the structural summary as JSON
//!   crucible-info data.json
//!
//!   # Read from stdin with compact output
//!   echo '{"a": {"b": 1}}' | crucible-info --compact
//!
//!   # Also flatten and check against sheet limits
//!   crucible-info --validate --max-rows 100000 data.json

use anyhow::{Context, Result};
use clap::Parser;
use crucible::analyze::analyze;
use crucible::{convert, ArrayHandling, ConvertError, SheetLimits, SheetOptions};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};

#[derive(Parser, Debug)]
#[command(name = "crucible-info")]
#[command(about = "Analyze JSON structure for flattening", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Flatten the input and check it against the sheet limits
    #[arg(long)]
    validate: bool,

    /// Array handling used for validation (default: recommended)
    #[arg(long, requires = "validate")]
    array_handling: Option<ArrayHandling>,

    /// Maximum rows per sheet (default: XLSX limit)
    #[arg(long, default_value_t = 1_048_576)]
    max_rows: usize,

    /// Maximum number of columns (default: XLSX limit)
    #[arg(long, default_value_t = 16_384)]
    max_columns: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let value = read_value(args.input.as_deref(), args.ndjson)?;
    let info = analyze(&value);

    let output = if args.compact {
        serde_json::to_string(&info)?
    } else {
        serde_json::to_string_pretty(&info)?
    };
    println!("{}", output);

    if args.validate {
        let options = SheetOptions {
            array_handling: args.array_handling,
            ..SheetOptions::default()
        };
        let limits = SheetLimits {
            max_rows: args.max_rows,
            max_columns: args.max_columns,
        };

        match convert(&value, &options, &limits) {
            Ok(table) => {
                eprintln!(
                    "OK: {} rows x {} columns fit within {} x {}",
                    table.row_count(),
                    table.column_count(),
                    limits.max_rows,
                    limits.max_columns
                );
            }
            Err(ConvertError::Capacity(err)) => {
                eprintln!("FAIL: {}", err);
                std::process::exit(1);
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok(())
}

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

    serde_json::from_slice(&content).context("Failed to parse JSON")
}
