//! # Crucible - JSON Structural Analysis and Flattening
//!
//! A library for turning arbitrarily nested JSON into flat, spreadsheet-ready
//! tables, with structural analysis to pick an array-handling policy and
//! capacity enforcement against spreadsheet row/column limits.
//!
//! ## Modules
//!
//! - **flatten**: the flattening engine, chunked processing, field
//!   projection, capacity enforcement and tabular sinks
//! - **analyze**: single-pass structural analysis (nesting depth, array
//!   inventory, complexity scoring, strategy recommendation)
//!
//! ## Quick Start
//!
//! ```rust
//! use crucible::{convert, SheetOptions, SheetLimits};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = json!([
//!     {"name": "Alice", "tags": [{"id": 1}, {"id": 2}]},
//!     {"name": "Bob"}
//! ]);
//!
//! let table = convert(&data, &SheetOptions::default(), &SheetLimits::xlsx())?;
//!
//! // Alice expands into two rows, Bob null-fills the tags.id column
//! assert_eq!(table.columns, vec!["name", "tags.id"]);
//! assert_eq!(table.row_count(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Structural analysis
//!
//! ```rust
//! use crucible::analyze::analyze;
//! use serde_json::json;
//!
//! let info = analyze(&json!({"a": {"b": {"c": 1}}}));
//! assert_eq!(info.max_nesting_level, 2);
//! assert!(!info.contains_arrays);
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::BufRead;

pub mod analyze;
pub mod flatten;

// Re-export commonly used types for convenience
pub use analyze::{ComplexityLevel, FlatteningStrategy, StructureInfo};
pub use flatten::{
    convert, ArrayHandling, CapacityEnforcer, CapacityError, ChunkError, ChunkedProcessor,
    ConvertError, CsvSink, FieldProjector, FlatRecord, FlattenError, FlatteningEngine,
    JsonLinesSink, PathValue, Sheet, SheetLimits, SheetOptions, TableSink, ValidatedTable,
};

/// Convenience entry point: convert a newline-delimited JSON stream, treating
/// each line as one top-level record.
pub fn convert_ndjson<R: BufRead>(
    reader: R,
    options: &SheetOptions,
    limits: &SheetLimits,
) -> Result<ValidatedTable> {
    let mut elements = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).context("Failed to parse JSON")?;
        elements.push(value);
    }

    convert(&Value::Array(elements), options, limits).context("Failed to convert records")
}
