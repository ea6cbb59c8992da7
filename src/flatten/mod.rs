//! JSON flattening - convert nested JSON into spreadsheet-ready tables.
//!
//! The pipeline is strictly ordered: analyze, flatten (chunked for
//! top-level arrays), project, enforce capacity. Each conversion is
//! self-contained with no shared state, so independent conversions can run
//! in parallel without coordination.

pub mod types;
pub mod engine;
pub mod chunk;
pub mod project;
pub mod capacity;
pub mod writer;

pub use types::{
    ArrayHandling, CapacityError, ChunkError, ConvertError, FlatRecord, FlattenError, PathValue,
    SheetLimits, SheetOptions,
};
pub use engine::FlatteningEngine;
pub use chunk::ChunkedProcessor;
pub use project::FieldProjector;
pub use capacity::{CapacityEnforcer, Sheet, ValidatedTable};
pub use writer::{CsvSink, JsonLinesSink, TableSink};

use crate::analyze::{analyze, FlatteningStrategy};
use serde_json::Value;

/// Run the full conversion pipeline on a parsed JSON value.
///
/// The analyzer's strategy recommendation applies when
/// `options.array_handling` is unset (`Nested` means no arrays, where both
/// policies are equivalent and EXPAND is used).
pub fn convert(
    root: &Value,
    options: &SheetOptions,
    limits: &SheetLimits,
) -> Result<ValidatedTable, ConvertError> {
    let info = analyze(root);
    let strategy = options.array_handling.unwrap_or(match info.flattening_strategy {
        FlatteningStrategy::Join => ArrayHandling::Join,
        FlatteningStrategy::Expand | FlatteningStrategy::Nested => ArrayHandling::Expand,
    });

    let engine = FlatteningEngine::new(strategy);
    let records: Vec<FlatRecord> = match root {
        Value::Array(elements) => {
            ChunkedProcessor::new(elements, options.chunk_size, engine)?
                .collect::<Result<Vec<_>, _>>()?
        }
        other => engine.flatten(other)?,
    };

    let (records, column_order) = match &options.fields {
        Some(fields) if !fields.is_empty() => {
            let projector = FieldProjector::new(fields.clone());
            let order = projector.columns().to_vec();
            (projector.project(records), Some(order))
        }
        _ => (records, None),
    };

    let enforcer = CapacityEnforcer::new(*limits).with_partitioning(options.partition);
    Ok(enforcer.enforce(records, column_order, &options.sheet_name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_end_to_end() {
        let data = json!([
            {"name": "Alice", "tags": [{"id": 1}, {"id": 2}]},
            {"name": "Bob"}
        ]);

        let table = convert(&data, &SheetOptions::default(), &SheetLimits::xlsx()).unwrap();

        assert_eq!(table.columns, vec!["name", "tags.id"]);
        assert_eq!(table.row_count(), 3);
        // Bob's missing tags.id null-fills
        assert_eq!(table.sheets[0].rows[2][1], serde_json::Value::Null);
    }

    #[test]
    fn test_convert_respects_explicit_join() {
        let data = json!({"items": [{"id": 1}, {"id": 2}]});
        let options = SheetOptions {
            array_handling: Some(ArrayHandling::Join),
            ..SheetOptions::default()
        };

        let table = convert(&data, &options, &SheetLimits::xlsx()).unwrap();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.sheets[0].rows[0][0], json!("id=1,id=2"));
    }

    #[test]
    fn test_convert_with_fields_and_partitioning() {
        let data = json!([
            {"a": 1, "b": "x", "c": true},
            {"a": 2, "b": "y"},
            {"a": 3}
        ]);
        let options = SheetOptions {
            sheet_name: "Out".into(),
            fields: Some(vec!["b".into(), "a".into()]),
            partition: true,
            ..SheetOptions::default()
        };
        let limits = SheetLimits {
            max_rows: 2,
            max_columns: 10,
        };

        let table = convert(&data, &options, &limits).unwrap();

        assert_eq!(table.columns, vec!["b", "a"]);
        assert_eq!(table.sheets.len(), 2);
        assert_eq!(table.sheets[0].name, "Out");
        assert_eq!(table.sheets[1].name, "Out_2");
        assert_eq!(table.sheets[0].rows[0], vec![json!("x"), json!(1)]);
    }

    #[test]
    fn test_convert_surfaces_capacity_errors() {
        let data = json!([{"a": 1}, {"a": 2}, {"a": 3}]);
        let limits = SheetLimits {
            max_rows: 2,
            max_columns: 10,
        };

        let err = convert(&data, &SheetOptions::default(), &limits).unwrap_err();
        match err {
            ConvertError::Capacity(CapacityError::TooManyRows { actual, limit }) => {
                assert_eq!(actual, 3);
                assert_eq!(limit, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_convert_chunked_matches_unchunked() {
        let data = json!([
            {"id": 1, "tags": [{"t": "a"}, {"t": "b"}]},
            {"id": 2},
            {"id": 3, "tags": [{"t": "c"}]}
        ]);

        let whole = convert(&data, &SheetOptions::default(), &SheetLimits::xlsx()).unwrap();
        let chunked = convert(
            &data,
            &SheetOptions {
                chunk_size: Some(1),
                ..SheetOptions::default()
            },
            &SheetLimits::xlsx(),
        )
        .unwrap();

        assert_eq!(whole, chunked);
    }
}
