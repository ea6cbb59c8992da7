//! Table assembly and capacity enforcement.
//!
//! This is the one stage that must materialize the full record set: row and
//! column counts are global properties. It computes the column superset,
//! null-fills every row against it, then validates the result against the
//! caller-supplied [`SheetLimits`]. Row overflow either fails or, when
//! partitioning is enabled, slices into successive sheets. Nothing is ever
//! truncated silently.

use crate::flatten::types::{CapacityError, FlatRecord, SheetLimits};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One output sheet: a name plus rows aligned to the table's column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Value>>,
}

/// A record set that passed capacity checks, ready for a tabular sink.
/// All sheets share `columns`; every row has exactly `columns.len()` cells
/// with `Value::Null` filling paths the source record did not define.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    pub columns: Vec<String>,
    pub sheets: Vec<Sheet>,
}

impl ValidatedTable {
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

pub struct CapacityEnforcer {
    limits: SheetLimits,
    partition: bool,
}

impl CapacityEnforcer {
    pub fn new(limits: SheetLimits) -> Self {
        CapacityEnforcer {
            limits,
            partition: false,
        }
    }

    /// Opt into multi-sheet partitioning instead of failing on row overflow.
    pub fn with_partitioning(mut self, enabled: bool) -> Self {
        self.partition = enabled;
        self
    }

    /// Validate a record set and assemble the final table.
    ///
    /// `column_order` overrides the first-seen column superset ordering
    /// (set by the field projector when a `--fields` list is active).
    pub fn enforce(
        &self,
        records: Vec<FlatRecord>,
        column_order: Option<Vec<String>>,
        sheet_name: &str,
    ) -> Result<ValidatedTable, CapacityError> {
        let columns = match column_order {
            Some(order) => order,
            None => first_seen_columns(&records),
        };

        if columns.len() > self.limits.max_columns {
            return Err(CapacityError::TooManyColumns {
                actual: columns.len(),
                limit: self.limits.max_columns,
            });
        }

        let index: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut row = vec![Value::Null; columns.len()];
            for field in record {
                if let Some(&slot) = index.get(field.path.as_str()) {
                    row[slot] = field.value;
                }
            }
            rows.push(row);
        }

        if rows.len() > self.limits.max_rows {
            if !self.partition {
                return Err(CapacityError::TooManyRows {
                    actual: rows.len(),
                    limit: self.limits.max_rows,
                });
            }

            let group_size = self.limits.max_rows.max(1);
            let sheets = rows
                .chunks(group_size)
                .enumerate()
                .map(|(i, group)| Sheet {
                    name: if i == 0 {
                        sheet_name.to_string()
                    } else {
                        format!("{}_{}", sheet_name, i + 1)
                    },
                    rows: group.to_vec(),
                })
                .collect();

            return Ok(ValidatedTable { columns, sheets });
        }

        Ok(ValidatedTable {
            columns,
            sheets: vec![Sheet {
                name: sheet_name.to_string(),
                rows,
            }],
        })
    }
}

/// Column superset in first-seen order across all records.
fn first_seen_columns(records: &[FlatRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        for path in record.paths() {
            if seen.insert(path) {
                columns.push(path.to_string());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> FlatRecord {
        let mut r = FlatRecord::new();
        for (path, value) in pairs {
            r.insert(path, value.clone());
        }
        r
    }

    fn limits(max_rows: usize, max_columns: usize) -> SheetLimits {
        SheetLimits {
            max_rows,
            max_columns,
        }
    }

    #[test]
    fn test_column_superset_null_fills_sparse_rows() {
        let records = vec![
            record(&[("a", json!(1))]),
            record(&[("b", json!(2))]),
        ];

        let table = CapacityEnforcer::new(limits(100, 100))
            .enforce(records, None, "Sheet1")
            .unwrap();

        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.sheets[0].rows[0], vec![json!(1), Value::Null]);
        assert_eq!(table.sheets[0].rows[1], vec![Value::Null, json!(2)]);
    }

    #[test]
    fn test_exactly_at_column_limit_passes() {
        let records = vec![record(&[("a", json!(1)), ("b", json!(2))])];

        let table = CapacityEnforcer::new(limits(10, 2))
            .enforce(records, None, "Sheet1")
            .unwrap();
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_one_over_column_limit_fails() {
        let records = vec![record(&[
            ("a", json!(1)),
            ("b", json!(2)),
            ("c", json!(3)),
        ])];

        let err = CapacityEnforcer::new(limits(10, 2))
            .enforce(records, None, "Sheet1")
            .unwrap_err();
        assert_eq!(err, CapacityError::TooManyColumns { actual: 3, limit: 2 });
    }

    #[test]
    fn test_row_overflow_fails_without_partitioning() {
        let records = (0..5).map(|i| record(&[("n", json!(i))])).collect();

        let err = CapacityEnforcer::new(limits(3, 10))
            .enforce(records, None, "Sheet1")
            .unwrap_err();
        assert_eq!(err, CapacityError::TooManyRows { actual: 5, limit: 3 });
    }

    #[test]
    fn test_partitioning_slices_rows_into_named_sheets() {
        let records = (0..7).map(|i| record(&[("n", json!(i))])).collect();

        let table = CapacityEnforcer::new(limits(3, 10))
            .with_partitioning(true)
            .enforce(records, None, "Data")
            .unwrap();

        let names: Vec<&str> = table.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Data", "Data_2", "Data_3"]);
        assert_eq!(table.sheets[0].rows.len(), 3);
        assert_eq!(table.sheets[1].rows.len(), 3);
        assert_eq!(table.sheets[2].rows.len(), 1);

        // Row order survives partitioning
        let flat: Vec<i64> = table
            .sheets
            .iter()
            .flat_map(|s| s.rows.iter().map(|r| r[0].as_i64().unwrap()))
            .collect();
        assert_eq!(flat, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_partitioned_sheets_share_the_column_superset() {
        let mut records: Vec<FlatRecord> = (0..3).map(|i| record(&[("a", json!(i))])).collect();
        records.push(record(&[("b", json!("late"))]));

        let table = CapacityEnforcer::new(limits(2, 10))
            .with_partitioning(true)
            .enforce(records, None, "Sheet1")
            .unwrap();

        assert_eq!(table.columns, vec!["a", "b"]);
        for sheet in &table.sheets {
            for row in &sheet.rows {
                assert_eq!(row.len(), 2);
            }
        }
    }

    #[test]
    fn test_explicit_column_order_overrides_first_seen() {
        let records = vec![record(&[("a", json!(1)), ("b", json!(2))])];

        let table = CapacityEnforcer::new(limits(10, 10))
            .enforce(records, Some(vec!["b".into(), "a".into()]), "Sheet1")
            .unwrap();

        assert_eq!(table.columns, vec!["b", "a"]);
        assert_eq!(table.sheets[0].rows[0], vec![json!(2), json!(1)]);
    }

    #[test]
    fn test_empty_record_set_is_an_empty_table() {
        let table = CapacityEnforcer::new(limits(10, 10))
            .enforce(Vec::new(), None, "Sheet1")
            .unwrap();

        assert!(table.columns.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.sheets.len(), 1);
    }
}
