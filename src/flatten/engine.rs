//! The recursive flattening engine.
//!
//! Converts one JSON value into a sequence of [`FlatRecord`]s under an
//! [`ArrayHandling`] policy. Under `Expand`, sibling arrays of objects at the
//! same level cross-product into multiple rows; under `Join`, every array
//! collapses into a single delimited-string cell and no rows are added.

use crate::flatten::types::{scalar_to_string, ArrayHandling, FlatRecord, FlattenError};
use serde_json::{Map, Value};

/// Column name used when the root (or a root array element) is a bare scalar
/// and there is no object key to derive a path from.
const ROOT_COLUMN: &str = "value";

/// Delimiter between array elements in a joined cell.
const JOIN_DELIMITER: &str = ",";

/// Delimiter between `key=value` pairs when an object element is joined.
const PAIR_DELIMITER: &str = ";";

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

#[derive(Debug)]
pub struct FlatteningEngine {
    strategy: ArrayHandling,
}

impl FlatteningEngine {
    pub fn new(strategy: ArrayHandling) -> Self {
        FlatteningEngine { strategy }
    }

    /// Flatten a JSON value into flat records.
    ///
    /// A top-level array is treated as a sequence of independent records:
    /// each element flattens on its own and the results concatenate in
    /// source order, under either strategy.
    pub fn flatten(&self, root: &Value) -> Result<Vec<FlatRecord>, FlattenError> {
        match root {
            Value::Array(elements) => self.flatten_slice(elements),
            other => self.flatten_one(other),
        }
    }

    /// Flatten a run of top-level elements. The chunked processor calls this
    /// per chunk; output is identical to flattening the elements in one call.
    pub fn flatten_slice(&self, elements: &[Value]) -> Result<Vec<FlatRecord>, FlattenError> {
        let mut records = Vec::new();
        for element in elements {
            records.extend(self.flatten_one(element)?);
        }
        Ok(records)
    }

    fn flatten_one(&self, value: &Value) -> Result<Vec<FlatRecord>, FlattenError> {
        match value {
            Value::Object(obj) => self.flatten_object(obj, ""),
            Value::Array(arr) => match self.strategy {
                ArrayHandling::Join => {
                    let mut record = FlatRecord::new();
                    record.insert(ROOT_COLUMN, Value::String(self.join_array(arr)?));
                    Ok(vec![record])
                }
                ArrayHandling::Expand => self.expand_array(arr, ROOT_COLUMN),
            },
            scalar => {
                let mut record = FlatRecord::new();
                record.insert(ROOT_COLUMN, scalar.clone());
                Ok(vec![record])
            }
        }
    }

    /// Flatten one object into a row-set.
    ///
    /// Starts from a single empty row. Scalars append to every current row;
    /// nested objects flatten depth-first and cross-product in; arrays follow
    /// the strategy. Cross-producting per key is what multiplies sibling
    /// arrays into the full combination of rows.
    fn flatten_object(
        &self,
        obj: &Map<String, Value>,
        prefix: &str,
    ) -> Result<Vec<FlatRecord>, FlattenError> {
        let mut rows = vec![FlatRecord::new()];

        for (key, value) in obj {
            let path = join_path(prefix, key);
            match value {
                Value::Object(inner) => {
                    let branch = self.flatten_object(inner, &path)?;
                    rows = cross_product(rows, branch);
                }
                Value::Array(arr) => match self.strategy {
                    ArrayHandling::Join => {
                        let joined = self.join_array(arr)?;
                        for row in &mut rows {
                            row.insert(&path, Value::String(joined.clone()));
                        }
                    }
                    ArrayHandling::Expand => {
                        let branch = self.expand_array(arr, &path)?;
                        // Empty arrays contribute no column and must not
                        // wipe out the rows built so far
                        if !branch.is_empty() {
                            rows = cross_product(rows, branch);
                        }
                    }
                },
                scalar => {
                    for row in &mut rows {
                        row.insert(&path, scalar.clone());
                    }
                }
            }
        }

        Ok(rows)
    }

    /// Expand an array into the row-set it contributes at `path`.
    ///
    /// All-scalar arrays degrade to JOIN for that array: one record with a
    /// single joined cell, no row multiplication. Container elements each
    /// flatten into their own rows; scalar elements of a mixed array become
    /// one-cell rows at the array's path.
    fn expand_array(&self, arr: &[Value], path: &str) -> Result<Vec<FlatRecord>, FlattenError> {
        if arr.is_empty() {
            return Ok(Vec::new());
        }

        if arr.iter().all(|v| !v.is_object() && !v.is_array()) {
            let mut record = FlatRecord::new();
            record.insert(path, Value::String(self.join_array(arr)?));
            return Ok(vec![record]);
        }

        let mut rows = Vec::new();
        for element in arr {
            match element {
                Value::Object(obj) => rows.extend(self.flatten_object(obj, path)?),
                Value::Array(inner) => rows.extend(self.expand_array(inner, path)?),
                scalar => {
                    let mut record = FlatRecord::new();
                    record.insert(path, scalar.clone());
                    rows.push(record);
                }
            }
        }
        Ok(rows)
    }

    /// Collapse an array into one delimited string.
    ///
    /// Scalars render directly; object elements flatten (always with JOIN
    /// semantics) to a single record serialized as `key=value` pairs; nested
    /// arrays join recursively.
    fn join_array(&self, arr: &[Value]) -> Result<String, FlattenError> {
        let mut parts = Vec::with_capacity(arr.len());
        for element in arr {
            let rendered = match element {
                Value::Object(obj) => self.join_object_element(obj)?,
                Value::Array(inner) => self.join_array(inner)?,
                scalar => scalar_to_string(scalar),
            };
            parts.push(rendered);
        }
        Ok(parts.join(JOIN_DELIMITER))
    }

    fn join_object_element(&self, obj: &Map<String, Value>) -> Result<String, FlattenError> {
        // Force JOIN semantics so the element reduces to exactly one record
        let joiner = FlatteningEngine::new(ArrayHandling::Join);
        let record = joiner
            .flatten_object(obj, "")?
            .into_iter()
            .next()
            .unwrap_or_default();

        let pairs: Vec<String> = record
            .iter()
            .map(|field| format!("{}={}", field.path, scalar_to_string(&field.value)))
            .collect();
        Ok(pairs.join(PAIR_DELIMITER))
    }
}

/// Merge every row with every extension row, preserving source order:
/// extensions cycle fastest, matching element order within an array.
fn cross_product(rows: Vec<FlatRecord>, branch: Vec<FlatRecord>) -> Vec<FlatRecord> {
    if branch.is_empty() {
        return rows;
    }

    let mut merged = Vec::with_capacity(rows.len() * branch.len());
    for row in &rows {
        for extension in &branch {
            let mut combined = row.clone();
            for field in extension.iter() {
                combined.insert(&field.path, field.value.clone());
            }
            merged.push(combined);
        }
    }
    merged
}
