use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// A dotted path paired with the scalar cell value stored at that path,
/// e.g. `("contact.address.city", "Springfield")`
#[derive(Debug, Clone, PartialEq)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

/// One flat row emitted by the flattening engine.
///
/// Fields keep insertion order, which is also the first-seen column order
/// used when the final table is assembled. Paths are unique within a record;
/// the union of paths across all records of a run defines the column
/// superset, and records missing a path null-fill at table-assembly time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Vec<PathValue>,
}

impl FlatRecord {
    pub fn new() -> Self {
        FlatRecord { fields: Vec::new() }
    }

    /// Insert a cell, replacing any existing value at the same path.
    pub fn insert(&mut self, path: &str, value: Value) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.path == path) {
            existing.value = value;
        } else {
            self.fields.push(PathValue {
                path: path.to_string(),
                value,
            });
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.path == path).map(|f| &f.value)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.fields.iter().any(|f| f.path == path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for FlatRecord {
    type Item = PathValue;
    type IntoIter = std::vec::IntoIter<PathValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Array-handling policy for the flattening engine.
///
/// `Expand` multiplies rows: each object element of an array becomes its own
/// row, cross-producted with sibling arrays at the same level. `Join`
/// collapses any array into a single comma-delimited string cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayHandling {
    Expand,
    Join,
}

impl FromStr for ArrayHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expand" => Ok(ArrayHandling::Expand),
            "join" => Ok(ArrayHandling::Join),
            other => Err(format!(
                "unknown array handling '{}' (expected 'expand' or 'join')",
                other
            )),
        }
    }
}

impl std::fmt::Display for ArrayHandling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayHandling::Expand => write!(f, "expand"),
            ArrayHandling::Join => write!(f, "join"),
        }
    }
}

/// Per-conversion options supplied by the caller.
#[derive(Debug, Clone)]
pub struct SheetOptions {
    /// Name of the (first) output sheet
    pub sheet_name: String,

    /// Explicit array-handling policy; `None` uses the analyzer's
    /// recommendation
    pub array_handling: Option<ArrayHandling>,

    /// Process top-level arrays in chunks of this many elements;
    /// `None` flattens the whole array at once
    pub chunk_size: Option<usize>,

    /// Restrict output to these columns, in this order
    pub fields: Option<Vec<String>>,

    /// Split row overflow into additional sheets instead of failing
    pub partition: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        SheetOptions {
            sheet_name: String::from("Sheet1"),
            array_handling: None,
            chunk_size: None,
            fields: None,
            partition: false,
        }
    }
}

/// Row/column ceilings of the target format, injected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLimits {
    pub max_rows: usize,
    pub max_columns: usize,
}

impl SheetLimits {
    /// The XLSX worksheet limits (1,048,576 rows by 16,384 columns).
    pub fn xlsx() -> Self {
        SheetLimits {
            max_rows: 1_048_576,
            max_columns: 16_384,
        }
    }
}

/// Render a scalar the way it appears inside a joined-array cell.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::from("null"),
        other => other.to_string(),
    }
}

/// Raised when the input tree contains a node outside the six JSON types.
/// Not reachable from `serde_json::Value`; kept as the defensive member of
/// the error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("unsupported JSON node type at '{path}'")]
    UnsupportedType { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,
}

/// Capacity violations against the caller-supplied [`SheetLimits`].
/// Messages carry actual vs. allowed counts so callers can surface which
/// limit was exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("{actual} rows exceed the limit of {limit} (enable partitioning or reduce input)")]
    TooManyRows { actual: usize, limit: usize },

    #[error("{actual} columns exceed the limit of {limit}")]
    TooManyColumns { actual: usize, limit: usize },
}

/// Umbrella error for the full convert pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),
}
