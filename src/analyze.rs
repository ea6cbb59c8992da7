//! Structural analysis of JSON values.
//!
//! A single read-only pass that measures nesting depth, inventories arrays
//! and scores overall complexity. The result feeds the `info`/`validate`
//! commands and supplies the default array-handling recommendation; it never
//! fails and never mutates the input.

use crate::flatten::engine::join_path;
use serde::Serialize;
use serde_json::Value;

// Complexity scoring policy. The weights are tunable constants, not part of
// the contract; the bucket thresholds below are.
pub const NESTING_WEIGHT: usize = 3;
pub const ARRAY_WEIGHT: usize = 2;
pub const LARGE_LEAF_WEIGHT: usize = 5;
pub const LARGE_LEAF_THRESHOLD: usize = 100;

pub const MODERATE_THRESHOLD: usize = 10;
pub const COMPLEX_THRESHOLD: usize = 25;
pub const VERY_COMPLEX_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl ComplexityLevel {
    pub fn from_score(score: usize) -> Self {
        if score < MODERATE_THRESHOLD {
            ComplexityLevel::Simple
        } else if score < COMPLEX_THRESHOLD {
            ComplexityLevel::Moderate
        } else if score < VERY_COMPLEX_THRESHOLD {
            ComplexityLevel::Complex
        } else {
            ComplexityLevel::VeryComplex
        }
    }
}

/// Advisory array-handling recommendation. The caller's explicit option
/// always wins; `Nested` means the document has no arrays and no policy is
/// needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatteningStrategy {
    Expand,
    Join,
    Nested,
}

/// Summary of one JSON value's shape, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct StructureInfo {
    pub max_nesting_level: usize,
    pub is_nested: bool,
    pub contains_arrays: bool,
    pub array_count: usize,
    pub array_paths: Vec<String>,
    pub leaf_count: usize,
    pub complexity_score: usize,
    pub complexity_level: ComplexityLevel,
    pub flattening_strategy: FlatteningStrategy,
}

/// Analyze a JSON value. Total over any `serde_json::Value`.
pub fn analyze(root: &Value) -> StructureInfo {
    let mut walk = Walk::new();
    let max_nesting_level = walk.visit(root, "");

    let array_count = walk.array_paths.len();
    let complexity_score = max_nesting_level * NESTING_WEIGHT
        + array_count * ARRAY_WEIGHT
        + if walk.leaf_count > LARGE_LEAF_THRESHOLD {
            LARGE_LEAF_WEIGHT
        } else {
            0
        };

    let flattening_strategy = if array_count == 0 {
        FlatteningStrategy::Nested
    } else if walk.array_in_array {
        FlatteningStrategy::Join
    } else if walk.object_only_arrays {
        FlatteningStrategy::Expand
    } else {
        // Scalar or mixed arrays present: a collapse is the safe default
        FlatteningStrategy::Join
    };

    StructureInfo {
        max_nesting_level,
        is_nested: max_nesting_level > 0,
        contains_arrays: array_count > 0,
        array_count,
        array_paths: walk.array_paths,
        leaf_count: walk.leaf_count,
        complexity_score,
        complexity_level: ComplexityLevel::from_score(complexity_score),
        flattening_strategy,
    }
}

struct Walk {
    array_paths: Vec<String>,
    leaf_count: usize,
    object_only_arrays: bool,
    array_in_array: bool,
}

impl Walk {
    fn new() -> Self {
        Walk {
            array_paths: Vec::new(),
            leaf_count: 0,
            object_only_arrays: true,
            array_in_array: false,
        }
    }

    /// Depth-first walk returning the nesting level of `value`: scalars are
    /// 0, a container is 1 + the deepest container child (so `{"a":1}` is 0
    /// and `{"a":{"b":{"c":1}}}` is 2).
    fn visit(&mut self, value: &Value, path: &str) -> usize {
        match value {
            Value::Object(obj) => {
                let mut depth = 0;
                for (key, child) in obj {
                    let child_path = join_path(path, key);
                    let child_depth = self.visit(child, &child_path);
                    if child.is_object() || child.is_array() {
                        depth = depth.max(1 + child_depth);
                    }
                }
                depth
            }
            Value::Array(arr) => {
                // One entry per array node, not per element; the root array
                // records the empty path
                self.array_paths.push(path.to_string());

                if arr.iter().any(|e| e.is_array()) {
                    self.array_in_array = true;
                }
                if !arr.is_empty() && !arr.iter().all(|e| e.is_object()) {
                    self.object_only_arrays = false;
                }

                let mut depth = 0;
                for child in arr {
                    // Element indices never appear in paths
                    let child_depth = self.visit(child, path);
                    if child.is_object() || child.is_array() {
                        depth = depth.max(1 + child_depth);
                    }
                }
                depth
            }
            _ => {
                self.leaf_count += 1;
                0
            }
        }
    }
}
