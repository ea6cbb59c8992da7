//! Column allow-list projection, backing the CLI `--fields` option.

use crate::flatten::types::{FlatRecord, PathValue};

/// Restricts records to an ordered set of allowed paths. The allow-list
/// order becomes the output column order, overriding the first-seen order
/// from flattening.
pub struct FieldProjector {
    allowed: Vec<String>,
}

impl FieldProjector {
    pub fn new(allowed: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(allowed.len());
        for path in allowed {
            if !deduped.contains(&path) {
                deduped.push(path);
            }
        }
        FieldProjector { allowed: deduped }
    }

    /// Parse a comma-separated field list, e.g. `"name,contact.city"`.
    pub fn from_comma_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// The output column order this projector imposes.
    pub fn columns(&self) -> &[String] {
        &self.allowed
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Drop every key outside the allow-list. Records missing an allowed
    /// path pass through untouched; the gap null-fills at table assembly.
    /// An empty allow-list is a no-op.
    pub fn project(&self, records: Vec<FlatRecord>) -> Vec<FlatRecord> {
        if self.allowed.is_empty() {
            return records;
        }

        records
            .into_iter()
            .map(|record| {
                let mut trimmed = FlatRecord::new();
                for PathValue { path, value } in record {
                    if self.allowed.iter().any(|a| *a == path) {
                        trimmed.insert(&path, value);
                    }
                }
                trimmed
            })
            .collect()
    }
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

    #[test]
    fn test_drops_keys_outside_allow_list() {
        let records = vec![record(&[
            ("a", json!(1)),
            ("b", json!(2)),
            ("c", json!(3)),
        ])];

        let projector = FieldProjector::new(vec!["a".into(), "c".into()]);
        let projected = projector.project(records);

        assert!(projected[0].contains_path("a"));
        assert!(!projected[0].contains_path("b"));
        assert!(projected[0].contains_path("c"));
    }

    #[test]
    fn test_allow_list_order_is_column_order() {
        let projector = FieldProjector::new(vec!["b".into(), "a".into()]);
        assert_eq!(projector.columns(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_missing_allowed_path_is_not_an_error() {
        let records = vec![record(&[("a", json!(1))])];

        let projector = FieldProjector::new(vec!["a".into(), "ghost".into()]);
        let projected = projector.project(records);

        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].get("a"), Some(&json!(1)));
        assert!(!projected[0].contains_path("ghost"));
    }

    #[test]
    fn test_empty_allow_list_is_a_no_op() {
        let records = vec![record(&[("a", json!(1)), ("b", json!(2))])];

        let projector = FieldProjector::new(vec![]);
        let projected = projector.project(records.clone());

        assert_eq!(projected, records);
    }

    #[test]
    fn test_comma_list_parsing_trims_and_dedups() {
        let projector = FieldProjector::from_comma_list(" b , a ,b, ");
        assert_eq!(projector.columns(), &["b".to_string(), "a".to_string()]);
    }
}
