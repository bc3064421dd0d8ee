//! Operator-key stripping.
//!
//! Removes mapping keys that a document database would read as a query
//! operator (`{"$where": ...}`, `{"age": {"$gt": 0}}`).

use serde_json::{Map, Value};

use crate::sanitize::walk::{walk, NodeRule};
use crate::sanitize::{SanitizeOptions, SanitizeReport};

struct OperatorKeyRule {
    prefix: char,
}

impl NodeRule for OperatorKeyRule {
    fn visit_mapping(&mut self, map: &mut Map<String, Value>, report: &mut SanitizeReport) {
        let prefix = self.prefix;
        let before = map.len();
        map.retain(|key, _| !key.starts_with(prefix));
        report.keys_removed += before - map.len();
    }
}

/// Remove every mapping entry whose key starts with the operator prefix.
///
/// Removed values are discarded without being visited. Non-mapping roots
/// are left as they are unless arrays are descended into.
pub fn strip_operator_keys(node: &mut Value, options: &SanitizeOptions) -> SanitizeReport {
    let mut rule = OperatorKeyRule {
        prefix: options.operator_prefix,
    };
    walk(node, options, &mut rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strip(mut value: Value, options: &SanitizeOptions) -> Value {
        strip_operator_keys(&mut value, options);
        value
    }

    #[test]
    fn test_removes_top_level_operator_key() {
        let out = strip(json!({ "$where": "1==1", "name": "Bob" }), &SanitizeOptions::default());
        assert_eq!(out, json!({ "name": "Bob" }));
    }

    #[test]
    fn test_removes_nested_operator_key() {
        let out = strip(json!({ "nested": { "$gt": 5 } }), &SanitizeOptions::default());
        assert_eq!(out, json!({ "nested": {} }));
    }

    #[test]
    fn test_preserves_siblings_at_every_depth() {
        let input = json!({
            "email": "vet@example.com",
            "password": { "$ne": null, "length": 8 },
            "profile": { "branch": "Navy", "rank": { "$regex": ".*", "grade": "E-5" } }
        });
        let out = strip(input, &SanitizeOptions::default());
        assert_eq!(
            out,
            json!({
                "email": "vet@example.com",
                "password": { "length": 8 },
                "profile": { "branch": "Navy", "rank": { "grade": "E-5" } }
            })
        );
    }

    #[test]
    fn test_only_leading_prefix_counts() {
        let out = strip(json!({ "price$": 1, "a$b": 2, "$": 3 }), &SanitizeOptions::default());
        assert_eq!(out, json!({ "price$": 1, "a$b": 2 }));
    }

    #[test]
    fn test_removed_values_are_not_visited() {
        let mut value = json!({ "$or": [{ "$ne": 1 }, { "$gt": 2 }], "ok": true });
        let report = strip_operator_keys(&mut value, &SanitizeOptions::default());
        assert_eq!(report.keys_removed, 1);
        assert_eq!(value, json!({ "ok": true }));
    }

    #[test]
    fn test_array_elements_are_stripped_when_descending() {
        let out = strip(json!({ "list": [{ "$ne": 1 }] }), &SanitizeOptions::default());
        assert_eq!(out, json!({ "list": [{}] }));
    }

    #[test]
    fn test_legacy_mode_leaves_array_elements_untouched() {
        let out = strip(json!({ "list": [{ "$ne": 1 }] }), &SanitizeOptions::legacy());
        assert_eq!(out, json!({ "list": [{ "$ne": 1 }] }));
    }

    #[test]
    fn test_primitives_and_null_are_unchanged() {
        for value in [json!(null), json!(true), json!(42), json!("$where")] {
            assert_eq!(strip(value.clone(), &SanitizeOptions::default()), value);
        }
    }

    #[test]
    fn test_custom_prefix() {
        let options = SanitizeOptions {
            operator_prefix: '_',
            ..SanitizeOptions::default()
        };
        let out = strip(json!({ "_id": 1, "$set": 2 }), &options);
        assert_eq!(out, json!({ "$set": 2 }));
    }

    #[test]
    fn test_idempotent() {
        let input = json!({
            "$where": "x",
            "a": { "$gt": 1, "b": [{ "$in": [1] }, { "c": "d" }] }
        });
        let once = strip(input, &SanitizeOptions::default());
        let twice = strip(once.clone(), &SanitizeOptions::default());
        assert_eq!(once, twice);
    }
}
