//! Work-list traversal over a JSON payload.

use serde_json::{Map, Value};

use crate::sanitize::{SanitizeOptions, SanitizeReport};

/// A rewrite applied to the nodes reached by [`walk`].
///
/// Mapping hooks run before the walker queues the mapping's values, so
/// entries removed by `visit_mapping` are never visited.
pub trait NodeRule {
    fn visit_mapping(&mut self, _map: &mut Map<String, Value>, _report: &mut SanitizeReport) {}

    fn visit_string(&mut self, _text: &mut String, _report: &mut SanitizeReport) {}
}

/// Apply `rule` to every node reachable from `root`.
///
/// Uses an explicit stack instead of recursion. Arrays and mappings deeper
/// than `options.max_depth` are replaced by `null`.
pub fn walk<R: NodeRule>(root: &mut Value, options: &SanitizeOptions, rule: &mut R) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    let mut pending: Vec<(&mut Value, usize)> = vec![(root, 0)];

    while let Some((node, depth)) = pending.pop() {
        if depth > options.max_depth && is_container(node) {
            *node = Value::Null;
            report.subtrees_truncated += 1;
            continue;
        }

        match node {
            Value::Object(map) => {
                rule.visit_mapping(map, &mut report);
                pending.extend(map.values_mut().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                if options.descend_into_arrays {
                    pending.extend(items.iter_mut().map(|child| (child, depth + 1)));
                }
            }
            Value::String(text) => rule.visit_string(text, &mut report),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    report
}

fn is_container(node: &Value) -> bool {
    matches!(node, Value::Object(_) | Value::Array(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Counts the strings it sees.
    #[derive(Default)]
    struct StringCounter(usize);

    impl NodeRule for StringCounter {
        fn visit_string(&mut self, _text: &mut String, _report: &mut SanitizeReport) {
            self.0 += 1;
        }
    }

    fn nested(depth: usize) -> Value {
        let mut value = json!("leaf");
        for _ in 0..depth {
            value = json!({ "next": value });
        }
        value
    }

    #[test]
    fn test_visits_strings_through_mappings_and_arrays() {
        let mut value = json!({
            "a": "x",
            "b": { "c": "y" },
            "d": ["z", { "e": "w" }]
        });
        let mut counter = StringCounter::default();
        walk(&mut value, &SanitizeOptions::default(), &mut counter);
        assert_eq!(counter.0, 4);
    }

    #[test]
    fn test_legacy_mode_skips_arrays() {
        let mut value = json!({ "a": "x", "d": ["z", { "e": "w" }] });
        let mut counter = StringCounter::default();
        walk(&mut value, &SanitizeOptions::legacy(), &mut counter);
        assert_eq!(counter.0, 1);
    }

    #[test]
    fn test_truncates_containers_beyond_max_depth() {
        let options = SanitizeOptions {
            max_depth: 2,
            ..SanitizeOptions::default()
        };
        let mut value = nested(4);
        let report = walk(&mut value, &options, &mut StringCounter::default());

        assert_eq!(report.subtrees_truncated, 1);
        assert_eq!(value, json!({ "next": { "next": { "next": null } } }));
    }

    #[test]
    fn test_scalar_leaves_are_not_truncated() {
        let options = SanitizeOptions {
            max_depth: 1,
            ..SanitizeOptions::default()
        };
        let mut value = json!({ "a": { "b": 1, "c": "s" } });
        let report = walk(&mut value, &options, &mut StringCounter::default());

        assert!(report.is_clean());
        assert_eq!(value, json!({ "a": { "b": 1, "c": "s" } }));
    }

    #[test]
    fn test_deep_payload_is_cut_at_max_depth() {
        let mut value = nested(1_000);
        let report = walk(&mut value, &SanitizeOptions::default(), &mut StringCounter::default());
        assert_eq!(report.subtrees_truncated, 1);

        let mut depth = 0;
        let mut cursor = &value;
        while let Some(next) = cursor.get("next") {
            depth += 1;
            cursor = next;
        }
        assert_eq!(depth, 33);
        assert!(cursor.is_null());
    }
}
