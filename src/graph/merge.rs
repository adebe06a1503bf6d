//! Path-data merge semantics (§4.3.1). A sentinel `child_data = null` at the
//! top level means "reset `_data` to empty object" (one of the two
//! behaviors observed for `null` payloads per spec.md §9's open question —
//! see DESIGN.md for why this reading was chosen over the alternative).

use serde_json::{Map, Value};

use crate::edge::PathData;

/// Recursively merges `patch` into `target`. Key-by-key: a `null` value
/// deletes the key from `target` if present; an object value recurses; any
/// other value replaces. Returns whether anything in `target` actually
/// changed, so callers can distinguish "updated" from "existing" (§4.3.1
/// step 3).
pub fn merge_path_data(target: &mut PathData, patch: Option<&Map<String, Value>>) -> bool {
    let Some(patch) = patch else {
        // Top-level `child_data = null`: reset to empty object.
        if target.is_empty() {
            return false;
        }
        target.clear();
        return true;
    };

    let mut changed = false;
    for (key, value) in patch {
        match value {
            Value::Null => {
                if target.remove(key).is_some() {
                    changed = true;
                }
            }
            Value::Object(nested) => {
                let entry = target.entry(key.clone()).or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                    changed = true;
                }
                let Value::Object(entry_map) = entry else { unreachable!() };
                if merge_path_data(entry_map, Some(nested)) {
                    changed = true;
                }
            }
            other => {
                if target.get(key) != Some(other) {
                    target.insert(key.clone(), other.clone());
                    changed = true;
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn null_patch_resets_to_empty() {
        let mut target = map(json!({"a": 1, "b": 2}));
        let changed = merge_path_data(&mut target, None);
        assert!(changed);
        assert!(target.is_empty());
    }

    #[test]
    fn null_patch_on_already_empty_is_a_no_op() {
        let mut target = Map::new();
        assert!(!merge_path_data(&mut target, None));
    }

    #[test]
    fn null_valued_key_deletes_that_key_only() {
        let mut target = map(json!({"a": 1, "b": 2}));
        let patch = map(json!({"a": null}));
        assert!(merge_path_data(&mut target, Some(&patch)));
        assert_eq!(target, map(json!({"b": 2})));
    }

    #[test]
    fn nested_object_recurses() {
        let mut target = map(json!({"nested": {"x": 1, "y": 2}}));
        let patch = map(json!({"nested": {"x": null, "z": 3}}));
        assert!(merge_path_data(&mut target, Some(&patch)));
        assert_eq!(target, map(json!({"nested": {"y": 2, "z": 3}})));
    }

    #[test]
    fn scalar_replace_reports_no_change_when_identical() {
        let mut target = map(json!({"a": 1}));
        let patch = map(json!({"a": 1}));
        assert!(!merge_path_data(&mut target, Some(&patch)));
    }
}
