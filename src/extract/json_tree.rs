//! Generic walks over parsed JSON trees
//!
//! Object members are visited in document order; this relies on
//! serde_json's `preserve_order` feature.

use serde_json::Value;

/// Visits every object member in the tree, depth first, pre-order
///
/// The visitor receives the member's key and value. Array elements are
/// descended into but not reported, since they carry no key. Matching
/// members are still descended into, so a key nested inside another
/// occurrence of the same key is reported too.
pub fn walk<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(&'a str, &'a Value),
{
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(key.as_str(), child);
                walk(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, visit);
            }
        }
        _ => {}
    }
}

/// Collects every value stored under `key`, at any depth, in document order
pub fn collect_values<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    walk(value, &mut |member, child| {
        if member == key {
            found.push(child);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_at_any_depth() {
        let tree = json!({
            "a": {"paragraph": "X"},
            "body": "Y",
            "list": [{"paragraph": "Z"}, {"other": {"paragraph": 3}}]
        });

        assert_eq!(
            collect_values(&tree, "paragraph"),
            vec![&json!("X"), &json!("Z"), &json!(3)]
        );
        assert_eq!(collect_values(&tree, "body"), vec![&json!("Y")]);
    }

    #[test]
    fn test_nested_matches_are_kept() {
        let tree = json!({"content": {"content": "inner"}});
        let found = collect_values(&tree, "content");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0], &json!({"content": "inner"}));
        assert_eq!(found[1], &json!("inner"));
    }

    #[test]
    fn test_no_match_and_scalars() {
        assert!(collect_values(&json!({"a": 1}), "body").is_empty());
        assert!(collect_values(&json!("body"), "body").is_empty());
        assert!(collect_values(&json!(null), "body").is_empty());
    }

    #[test]
    fn test_walk_is_document_ordered() {
        let tree = json!({"z": 1, "a": {"m": 2}, "b": 3});
        let mut keys = Vec::new();
        walk(&tree, &mut |key, _| keys.push(key));

        assert_eq!(keys, vec!["z", "a", "m", "b"]);
    }
}
