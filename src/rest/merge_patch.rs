//! JSON merge patch (RFC 7396)

use serde_json::{Map, Value};

/// Applies `patch` to `target`.
///
/// Null members of an object patch delete the key, object members merge
/// recursively, and any other patch value replaces the target outright.
pub fn merge_patch(target: Value, patch: &Value) -> Value {
    let Value::Object(members) = patch else {
        return patch.clone();
    };
    let mut document = match target {
        Value::Object(document) => document,
        _ => Map::new(),
    };
    for (key, value) in members {
        if value.is_null() {
            document.remove(key);
        } else {
            let current = document.remove(key).unwrap_or(Value::Null);
            document.insert(key.clone(), merge_patch(current, value));
        }
    }
    Value::Object(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // Cases from RFC 7396 appendix A.
    #[test]
    fn test_rfc_examples() {
        let cases = [
            (json!({"a": "b"}), json!({"a": "c"}), json!({"a": "c"})),
            (json!({"a": "b"}), json!({"b": "c"}), json!({"a": "b", "b": "c"})),
            (json!({"a": "b"}), json!({"a": null}), json!({})),
            (json!({"a": "b", "b": "c"}), json!({"a": null}), json!({"b": "c"})),
            (json!({"a": ["b"]}), json!({"a": "c"}), json!({"a": "c"})),
            (json!({"a": "c"}), json!({"a": ["b"]}), json!({"a": ["b"]})),
            (
                json!({"a": {"b": "c"}}),
                json!({"a": {"b": "d", "c": null}}),
                json!({"a": {"b": "d"}}),
            ),
            (json!({"a": [{"b": "c"}]}), json!({"a": [1]}), json!({"a": [1]})),
            (json!(["a", "b"]), json!(["c", "d"]), json!(["c", "d"])),
            (json!({"a": "b"}), json!(["c"]), json!(["c"])),
            (json!({"a": "foo"}), json!(null), json!(null)),
            (json!({"a": "foo"}), json!("bar"), json!("bar")),
            (json!({"e": null}), json!({"a": 1}), json!({"e": null, "a": 1})),
            (json!([1, 2]), json!({"a": "b", "c": null}), json!({"a": "b"})),
            (json!({}), json!({"a": {"bb": {"ccc": null}}}), json!({"a": {"bb": {}}})),
        ];
        for (target, patch, expected) in cases {
            assert_eq!(merge_patch(target.clone(), &patch), expected, "target {} patch {}", target, patch);
        }
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let target = json!({"name": "space", "label_ids": ["a"]});
        assert_eq!(merge_patch(target.clone(), &json!({})), target);
    }
}
