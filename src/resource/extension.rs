//! Free-form JSON extension of object kinds
//!
//! Object kinds keep every field they do not declare in an extension map.
//! On encode the declared parts are written first and the extension entries
//! are merged in without overwriting them; on decode the declared names are
//! removed from the raw document and the rest becomes the extension.

use serde::Serialize;
use serde_json::{Map, Value};

/// Writes the fields of `part` into `document`.
pub(crate) fn absorb<T: Serialize>(
    document: &mut Map<String, Value>,
    part: &T,
) -> Result<(), serde_json::Error> {
    if let Value::Object(fields) = serde_json::to_value(part)? {
        document.extend(fields);
    }
    Ok(())
}

/// Adds extension entries that neither collide with a declared name nor
/// with a field already written.
pub(crate) fn merge(
    document: &mut Map<String, Value>,
    extension: &Map<String, Value>,
    is_declared: impl Fn(&str) -> bool,
) {
    for (key, value) in extension {
        if is_declared(key) || document.contains_key(key) {
            continue;
        }
        document.insert(key.clone(), value.clone());
    }
}

/// Remaining entries once declared names are stripped.
pub(crate) fn strip(
    mut document: Map<String, Value>,
    is_declared: impl Fn(&str) -> bool,
) -> Map<String, Value> {
    document.retain(|key, _| !is_declared(key));
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declared(name: &str) -> bool {
        matches!(name, "id" | "text")
    }

    #[test]
    fn test_merge_never_overwrites() {
        let mut document = json!({"id": "a", "text": "t"}).as_object().cloned().unwrap();
        let extension = json!({"id": "b", "color": "red"}).as_object().cloned().unwrap();

        merge(&mut document, &extension, declared);

        assert_eq!(Value::Object(document), json!({"id": "a", "text": "t", "color": "red"}));
    }

    #[test]
    fn test_strip_removes_declared() {
        let document = json!({"id": "a", "text": "t", "size": 3}).as_object().cloned().unwrap();
        let rest = strip(document, declared);
        assert_eq!(Value::Object(rest), json!({"size": 3}));
    }
}
