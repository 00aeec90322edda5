//! Filter conditions evaluated against stored documents
//!
//! Supported: equality, `{"$in": [...]}`, dotted paths. Identity fields are
//! flattened into the document, so an `identity.` prefix is dropped. When
//! the stored value is an array, a condition matches if any element does.

use crate::resource::Filter;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const IDENTITY_PREFIX: &str = "identity.";
const OP_IN: &str = "$in";

pub fn matches(document: &Value, condition: &Map<String, Value>) -> bool {
    condition.iter().all(|(field, expected)| {
        let actual = lookup(document, field);
        match expected.as_object().and_then(|operator| operator.get(OP_IN)) {
            Some(Value::Array(candidates)) => candidates.iter().any(|c| contains(actual, c)),
            Some(_) => false,
            None => contains(actual, expected),
        }
    })
}

/// Value at a dotted path, `None` when any step is missing.
pub fn lookup<'a>(document: &'a Value, field: &str) -> Option<&'a Value> {
    let field = field.strip_prefix(IDENTITY_PREFIX).unwrap_or(field);
    field
        .split('.')
        .try_fold(document, |value, step| value.as_object()?.get(step))
}

/// Whether the document's `created` falls inside the filter's time window.
pub fn within_bounds(document: &Value, filter: &Filter) -> bool {
    if filter.limit_after_inclusive.is_none() && filter.limit_before.is_none() {
        return true;
    }
    let Some(created) = lookup(document, "created")
        .and_then(Value::as_str)
        .and_then(|created| created.parse::<DateTime<Utc>>().ok())
    else {
        return false;
    };
    filter.limit_after_inclusive.map_or(true, |after| created >= after)
        && filter.limit_before.map_or(true, |before| created < before)
}

fn contains(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
        None => expected.is_null(),
    }
}
