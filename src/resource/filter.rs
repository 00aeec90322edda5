//! Query descriptor sent as the body of `query`, `get` and `delete`

use super::{is_false, is_zero, Identity, Kind, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Result size used when a filter does not name one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Expansion name that asks the server to attach full labels to each result.
pub const EXPAND_LABELS: &str = "label_ids";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(flatten)]
    pub identity: Identity,
    /// Field path → expected value, or an operator object such as `{"$in": [...]}`.
    #[serde(rename = "$condition", default, skip_serializing_if = "Map::is_empty")]
    pub condition: Map<String, Value>,
    #[serde(rename = "$limit_number", default = "default_limit")]
    pub limit_number: i64,
    #[serde(rename = "$limit_after_inclusive", default, skip_serializing_if = "Option::is_none")]
    pub limit_after_inclusive: Option<DateTime<Utc>>,
    #[serde(rename = "$limit_before", default, skip_serializing_if = "Option::is_none")]
    pub limit_before: Option<DateTime<Utc>>,
    #[serde(rename = "$expand", default, skip_serializing_if = "Vec::is_empty")]
    pub expand: Vec<String>,
    #[serde(rename = "$collapse", default, skip_serializing_if = "is_false")]
    pub collapse: bool,
    #[serde(rename = "$page", default, skip_serializing_if = "is_zero")]
    pub page: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            condition: Map::new(),
            limit_number: DEFAULT_LIMIT,
            limit_after_inclusive: None,
            limit_before: None,
            expand: Vec::new(),
            collapse: false,
            page: 0,
        }
    }
}

impl Filter {
    /// Filter with a single equality condition.
    pub fn matching(field: &str, value: impl Into<Value>) -> Self {
        Self::default().and(field, value)
    }

    /// Filter on resources whose id is one of `ids`.
    pub fn ids_in<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        Self::default().and("identity.id", json!({ "$in": ids }))
    }

    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.condition.insert(field.to_string(), value.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit_number = limit;
        self
    }

    pub fn with_expand(mut self, name: impl Into<String>) -> Self {
        self.expand.push(name.into());
        self
    }

    pub fn expands(&self, name: &str) -> bool {
        self.expand.iter().any(|e| e == name)
    }

    /// Effective page size: non-positive limits fall back to the default.
    pub fn page_size(&self) -> usize {
        if self.limit_number > 0 {
            self.limit_number as usize
        } else {
            DEFAULT_LIMIT as usize
        }
    }
}

impl Resource for Filter {
    const KIND: Kind = Kind::FILTER;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::decode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_names() {
        let filter = Filter::matching("key", "a@b.c")
            .limit(5)
            .with_expand(EXPAND_LABELS);
        let json = serde_json::to_value(&filter).unwrap();

        assert_eq!(json["$condition"], json!({"key": "a@b.c"}));
        assert_eq!(json["$limit_number"], 5);
        assert_eq!(json["$expand"], json!(["label_ids"]));
        assert!(json.get("$page").is_none());
        assert!(json.get("$collapse").is_none());
    }

    #[test]
    fn test_missing_limit_defaults() {
        let filter: Filter = decode(br#"{"$condition":{"name":"space"}}"#).unwrap();
        assert_eq!(filter.limit_number, DEFAULT_LIMIT);
        assert_eq!(filter.page_size(), 100);
        assert_eq!(filter.identity.kind, Kind::FILTER);
    }

    #[test]
    fn test_ids_in() {
        let filter = Filter::ids_in(["a", "b"]).and("name", "space");
        assert_eq!(
            Value::Object(filter.condition),
            json!({"identity.id": {"$in": ["a", "b"]}, "name": "space"})
        );
    }

    #[test]
    fn test_expands() {
        let filter: Filter = serde_json::from_str(r#"{"$expand":["label_ids"]}"#).unwrap();
        assert!(filter.expands(EXPAND_LABELS));
        assert!(!filter.expands("policies"));
    }
}
