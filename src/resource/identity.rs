//! Identity shared by every resource kind

use super::{is_unset, Id, Kind, Label};
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON field names owned by [`Identity`].
pub const IDENTITY_FIELDS: &[&str] = &[
    "id",
    "kind",
    "label_ids",
    "labels",
    "created",
    "updated",
    "version_id",
    "documentation",
    "semantic_id",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Encoded [`Id`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Kind::is_empty")]
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    /// Expanded labels, only present on responses that asked for them.
    /// Never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<String>,
}

impl Identity {
    /// Assigns a new random id of `kind` and stamps both timestamps.
    pub fn init(&mut self, kind: Kind) {
        let id = Id::new(kind);
        self.assign(id);
    }

    pub fn init_with_element(&mut self, kind: Kind, element: impl Into<String>) {
        let id = Id::with_element(kind, element);
        self.assign(id);
    }

    /// Like [`Identity::init`], with the element drawn from a new persistence key.
    pub fn init_persisted(&mut self, kind: Kind) -> ObjectId {
        let object_id = ObjectId::new();
        self.init_with_element(kind, object_id.to_hex());
        object_id
    }

    fn assign(&mut self, id: Id) {
        let now = Utc::now();
        self.kind = id.kind().clone();
        self.id = id.to_string();
        self.created = now;
        self.updated = now;
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Decoded id; [`Id::INVALID`] when the stored id is malformed.
    pub fn parsed_id(&self) -> Id {
        Id::parse(&self.id)
    }

    /// Persistence key carried in the id element, if it is one.
    pub fn object_id(&self) -> Option<ObjectId> {
        let id = self.parsed_id();
        if !id.is_valid() {
            return None;
        }
        ObjectId::parse_str(id.element()).ok()
    }
}
