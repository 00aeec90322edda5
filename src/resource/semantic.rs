use super::{Identity, Kind, Resource};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Meaning of an attribute: its type, alternate names, unit and valid range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Semantic {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(skip)]
    pub object_id: Option<ObjectId>,
    /// number, string, boolean, object, array...
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    /// Interval notation, e.g. `(1.0,2.0]`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraint: String,
    /// Attribute name → semantic id, when this semantic defines an object type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub semantic_ids: BTreeMap<String, String>,
}

impl Resource for Semantic {
    const KIND: Kind = Kind::SEMANTIC;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn init(&mut self) {
        self.object_id = Some(self.identity.init_persisted(Self::KIND));
    }

    fn bind_persistence_id(&mut self) {
        self.object_id = self.identity.object_id();
    }
}
