use super::{is_false, Identity, Kind, Resource};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A principal: a person, service or device that can hold credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(skip)]
    pub object_id: Option<ObjectId>,
    #[serde(rename = "$thumbnail", default, skip_serializing_if = "String::is_empty")]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_types: Vec<String>,
    /// Lookup key, usually an email address or a client id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    /// PHC-encoded secret hash.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

impl Resource for Entity {
    const KIND: Kind = Kind::ENTITY;

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
