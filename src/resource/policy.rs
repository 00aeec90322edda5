use super::{Identity, Kind, Resource};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Grants an access type when its condition holds. Higher priority wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(skip)]
    pub object_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grant: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub condition: Map<String, Value>,
    #[serde(default)]
    pub priority: i64,
}

impl Resource for Policy {
    const KIND: Kind = Kind::POLICY;

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
