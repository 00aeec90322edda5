use super::{Identity, Kind, Resource};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Label name that marks a label as a space, the unit of access delegation.
pub const SPACE_LABEL: &str = "space";
pub const LAMBDA_LABEL: &str = "lambda";
pub const SCOPE_LABEL: &str = "scope";

/// A named tag. Labels are themselves resources, so a label may carry labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(skip)]
    pub object_id: Option<ObjectId>,
    /// Ids of resources carrying this label. Computed, never persisted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Label {
    pub fn is_space(&self) -> bool {
        self.name == SPACE_LABEL
    }
}

impl Resource for Label {
    const KIND: Kind = Kind::LABEL;

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
