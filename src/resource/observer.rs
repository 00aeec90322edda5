//! Change notification kinds
//!
//! An [`Observable`] describes when something worth reporting happens, either
//! a condition over resources or a cron schedule. An [`Observer`] describes
//! where to deliver it.

use super::{is_false, Identity, Kind, Resource};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(skip)]
    pub object_id: Option<ObjectId>,
    /// Url or kind:action that receives the notification.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
    #[serde(rename = "async", default, skip_serializing_if = "is_false")]
    pub is_async: bool,
    /// Observers to notify after this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<String>,
}

impl Resource for Observer {
    const KIND: Kind = Kind::OBSERVER;

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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(skip)]
    pub object_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub condition: Map<String, Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cron: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
}

impl Resource for Observable {
    const KIND: Kind = Kind::OBSERVABLE;

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
