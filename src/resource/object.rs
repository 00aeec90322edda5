//! Object kinds: file-like resources with an open JSON extension

use super::extension;
use super::{Identity, Kind, Resource, IDENTITY_FIELDS};
use bson::oid::ObjectId;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Metadata common to all object kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Inline content, or a reference into the object store.
    #[serde(rename = "$content", default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(rename = "$content_type", default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(rename = "$thumbnail", default, skip_serializing_if = "String::is_empty")]
    pub thumbnail: String,
    #[serde(rename = "$object_type", default, skip_serializing_if = "String::is_empty")]
    pub object_type: String,
    #[serde(rename = "$object_store", default, skip_serializing_if = "String::is_empty")]
    pub object_store: String,
    /// Last action applied to the object.
    #[serde(rename = "$action", default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(rename = "$state", default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(rename = "$status", default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(rename = "$classifications", default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<String>,
}

pub const META_FIELDS: &[&str] = &[
    "$content",
    "$content_type",
    "$thumbnail",
    "$object_type",
    "$object_store",
    "$action",
    "$state",
    "$status",
    "$classifications",
];

/// Kind-specific declared content of an object.
pub trait ObjectBody:
    Serialize + DeserializeOwned + Clone + Default + PartialEq + Debug + Send + Sync + 'static
{
    const KIND: Kind;
    /// JSON names this body owns; everything else goes to the extension.
    const FIELDS: &'static [&'static str];
}

/// The plain `object` kind declares nothing beyond the metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plain {}

impl ObjectBody for Plain {
    const KIND: Kind = Kind::OBJECT;
    const FIELDS: &'static [&'static str] = &[];
}

/// An object resource with body `B`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectOf<B: ObjectBody> {
    pub identity: Identity,
    pub object_id: Option<ObjectId>,
    pub meta: ObjectMeta,
    pub body: B,
    pub extension: Map<String, Value>,
}

pub type Object = ObjectOf<Plain>;

impl<B: ObjectBody> ObjectOf<B> {
    fn is_declared(name: &str) -> bool {
        IDENTITY_FIELDS.contains(&name) || META_FIELDS.contains(&name) || B::FIELDS.contains(&name)
    }
}

impl<B: ObjectBody> Serialize for ObjectOf<B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut document = Map::new();
        extension::absorb(&mut document, &self.identity).map_err(S::Error::custom)?;
        extension::absorb(&mut document, &self.meta).map_err(S::Error::custom)?;
        extension::absorb(&mut document, &self.body).map_err(S::Error::custom)?;
        extension::merge(&mut document, &self.extension, Self::is_declared);
        document.serialize(serializer)
    }
}

impl<'de, B: ObjectBody> Deserialize<'de> for ObjectOf<B> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Map::<String, Value>::deserialize(deserializer)?;
        let raw = Value::Object(document);
        let identity = Identity::deserialize(&raw).map_err(D::Error::custom)?;
        let meta = ObjectMeta::deserialize(&raw).map_err(D::Error::custom)?;
        let body = B::deserialize(&raw).map_err(D::Error::custom)?;
        let extension = match raw {
            Value::Object(document) => extension::strip(document, Self::is_declared),
            _ => Map::new(),
        };
        Ok(Self {
            identity,
            object_id: None,
            meta,
            body,
            extension,
        })
    }
}

impl<B: ObjectBody> Resource for ObjectOf<B>
where
    ObjectOf<B>: Into<super::AnyResource> + TryFrom<super::AnyResource, Error = super::AnyResource>,
{
    const KIND: Kind = B::KIND;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn init(&mut self) {
        self.object_id = Some(self.identity.init_persisted(Self::KIND));
        if self.meta.object_type.is_empty() {
            self.meta.object_type = B::KIND.to_string();
        }
    }

    fn bind_persistence_id(&mut self) {
        self.object_id = self.identity.object_id();
    }

    fn collapse(&mut self) {
        self.extension.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{decode, encode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_round_trip() {
        let body = json!({
            "$content": "report.pdf",
            "$content_type": "application/pdf",
            "color": "blue",
            "tags": ["a", "b"]
        });
        let object: Object = decode(body.to_string().as_bytes()).unwrap();

        assert_eq!(object.meta.content, "report.pdf");
        assert_eq!(object.meta.object_type, "object");
        assert_eq!(object.extension.get("color"), Some(&json!("blue")));
        assert!(!object.extension.contains_key("$content"));

        let encoded: Value = serde_json::from_slice(&encode(&object).unwrap()).unwrap();
        assert_eq!(encoded["color"], "blue");
        assert_eq!(encoded["tags"], json!(["a", "b"]));
        assert_eq!(encoded["$content"], "report.pdf");
        assert_eq!(encoded["kind"], "object");
    }

    #[test]
    fn test_extension_cannot_shadow_declared_fields() {
        let mut object = Object::fresh();
        object.meta.state = "real".to_string();
        object.extension.insert("$state".to_string(), json!("shadow"));
        object.extension.insert("id".to_string(), json!("shadow"));

        let encoded = serde_json::to_value(&object).unwrap();
        assert_eq!(encoded["$state"], "real");
        assert_eq!(encoded["id"], object.identity.id.as_str());
    }

    #[test]
    fn test_collapse_drops_extension() {
        let mut object: Object = decode(br#"{"$status":"a","extra":1}"#).unwrap();
        object.collapse();
        assert!(object.extension.is_empty());
    }

    #[test]
    fn test_decoded_object_binds_persistence_key() {
        let object = Object::fresh();
        let decoded: Object = decode(&encode(&object).unwrap()).unwrap();
        assert_eq!(decoded.object_id, object.object_id);
        assert_eq!(decoded, object);
    }
}
