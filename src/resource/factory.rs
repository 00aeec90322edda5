//! Per-kind construction, decoding and collections

use super::{decode, encode, AnyResource, Kind, Resource};
use crate::error::Result;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Ordered sequence of resources of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    kind: Kind,
    items: Vec<AnyResource>,
}

impl Collection {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[AnyResource] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [AnyResource] {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<AnyResource> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnyResource> {
        self.items.iter()
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

/// Capabilities of one resource kind.
#[derive(Clone)]
pub struct Factory {
    kind: Kind,
    fresh: fn() -> AnyResource,
    decode: fn(&[u8]) -> Result<AnyResource>,
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory").field("kind", &self.kind).finish()
    }
}

fn fresh_any<R: Resource>() -> AnyResource {
    R::fresh().into()
}

fn decode_any<R: Resource>(bytes: &[u8]) -> Result<AnyResource> {
    decode::<R>(bytes).map(Into::into)
}

impl Factory {
    pub fn of<R: Resource>() -> Self {
        Self {
            kind: R::KIND,
            fresh: fresh_any::<R>,
            decode: decode_any::<R>,
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// New resource with a fresh identity.
    pub fn new_resource(&self) -> AnyResource {
        (self.fresh)()
    }

    pub fn new_collection(&self) -> Collection {
        Collection::new(self.kind.clone())
    }

    /// Appends `item` when it is of this factory's kind. Any other item is
    /// reported and the collection comes back unchanged.
    pub fn append(&self, mut collection: Collection, item: AnyResource) -> Collection {
        let item_kind = item.kind();
        if item_kind != self.kind || collection.kind != self.kind {
            tracing::error!(
                factory = %self.kind,
                collection = %collection.kind,
                item = %item_kind,
                "refusing to append resource of another kind"
            );
            return collection;
        }
        collection.items.push(item);
        collection
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<AnyResource> {
        (self.decode)(bytes)
    }

    pub fn encode(&self, resource: &AnyResource) -> Result<Vec<u8>> {
        encode(resource)
    }
}

/// Factories by kind. Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<Kind, Factory>,
}

impl FactoryRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Factory) {
        self.factories.insert(factory.kind.clone(), factory);
    }

    pub fn get(&self, kind: &str) -> Option<&Factory> {
        self.factories.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &Kind> {
        self.factories.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Entity, Label};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_same_kind() {
        let factory = Factory::of::<Label>();
        let collection = factory.new_collection();
        let collection = factory.append(collection, Label::fresh().into());
        let collection = factory.append(collection, Label::fresh().into());

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.kind(), &Kind::LABEL);
    }

    #[test]
    fn test_append_other_kind_is_refused() {
        let factory = Factory::of::<Label>();
        let collection = factory.append(factory.new_collection(), Label::fresh().into());
        let before = collection.clone();

        let after = factory.append(collection, Entity::fresh().into());
        assert_eq!(after, before);
    }

    #[test]
    fn test_decode_through_factory() {
        let factory = Factory::of::<Entity>();
        let any = factory.decode(br#"{"key":"svc"}"#).unwrap();

        assert_eq!(any.kind(), Kind::ENTITY);
        let entity = any.downcast::<Entity>().unwrap();
        assert_eq!(entity.key, "svc");
    }

    #[test]
    fn test_collection_serializes_as_array() {
        let factory = Factory::of::<Label>();
        let collection = factory.append(factory.new_collection(), Label::fresh().into());
        let json = serde_json::to_value(&collection).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 1);
    }
}
