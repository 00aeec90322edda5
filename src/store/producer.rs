use super::Store;
use crate::error::{Error, Result};
use crate::resource::{AnyResource, Factory, Filter, Kind};
use crate::rest::{Output, Producer, RequestContext};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Serves one kind straight out of a [`Store`].
pub struct StoreProducer<S> {
    store: Arc<S>,
    factory: Factory,
}

impl<S: Store> StoreProducer<S> {
    pub fn new(store: Arc<S>, factory: Factory) -> Self {
        Self { store, factory }
    }

    fn kind(&self) -> &Kind {
        self.factory.kind()
    }

    fn check_kind(&self, resource: &AnyResource) -> Result<()> {
        if resource.kind() != *self.kind() {
            return Err(Error::bad_request(format!(
                "expected {} but received {}",
                self.kind(),
                resource.kind()
            ))
            .debug());
        }
        Ok(())
    }

    /// Stored form: expanded labels are never persisted.
    fn document(resource: &AnyResource) -> Result<Value> {
        let mut resource = resource.clone();
        resource.identity_mut().labels = None;
        Ok(serde_json::to_value(&resource)?)
    }

    fn resource(&self, document: &Value) -> Result<AnyResource> {
        let bytes = serde_json::to_vec(document)?;
        self.factory.decode(&bytes).map_err(|e| {
            Error::internal_server(format!("stored {} is unreadable, {}", self.kind(), e.description))
                .alarm()
        })
    }

    async fn existing(&self, id: &str) -> Result<AnyResource> {
        match self.store.find_by_id(self.kind(), id).await? {
            Some(document) => self.resource(&document),
            None => Err(Error::not_found(format!("{} {} not found", self.kind(), id)).debug()),
        }
    }
}

#[async_trait]
impl<S: Store> Producer for StoreProducer<S> {
    async fn create(&self, _cx: &RequestContext, mut resource: AnyResource) -> Result<Output> {
        self.check_kind(&resource)?;
        resource.identity_mut().labels = None;
        self.store.insert(self.kind(), Self::document(&resource)?).await?;
        Ok(Output::One(resource))
    }

    async fn get(&self, _cx: &RequestContext, id: &str) -> Result<Output> {
        self.existing(id).await.map(Output::One)
    }

    async fn query(&self, _cx: &RequestContext, filter: Option<Filter>) -> Result<Output> {
        let filter = filter.unwrap_or_default();
        let documents = self.store.find(self.kind(), &filter).await?;
        let collection = documents
            .iter()
            .map(|document| self.resource(document))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .fold(self.factory.new_collection(), |collection, item| {
                self.factory.append(collection, item)
            });
        Ok(Output::Many(collection))
    }

    async fn set(&self, _cx: &RequestContext, id: &str, mut resource: AnyResource) -> Result<Output> {
        self.check_kind(&resource)?;
        let current = self.existing(id).await?;

        let identity = resource.identity_mut();
        identity.created = current.identity().created;
        identity.labels = None;

        if !self.store.replace(self.kind(), id, Self::document(&resource)?).await? {
            return Err(Error::not_found(format!("{} {} not found", self.kind(), id)).debug());
        }
        Ok(Output::One(resource))
    }

    async fn delete(&self, _cx: &RequestContext, id: &str) -> Result<()> {
        if !self.store.delete(self.kind(), id).await? {
            return Err(Error::not_found(format!("{} {} not found", self.kind(), id)).debug());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Entity, Label, Resource};
    use crate::store::{MemoryStore, MockStore};
    use pretty_assertions::assert_eq;

    fn producer() -> StoreProducer<MemoryStore> {
        StoreProducer::new(Arc::new(MemoryStore::new()), Factory::of::<Label>())
    }

    fn label(name: &str) -> Label {
        let mut label = Label::fresh();
        label.name = name.to_string();
        label
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let producer = producer();
        let cx = RequestContext::default();
        let created = label("space");

        producer.create(&cx, created.clone().into()).await.unwrap();
        let fetched = producer.get(&cx, &created.identity.id).await.unwrap();

        assert_eq!(fetched, Output::One(created.into()));
    }

    #[tokio::test]
    async fn test_create_strips_expanded_labels() {
        let producer = producer();
        let cx = RequestContext::default();
        let mut created = label("tag");
        created.identity.labels = Some(vec![label("space")]);

        producer.create(&cx, created.clone().into()).await.unwrap();
        let Output::One(fetched) = producer.get(&cx, &created.identity.id).await.unwrap() else {
            panic!("expected one resource");
        };
        assert_eq!(fetched.identity().labels, None);
    }

    #[tokio::test]
    async fn test_create_rejects_other_kind() {
        let producer = producer();
        let err = producer
            .create(&RequestContext::default(), Entity::fresh().into())
            .await
            .unwrap_err();
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn test_query_by_condition() {
        let producer = producer();
        let cx = RequestContext::default();
        producer.create(&cx, label("space").into()).await.unwrap();
        producer.create(&cx, label("tag").into()).await.unwrap();
        producer.create(&cx, label("space").into()).await.unwrap();

        let Output::Many(collection) = producer
            .query(&cx, Some(Filter::matching("name", "space")))
            .await
            .unwrap()
        else {
            panic!("expected a collection");
        };
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.kind(), &Kind::LABEL);
    }

    #[tokio::test]
    async fn test_set_keeps_created() {
        let producer = producer();
        let cx = RequestContext::default();
        let original = label("tag");
        producer.create(&cx, original.clone().into()).await.unwrap();

        let mut replacement = original.clone();
        replacement.value = "v2".to_string();
        replacement.identity.created = chrono::Utc::now() + chrono::Duration::days(1);

        let Output::One(stored) = producer
            .set(&cx, &original.identity.id, replacement.into())
            .await
            .unwrap()
        else {
            panic!("expected one resource");
        };
        let stored = stored.downcast::<Label>().unwrap();
        assert_eq!(stored.value, "v2");
        assert_eq!(stored.identity.created, original.identity.created);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let producer = producer();
        let cx = RequestContext::default();

        assert_eq!(producer.get(&cx, "nope").await.unwrap_err().code, "not_found");
        assert_eq!(producer.delete(&cx, "nope").await.unwrap_err().code, "not_found");
        let err = producer.set(&cx, "nope", label("x").into()).await.unwrap_err();
        assert_eq!(err.code, "not_found");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockStore::new();
        store
            .expect_find()
            .returning(|_, _| Err(Error::internal_server("store offline")));
        let producer = StoreProducer::new(Arc::new(store), Factory::of::<Label>());

        let err = producer
            .query(&RequestContext::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.description, "store offline");
    }
}
