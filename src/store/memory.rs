use super::condition::{matches, within_bounds};
use super::Store;
use crate::error::{Error, Result};
use crate::resource::{Filter, Kind};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store. Documents keep their insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Kind, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn id_of(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, kind: &Kind, document: Value) -> Result<()> {
        let id = id_of(&document)
            .ok_or_else(|| Error::bad_request(format!("{} document has no id", kind)).debug())?
            .to_string();
        let mut collections = self.collections.write().await;
        let documents = collections.entry(kind.clone()).or_default();
        if documents.iter().any(|d| id_of(d) == Some(id.as_str())) {
            return Err(Error::bad_request(format!("{} {} already exists", kind, id)).debug());
        }
        documents.push(document);
        Ok(())
    }

    async fn find_by_id(&self, kind: &Kind, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(kind)
            .and_then(|documents| documents.iter().find(|d| id_of(d) == Some(id)))
            .cloned())
    }

    async fn find(&self, kind: &Kind, filter: &Filter) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(kind) else {
            return Ok(Vec::new());
        };
        let size = filter.page_size();
        let skip = usize::try_from(filter.page).unwrap_or(0).saturating_mul(size);
        Ok(documents
            .iter()
            .filter(|d| matches(d, &filter.condition) && within_bounds(d, filter))
            .skip(skip)
            .take(size)
            .cloned()
            .collect())
    }

    async fn replace(&self, kind: &Kind, id: &str, document: Value) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(kind)
            .and_then(|documents| documents.iter_mut().find(|d| id_of(d) == Some(id)));
        Ok(match slot {
            Some(slot) => {
                *slot = document;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, kind: &Kind, id: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(kind) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|d| id_of(d) != Some(id));
        Ok(documents.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let store = MemoryStore::new();
        store.insert(&Kind::LABEL, json!({"id": "a", "name": "space"})).await.unwrap();

        let found = store.find_by_id(&Kind::LABEL, "a").await.unwrap();
        assert_eq!(found, Some(json!({"id": "a", "name": "space"})));
        assert_eq!(store.find_by_id(&Kind::ENTITY, "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let store = MemoryStore::new();
        store.insert(&Kind::LABEL, json!({"id": "a"})).await.unwrap();
        let err = store.insert(&Kind::LABEL, json!({"id": "a"})).await.unwrap_err();
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn test_find_pages_in_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert(&Kind::LABEL, json!({"id": format!("l{}", i), "name": "tag"}))
                .await
                .unwrap();
        }
        store.insert(&Kind::LABEL, json!({"id": "s", "name": "space"})).await.unwrap();

        let mut filter = Filter::matching("name", "tag").limit(2);
        filter.page = 1;
        let page: Vec<Value> = store.find(&Kind::LABEL, &filter).await.unwrap();
        let ids: Vec<&str> = page.iter().filter_map(id_of).collect();
        assert_eq!(ids, vec!["l2", "l3"]);
    }

    #[tokio::test]
    async fn test_replace_and_delete() {
        let store = MemoryStore::new();
        store.insert(&Kind::LABEL, json!({"id": "a", "value": "1"})).await.unwrap();

        assert!(store.replace(&Kind::LABEL, "a", json!({"id": "a", "value": "2"})).await.unwrap());
        assert!(!store.replace(&Kind::LABEL, "b", json!({"id": "b"})).await.unwrap());
        assert_eq!(
            store.find_by_id(&Kind::LABEL, "a").await.unwrap(),
            Some(json!({"id": "a", "value": "2"}))
        );

        assert!(store.delete(&Kind::LABEL, "a").await.unwrap());
        assert!(!store.delete(&Kind::LABEL, "a").await.unwrap());
    }
}
