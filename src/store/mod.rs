//! Storage seam behind served kinds
//!
//! Documents are stored in their JSON form, one collection per kind, and are
//! addressed by their `id` field.

mod condition;
mod memory;
mod producer;

pub use condition::{lookup, matches, within_bounds};
pub use memory::MemoryStore;
pub use producer::StoreProducer;

use crate::error::Result;
use crate::resource::{Filter, Kind};
use async_trait::async_trait;
use serde_json::Value;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Adds a document. Fails if one with the same id exists.
    async fn insert(&self, kind: &Kind, document: Value) -> Result<()>;
    async fn find_by_id(&self, kind: &Kind, id: &str) -> Result<Option<Value>>;
    /// Documents matching the filter's condition and time bounds, one page.
    async fn find(&self, kind: &Kind, filter: &Filter) -> Result<Vec<Value>>;
    /// Replaces a document. Returns false when there was none.
    async fn replace(&self, kind: &Kind, id: &str, document: Value) -> Result<bool>;
    /// Returns false when there was nothing to delete.
    async fn delete(&self, kind: &Kind, id: &str) -> Result<bool>;
}
