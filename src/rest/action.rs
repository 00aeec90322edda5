//! Action declarations and the values that flow through them

use super::{RequestContext, CONTENT_TYPE_JSON};
use crate::error::Result;
use crate::resource::{AnyResource, Collection, Filter};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub const ACTION_CREATE: &str = "create";
pub const ACTION_GET: &str = "get";
pub const ACTION_QUERY: &str = "query";
pub const ACTION_SET: &str = "set";
pub const ACTION_MERGE: &str = "merge";
pub const ACTION_DELETE: &str = "delete";

pub const CANONICAL_ACTIONS: [&str; 6] = [
    ACTION_CREATE,
    ACTION_GET,
    ACTION_QUERY,
    ACTION_SET,
    ACTION_MERGE,
    ACTION_DELETE,
];

/// What a JSON body decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// A resource of the served kind.
    Object,
    Filter,
}

/// How the id travels in the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStyle {
    /// A single identifier; a leading slash is stripped.
    Identifier,
    /// A hierarchical path, passed on with its leading slash.
    Path,
}

/// Decoded request content.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    None,
    Filter(Filter),
    Resource(AnyResource),
    Raw { content_type: String, body: Bytes },
}

impl Input {
    pub fn is_none(&self) -> bool {
        matches!(self, Input::None)
    }

    pub fn into_resource(self) -> Option<AnyResource> {
        match self {
            Input::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn into_filter(self) -> Option<Filter> {
        match self {
            Input::Filter(filter) => Some(filter),
            _ => None,
        }
    }
}

/// Handler result, encoded by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// No content: 204 for reads, an error for writes.
    None,
    One(AnyResource),
    Many(Collection),
    Json(Value),
    Raw { content_type: String, body: Bytes },
}

impl Output {
    pub fn is_none(&self) -> bool {
        matches!(self, Output::None)
    }

    /// Number of items, for outputs that are sequences.
    pub fn count(&self) -> Option<usize> {
        match self {
            Output::Many(collection) => Some(collection.len()),
            Output::Json(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }
}

impl From<AnyResource> for Output {
    fn from(resource: AnyResource) -> Self {
        Output::One(resource)
    }
}

impl From<Collection> for Output {
    fn from(collection: Collection) -> Self {
        Output::Many(collection)
    }
}

/// Everything a handler receives for one call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub context: RequestContext,
    pub action: String,
    /// Empty when the action takes no id.
    pub id: String,
    pub input: Input,
}

pub type Handler = Arc<dyn Fn(Invocation) -> BoxFuture<'static, Result<Output>> + Send + Sync>;

/// Declaration of one verb a resource kind supports.
#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub expects_id: bool,
    pub payload: Payload,
    pub id_style: IdStyle,
    /// Accepted request content types, in preference order.
    pub content_types: Vec<String>,
    handler: Option<Handler>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("expects_id", &self.expects_id)
            .field("payload", &self.payload)
            .field("id_style", &self.id_style)
            .field("content_types", &self.content_types)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl Action {
    /// Custom action taking a JSON object and no id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expects_id: false,
            payload: Payload::Object,
            id_style: IdStyle::Identifier,
            content_types: vec![CONTENT_TYPE_JSON.to_string()],
            handler: None,
        }
    }

    pub fn create() -> Self {
        Self::new(ACTION_CREATE)
    }

    pub fn get() -> Self {
        Self::new(ACTION_GET).with_id().with_filter()
    }

    pub fn query() -> Self {
        Self::new(ACTION_QUERY).with_filter()
    }

    pub fn set() -> Self {
        Self::new(ACTION_SET).with_id()
    }

    /// Merge is composed by the server from get and set and has no handler.
    pub fn merge() -> Self {
        Self::new(ACTION_MERGE).with_id()
    }

    pub fn delete() -> Self {
        Self::new(ACTION_DELETE).with_id().with_filter()
    }

    pub fn with_id(mut self) -> Self {
        self.expects_id = true;
        self
    }

    pub fn with_filter(mut self) -> Self {
        self.payload = Payload::Filter;
        self
    }

    /// Take the id as a hierarchical path.
    pub fn with_path_id(mut self) -> Self {
        self.expects_id = true;
        self.id_style = IdStyle::Path;
        self
    }

    pub fn with_content_types<I, S>(mut self, content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_types = content_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Output>> + Send + 'static,
    {
        self.handler = Some(Arc::new(
            move |invocation: Invocation| -> BoxFuture<'static, Result<Output>> {
                Box::pin(handler(invocation))
            },
        ));
        self
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn is_canonical(&self) -> bool {
        CANONICAL_ACTIONS.contains(&self.name.as_str())
    }

    /// Accepts `content_type` when it matches one of the declared types,
    /// ignoring parameters such as `charset`.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        self.content_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Label, Resource};

    #[test]
    fn test_canonical_declarations() {
        assert!(!Action::create().expects_id);
        assert_eq!(Action::create().payload, Payload::Object);
        assert!(Action::get().expects_id);
        assert_eq!(Action::query().payload, Payload::Filter);
        assert!(!Action::query().expects_id);
        assert_eq!(Action::set().payload, Payload::Object);
        assert!(Action::delete().expects_id);
        assert!(Action::merge().is_canonical());
        assert!(!Action::new("publish").is_canonical());
    }

    #[test]
    fn test_accepts_ignores_parameters() {
        let action = Action::new("upload").with_content_types(["application/json", "image/png"]);

        assert!(action.accepts("application/json; charset=utf-8"));
        assert!(action.accepts("IMAGE/PNG"));
        assert!(!action.accepts("text/plain"));
    }

    #[test]
    fn test_path_id_implies_expected_id() {
        let action = Action::new("fetch").with_path_id();
        assert!(action.expects_id);
        assert_eq!(action.id_style, IdStyle::Path);
    }

    #[tokio::test]
    async fn test_handler_is_invoked() {
        let action = Action::new("echo").with_handler(|invocation: Invocation| async move {
            Ok(match invocation.input {
                Input::Resource(resource) => Output::One(resource),
                _ => Output::None,
            })
        });
        let label: AnyResource = Label::fresh().into();
        let handler = action.handler().unwrap();

        let output = handler(Invocation {
            context: RequestContext::default(),
            action: "echo".to_string(),
            id: String::new(),
            input: Input::Resource(label.clone()),
        })
        .await
        .unwrap();

        assert_eq!(output, Output::One(label));
    }

    #[test]
    fn test_output_count() {
        assert_eq!(Output::Json(serde_json::json!([1, 2, 3])).count(), Some(3));
        assert_eq!(Output::None.count(), None);
    }
}
