//! Uniform resource model
//!
//! Every value exchanged between mesh services is a resource: it carries an
//! [`Identity`], belongs to exactly one [`Kind`], and has a canonical JSON
//! form. Kinds are registered once, in [`registry`], which also produces the
//! [`AnyResource`] sum type and the standard [`FactoryRegistry`].

mod entity;
mod extension;
mod factory;
mod filter;
mod id;
mod identity;
mod label;
mod log;
mod object;
mod observer;
mod policy;
mod registry;
mod semantic;
mod text;
mod token;

pub use entity::Entity;
pub use factory::{Collection, Factory, FactoryRegistry};
pub use filter::{Filter, DEFAULT_LIMIT, EXPAND_LABELS};
pub use id::Id;
pub use identity::{Identity, IDENTITY_FIELDS};
pub use label::{Label, LAMBDA_LABEL, SCOPE_LABEL, SPACE_LABEL};
pub use log::{Level, Log};
pub use object::{Object, ObjectBody, ObjectMeta, ObjectOf, Plain};
pub use observer::{Observable, Observer};
pub use policy::Policy;
pub use registry::AnyResource;
pub use semantic::Semantic;
pub use text::{
    Address, AddressContent, Block, BoundingBox, Page, Text, TextAddress, TextContent, TextTree,
    TreeContent, Vertex,
};
pub use token::{GrantType, Token};

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Short lowercase name of a resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(Cow<'static, str>);

impl Kind {
    pub const ENTITY: Kind = Kind::from_static("entity");
    pub const LABEL: Kind = Kind::from_static("label");
    pub const FILTER: Kind = Kind::from_static("filter");
    pub const POLICY: Kind = Kind::from_static("policy");
    pub const OBSERVER: Kind = Kind::from_static("observer");
    pub const OBSERVABLE: Kind = Kind::from_static("observable");
    pub const SEMANTIC: Kind = Kind::from_static("semantic");
    pub const OBJECT: Kind = Kind::from_static("object");
    pub const TEXT: Kind = Kind::from_static("text");
    pub const TEXT_TREE: Kind = Kind::from_static("text_tree");
    pub const TEXT_ADDRESS: Kind = Kind::from_static("text_address");
    pub const TOKEN: Kind = Kind::from_static("token");
    pub const ERROR: Kind = Kind::from_static("error");
    pub const LOG: Kind = Kind::from_static("log");
    /// Token service endpoint that resolves a bearer code into a [`Token`].
    pub const INTROSPECT: Kind = Kind::from_static("introspect");

    pub const fn from_static(name: &'static str) -> Self {
        Kind(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Kind(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Kind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Kind::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Kind::new(name)
    }
}

impl PartialEq<str> for Kind {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Kind {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// A typed resource kind.
pub trait Resource:
    Serialize
    + DeserializeOwned
    + Clone
    + Default
    + Send
    + Sync
    + Into<AnyResource>
    + TryFrom<AnyResource, Error = AnyResource>
    + 'static
{
    const KIND: Kind;

    fn identity(&self) -> &Identity;

    fn identity_mut(&mut self) -> &mut Identity;

    /// Assigns a fresh identity of this kind.
    fn init(&mut self) {
        self.identity_mut().init(Self::KIND);
    }

    /// Re-derives any persistence key from an identity that was decoded.
    fn bind_persistence_id(&mut self) {}

    /// Drops free-form content that is not part of the kind's declared shape.
    fn collapse(&mut self) {}

    /// Default value with a fresh identity.
    fn fresh() -> Self {
        let mut resource = Self::default();
        resource.init();
        resource
    }
}

/// Decodes one resource of kind `R` from its JSON form.
///
/// A body without an id is given a fresh identity; otherwise the id is kept
/// and any persistence key is rebound from it.
pub fn decode<R: Resource>(bytes: &[u8]) -> Result<R> {
    let mut resource: R = serde_json::from_slice(bytes).map_err(|e| {
        Error::bad_request(format!("could not unmarshal given {}, {}", R::KIND, e)).debug()
    })?;
    if resource.identity().id.is_empty() {
        resource.init();
    } else {
        resource.bind_persistence_id();
    }
    Ok(resource)
}

/// Decodes a JSON array of resources of kind `R`.
pub fn decode_many<R: Resource>(bytes: &[u8]) -> Result<Vec<R>> {
    let mut resources: Vec<R> = serde_json::from_slice(bytes).map_err(|e| {
        Error::bad_request(format!("could not unmarshal given {} list, {}", R::KIND, e)).debug()
    })?;
    for resource in resources.iter_mut() {
        if resource.identity().id.is_empty() {
            resource.init();
        } else {
            resource.bind_persistence_id();
        }
    }
    Ok(resources)
}

pub fn encode<R: Serialize + ?Sized>(resource: &R) -> Result<Vec<u8>> {
    serde_json::to_vec(resource)
        .map_err(|e| Error::internal_server(format!("could not marshal resource, {}", e)).alarm())
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

pub(crate) fn is_zero(value: &i64) -> bool {
    *value == 0
}

pub(crate) fn is_unset(time: &DateTime<Utc>) -> bool {
    *time == DateTime::<Utc>::default()
}
