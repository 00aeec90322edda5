//! Application state shared across handlers and middleware
//!
//! Built once at startup and passed explicitly; nothing in the crate reaches
//! for a global.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::resource::{FactoryRegistry, Kind};
use crate::rest::{Client, Consumers, Servers};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<FactoryRegistry>,
    pub consumers: Arc<Consumers>,
    pub servers: Arc<Servers>,
}

impl AppState {
    pub fn new(config: Config, registry: FactoryRegistry, consumers: Consumers, servers: Servers) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            consumers: Arc::new(consumers),
            servers: Arc::new(servers),
        }
    }

    /// Client for a sibling kind the stages cannot work without.
    pub fn required_client(&self, kind: &Kind) -> Result<&Client> {
        self.consumers.client(kind.as_str()).ok_or_else(|| {
            Error::internal_server(format!("could not determine {} resource endpoint", kind)).alarm()
        })
    }

    pub fn entity_client(&self) -> Result<&Client> {
        self.required_client(&Kind::ENTITY)
    }

    pub fn label_client(&self) -> Result<&Client> {
        self.required_client(&Kind::LABEL)
    }

    pub fn introspect_client(&self) -> Result<&Client> {
        self.required_client(&Kind::INTROSPECT)
    }
}
