//! Mesh Core - resource mesh service backend
//!
//! This crate provides the uniform resource model shared by mesh services,
//! the generic action dispatcher serving it over REST, the client used to
//! call sibling services, and the authorization and access stages that
//! resolve who is calling.

pub mod config;
pub mod error;
pub mod middleware;
pub mod resource;
pub mod rest;
pub mod server;
pub mod state;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
