//! REST plumbing shared by every mesh service
//!
//! - [`Server`] dispatches `/<kind>[:<action>][/<id>]` requests onto the
//!   [`Action`]s a [`Producer`] declares.
//! - [`Client`] calls the same surface on sibling services.
//! - [`RequestContext`] carries the per-request values both sides need.

mod action;
mod client;
mod consumers;
mod context;
mod expand;
mod merge_patch;
mod producer;
mod route;
mod router;
mod server;

pub use action::{
    Action, Handler, IdStyle, Input, Invocation, Output, Payload, ACTION_CREATE, ACTION_DELETE,
    ACTION_GET, ACTION_MERGE, ACTION_QUERY, ACTION_SET, CANONICAL_ACTIONS,
};
pub use client::{classify, normalize_status_text, Client, Consumer, Transport, NO_BODY};
pub use consumers::Consumers;
pub use context::RequestContext;
pub use expand::expand_labels;
pub use merge_patch::merge_patch;
pub use producer::{standard_actions, Producer};
pub use route::Route;
pub use router::{resource_router, Servers};
pub use server::{Inbound, Server};

/// Separates the kind from the action in a route segment: `label:query`.
pub const ACTION_DELIMITER: &str = ":";

pub const CONTENT_TYPE_JSON: &str = "application/json";

// Header names are lowercase so they can be used as `HeaderName` keys directly.
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_TRANSACTION_ID: &str = "x-transactionid";
pub const HEADER_LATENCY: &str = "x-latency";
pub const HEADER_COUNT: &str = "x-count";

/// Largest request body the dispatcher reads.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
