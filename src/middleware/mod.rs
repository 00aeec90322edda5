//! HTTP middleware for Mesh Core
//!
//! The two stages run in order in front of every resource route:
//! [`authorization`] resolves the calling entity, [`access`] resolves the
//! spaces it belongs to.

pub mod access;
pub mod authorization;

pub use access::{access, order_spaces};
pub use authorization::{authorization, resolve_key};
