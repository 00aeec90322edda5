//! Request-scoped context shared by the stages and the dispatcher

use super::{HEADER_AUTHORIZATION, HEADER_TRANSACTION_ID};
use crate::resource::{Entity, Label};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

/// Values resolved for one inbound request. Never persisted.
///
/// The authorization and access stages fill it in and store it in the
/// request extensions; handlers receive it by value and hand it to any
/// [`Client`](super::Client) call so the transaction id and authorization
/// travel with outbound requests.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub transaction_id: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    pub entity_id: Option<String>,
    pub entity: Option<Arc<Entity>>,
    /// Spaces of the entity, owned space first.
    pub spaces: Vec<Label>,
    pub space_ids: Vec<String>,
}

impl RequestContext {
    /// Context for calls that are not made on behalf of an inbound request.
    pub fn anonymous() -> Self {
        Self {
            transaction_id: Some(Uuid::new_v4().to_string()),
            ..Self::default()
        }
    }

    /// Captures the transaction id and authorization of an inbound request,
    /// generating a transaction id when the caller did not send one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            transaction_id: Some(
                header(HEADER_TRANSACTION_ID).unwrap_or_else(|| Uuid::new_v4().to_string()),
            ),
            authorization: header(HEADER_AUTHORIZATION),
            ..Self::default()
        }
    }

    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Token part of a bearer authorization.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.authorization.as_deref()?;
        let token = match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            Some(_) => return None,
            None => value,
        };
        (!token.is_empty()).then_some(token)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_headers(&parts.headers)))
    }
}
