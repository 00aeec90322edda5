//! Authorization stage
//!
//! Resolves the calling entity and stores it in the [`RequestContext`]
//! request extension. The entity comes from one of three places:
//!
//! - the default entity, when authorization is disabled
//! - the bearer token, introspected by the token service and mapped to an
//!   entity key by grant type
//! - client credentials in the body, on endpoints of public consumers
//!
//! Whatever the source, a disabled entity is rejected last.

use crate::error::{Error, Result};
use crate::resource::{decode, Entity, Filter, GrantType, Token};
use crate::rest::{
    RequestContext, ACTION_DELIMITER, ACTION_GET, MAX_BODY_BYTES, NO_BODY,
};
use crate::state::AppState;
use crate::telemetry::metrics::record_authorization;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

/// Body accepted on public endpoints in place of a bearer token.
#[derive(Debug, Default, Deserialize)]
struct ClientCredentials {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
}

pub async fn authorization(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authorize(&state, &mut request).await {
        Ok(context) => {
            record_authorization("granted");
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => {
            record_authorization("denied");
            e.into_response()
        }
    }
}

async fn authorize(state: &AppState, request: &mut Request) -> Result<RequestContext> {
    let mut cx = RequestContext::from_headers(request.headers());

    let entity = if !state.config.auth.enabled {
        tracing::debug!("authorization disabled, defaulting to the default entity");
        default_entity(state, &cx).await?
    } else if cx.authorization.is_some() {
        let code = authorization_code(cx.authorization.as_deref())?.to_string();
        let key = introspect(state, &cx, &code).await?;
        entity_by_key(state, &cx, &key).await?
    } else if let Some(kind) = public_kind(state, request.uri().path()) {
        tracing::debug!(kind = %kind, "missing authorization header on public endpoint, checking client credentials");
        let credentials = replay_credentials(request).await?;
        if credentials.client_id != state.config.auth.default_client_id {
            return Err(Error::forbidden("failed to provide valid credentials").debug());
        }
        let entity = default_entity(state, &cx).await?;
        verify_secret(&credentials.client_secret, &entity.secret)?;
        entity
    } else {
        return Err(Error::forbidden("missing authorization header").debug());
    };

    if entity.is_disabled {
        return Err(Error::forbidden(
            "these credentials are currently disabled, this could be due to pending account creation",
        )
        .debug());
    }
    tracing::debug!(key = %entity.key, "request authorized");

    cx.entity_id = Some(entity.identity.id.clone());
    cx.entity = Some(Arc::new(entity));
    Ok(cx)
}

/// Code part of an `Authorization: <scheme> <code>` header.
fn authorization_code(header: Option<&str>) -> Result<&str> {
    let malformed = || Error::forbidden("authorization header malformed").debug();
    let mut parts = header.ok_or_else(malformed)?.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(code), None) if !code.is_empty() => Ok(code),
        _ => Err(malformed()),
    }
}

/// Kind of the addressed endpoint when its consumer is flagged public.
fn public_kind(state: &AppState, path: &str) -> Option<String> {
    let path = path
        .strip_prefix(state.config.rest.base_path.as_str())
        .unwrap_or(path);
    let segment = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    let kind = segment.split(ACTION_DELIMITER).next().unwrap_or_default();
    (!kind.is_empty() && state.consumers.is_public(kind)).then(|| kind.to_string())
}

/// Reads the client credentials and puts the body back for the dispatcher.
async fn replay_credentials(request: &mut Request) -> Result<ClientCredentials> {
    let body = std::mem::replace(request.body_mut(), Body::empty());
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| Error::bad_request(format!("failed to read request body, {}", e)).debug())?;
    *request.body_mut() = Body::from(bytes.clone());

    if bytes.is_empty() {
        return Err(Error::bad_request("missing required request body").debug());
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::bad_request(format!("failed to unmarshal request body, {}", e)).debug())
}

fn verify_secret(secret: &str, hash: &str) -> Result<()> {
    let invalid = || Error::forbidden("failed to provide valid credentials").debug();
    let parsed = PasswordHash::new(hash).map_err(|_| invalid())?;
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .map_err(|_| invalid())
}

async fn default_entity(state: &AppState, cx: &RequestContext) -> Result<Entity> {
    let id = state
        .config
        .auth
        .default_entity_id
        .as_deref()
        .ok_or_else(|| Error::internal_server("default entity id is not configured").alarm())?;
    let client = state.entity_client()?;
    let body = client
        .post(cx, ACTION_GET, id, NO_BODY)
        .await
        .map_err(|e| Error::internal_server(format!("failed to contact data server, {}", e)).alarm())?;
    decode::<Entity>(&body).map_err(|e| {
        Error::internal_server(format!("could not unmarshal entity, {}", e.description)).alarm()
    })
}

/// Resolves a bearer code into the key of the entity it belongs to.
async fn introspect(state: &AppState, cx: &RequestContext, code: &str) -> Result<String> {
    let client = state.introspect_client()?;
    let body = client.post_with_query(cx, "", "", &[("code", code)]).await?;
    let token: Token = serde_json::from_slice(&body)
        .map_err(|e| Error::internal_server(format!("could not unmarshal token, {}", e)).alarm())?;
    resolve_key(&token)
}

/// Entity key a token stands for.
///
/// User grants key on the email, client credentials on the client id. A
/// token that breaks that shape, or has any other grant, is an alarm.
pub fn resolve_key(token: &Token) -> Result<String> {
    match token.grant() {
        GrantType::AuthorizationCode | GrantType::Token | GrantType::Password => {
            if token.email.is_empty() {
                return Err(Error::internal_server(format!(
                    "token of grant type, {} is missing required identity",
                    token.grant_type
                ))
                .alarm());
            }
            Ok(token.email.clone())
        }
        GrantType::ClientCredentials => {
            if !token.email.is_empty() {
                return Err(Error::internal_server(format!(
                    "token of grant type, {} includes identity, {}",
                    token.grant_type, token.email
                ))
                .alarm());
            }
            Ok(token.client_id.clone())
        }
        other => Err(Error::internal_server(format!("token of grant type, {} unexpected", other)).alarm()),
    }
}

async fn entity_by_key(state: &AppState, cx: &RequestContext, key: &str) -> Result<Entity> {
    let client = state.entity_client()?;
    let entities: Vec<Entity> = client
        .query(cx, &Filter::matching("key", key))
        .await
        .map_err(|e| Error::internal_server(format!("failed to contact data server, {}", e)).alarm())?;
    let mut entities = entities.into_iter();
    match (entities.next(), entities.next()) {
        (None, _) => Err(Error::forbidden("entity has not been given access").debug()),
        (Some(entity), None) => Ok(entity),
        (Some(_), Some(_)) => {
            Err(Error::internal_server(format!("multiple entities found for one key, {}", key)).alarm())
        }
    }
}
