//! Per-kind dispatch server
//!
//! A [`Server`] owns the action table of one resource kind. It maps a
//! method and route onto a declared [`Action`], decodes the request
//! content, runs the handler and encodes what comes back.

use super::expand::expand_labels;
use super::merge_patch::merge_patch;
use super::{
    Action, Client, Handler, Input, Invocation, Output, Payload, RequestContext, Route,
    ACTION_CREATE, ACTION_DELETE, ACTION_DELIMITER, ACTION_GET, ACTION_MERGE, ACTION_QUERY,
    ACTION_SET, CONTENT_TYPE_JSON, HEADER_COUNT, HEADER_LATENCY,
};
use crate::error::{Error, Result};
use crate::resource::{decode, encode, AnyResource, Factory, Filter, Kind, EXPAND_LABELS};
use crate::telemetry::metrics::record_action;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

/// One inbound request, as seen by a [`Server`].
#[derive(Debug, Clone)]
pub struct Inbound {
    pub context: RequestContext,
    pub method: Method,
    pub route: Route,
    /// Media type without parameters, lowercased.
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct Server {
    factory: Factory,
    /// Keyed by `/kind:action`.
    actions: HashMap<String, Action>,
    labels: Option<Client>,
}

impl Server {
    pub fn new(factory: Factory, actions: Vec<Action>) -> Self {
        let mut server = Self {
            factory,
            actions: HashMap::new(),
            labels: None,
        };
        for action in actions {
            if action.handler().is_none() && action.name != ACTION_MERGE {
                Error::internal_server(format!(
                    "action {} has no handler",
                    server.route_key(&action.name)
                ))
                .alarm();
            }
            server.actions.insert(server.route_key(&action.name), action);
        }
        server
    }

    /// Client used to expand labels on query results.
    pub fn with_label_client(mut self, client: Option<Client>) -> Self {
        self.labels = client;
        self
    }

    pub fn kind(&self) -> &Kind {
        self.factory.kind()
    }

    pub fn route_key(&self, action: &str) -> String {
        format!("/{}{}{}", self.kind(), ACTION_DELIMITER, action)
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(&self.route_key(name))
    }

    /// Handles one request. Never fails: errors become their JSON response.
    pub async fn dispatch(&self, inbound: Inbound) -> Response {
        let result = match inbound.route.action.clone() {
            Some(name) if inbound.method == Method::POST => self.dispatch_named(&name, inbound).await,
            Some(_) => Err(route_not_found(&inbound)),
            None => self.dispatch_canonical(inbound).await,
        };
        result.unwrap_or_else(IntoResponse::into_response)
    }

    async fn dispatch_canonical(&self, inbound: Inbound) -> Result<Response> {
        let method = inbound.method.clone();
        if !inbound.route.has_id() {
            return if method == Method::POST {
                self.create(inbound).await
            } else if method == Method::GET {
                self.query(inbound).await
            } else {
                Err(route_not_found(&inbound))
            };
        }
        if method == Method::GET {
            self.get(inbound).await
        } else if method == Method::PUT {
            self.set(inbound).await
        } else if method == Method::PATCH {
            self.merge(inbound).await
        } else if method == Method::DELETE {
            self.delete(inbound).await
        } else {
            Err(route_not_found(&inbound))
        }
    }

    async fn dispatch_named(&self, name: &str, inbound: Inbound) -> Result<Response> {
        match name {
            ACTION_CREATE => self.create(inbound).await,
            ACTION_GET => self.get(inbound).await,
            ACTION_QUERY => self.query(inbound).await,
            ACTION_SET => self.set(inbound).await,
            ACTION_MERGE => self.merge(inbound).await,
            ACTION_DELETE => self.delete(inbound).await,
            _ => self.act(name, inbound).await,
        }
    }

    async fn create(&self, inbound: Inbound) -> Result<Response> {
        let action = self.declared(ACTION_CREATE)?;
        if inbound.route.has_id() {
            return Err(route_not_found(&inbound));
        }
        let input = self.content(action, &inbound)?;
        if input.is_none() {
            return Err(Error::bad_request("request missing expected resource").debug());
        }
        let (output, latency) = self
            .invoke(action, inbound.context, String::new(), input)
            .await?;
        if output.is_none() {
            return Err(Error::internal_server("no content after create").alarm());
        }
        respond(output, latency)
    }

    async fn get(&self, inbound: Inbound) -> Result<Response> {
        let action = self.declared(ACTION_GET)?;
        let id = required_id(action, &inbound.route)?;
        let input = self.content(action, &inbound)?;
        let (output, latency) = self.invoke(action, inbound.context, id, input).await?;
        respond(output, latency)
    }

    async fn query(&self, inbound: Inbound) -> Result<Response> {
        let action = self.declared(ACTION_QUERY)?;
        if inbound.route.has_id() {
            return Err(route_not_found(&inbound));
        }
        let input = self.content(action, &inbound)?;
        let filter = match &input {
            Input::Filter(filter) => Some(filter.clone()),
            _ => None,
        };
        let context = inbound.context.clone();
        let (output, latency) = self.invoke(action, inbound.context, String::new(), input).await?;

        let output = match output {
            Output::Many(mut collection) => {
                if let Some(filter) = &filter {
                    if filter.collapse {
                        collection.items_mut().iter_mut().for_each(AnyResource::collapse);
                    }
                    if filter.expands(EXPAND_LABELS) {
                        expand_labels(self.labels.as_ref(), &context, &mut collection).await;
                    }
                }
                Output::Many(collection)
            }
            Output::None => Output::None,
            other => {
                tracing::error!(kind = %self.kind(), "unexpected type returned from query");
                other
            }
        };
        respond(output, latency)
    }

    async fn set(&self, inbound: Inbound) -> Result<Response> {
        let action = self.declared(ACTION_SET)?;
        let id = required_id(action, &inbound.route)?;
        let input = match self.content(action, &inbound)? {
            Input::Resource(resource) => Input::Resource(bind_to_id(resource, &id)),
            Input::None => {
                return Err(Error::bad_request("request missing expected resource").debug())
            }
            other => other,
        };
        let (output, latency) = self.invoke(action, inbound.context, id, input).await?;
        if output.is_none() {
            return Err(Error::internal_server("no content after set").alarm());
        }
        respond(output, latency)
    }

    /// Get, apply the JSON merge patch, then set.
    async fn merge(&self, inbound: Inbound) -> Result<Response> {
        let merge = self.declared(ACTION_MERGE)?;
        let id = required_id(merge, &inbound.route)?;
        let get = self.declared(ACTION_GET)?;
        let set = self.declared(ACTION_SET)?;

        let (current, get_latency) = self
            .invoke(get, inbound.context.clone(), id.clone(), Input::None)
            .await?;
        let current = match current {
            Output::One(resource) => serde_json::to_value(&resource)?,
            Output::None => {
                return Err(Error::not_found(format!("{} {} not found", self.kind(), id)).debug())
            }
            _ => {
                return Err(Error::internal_server("unexpected type returned from get").alarm())
            }
        };

        if inbound.content_type.as_deref() != Some(CONTENT_TYPE_JSON) {
            return Err(Error::bad_request("merge requires content type application/json").debug());
        }
        let patch: Value = serde_json::from_slice(&inbound.body)
            .map_err(|e| Error::bad_request(format!("could not merge given JSON, {}", e)).debug())?;
        let merged = encode(&merge_patch(current, &patch))?;
        let resource = bind_to_id(self.factory.decode(&merged)?, &id);

        let (output, set_latency) = self
            .invoke(set, inbound.context, id, Input::Resource(resource))
            .await?;
        if output.is_none() {
            return Err(Error::internal_server("no content after merge").alarm());
        }
        respond(output, get_latency + set_latency)
    }

    async fn delete(&self, inbound: Inbound) -> Result<Response> {
        let action = self.declared(ACTION_DELETE)?;
        let id = required_id(action, &inbound.route)?;
        let input = self.content(action, &inbound)?;
        let (_, latency) = self.invoke(action, inbound.context, id, input).await?;
        respond(Output::None, latency)
    }

    /// Custom action.
    async fn act(&self, name: &str, inbound: Inbound) -> Result<Response> {
        let action = self.declared(name)?;
        let id = match (action.expects_id, inbound.route.id(action.id_style)) {
            (true, Some(id)) => id,
            (true, None) => return Err(Error::bad_request("request missing expected id").debug()),
            (false, Some(_)) => return Err(route_not_found(&inbound)),
            (false, None) => String::new(),
        };
        if action.handler().is_none() {
            return Err(Error::internal_server(format!(
                "resource handler not found for {}",
                self.route_key(name)
            ))
            .alarm());
        }
        let input = self.content(action, &inbound)?;
        let (output, latency) = self.invoke(action, inbound.context, id, input).await?;
        respond(output, latency)
    }

    fn declared(&self, name: &str) -> Result<&Action> {
        self.action(name).ok_or_else(|| {
            Error::not_found(format!("{} is not supported", self.route_key(name))).debug()
        })
    }

    /// Decodes the request body as declared by `action`.
    fn content(&self, action: &Action, inbound: &Inbound) -> Result<Input> {
        if inbound.body.is_empty() {
            return Ok(Input::None);
        }
        let content_type = inbound.content_type.as_deref().unwrap_or_default();
        if !action.accepts(content_type) {
            return Err(Error::bad_request("content type not supported").debug());
        }
        if content_type == CONTENT_TYPE_JSON {
            return match action.payload {
                Payload::Filter => decode::<Filter>(&inbound.body).map(Input::Filter),
                Payload::Object => self.factory.decode(&inbound.body).map(Input::Resource),
            };
        }
        if action.payload == Payload::Filter {
            return Err(Error::bad_request("filter must be sent as application/json").debug());
        }
        Ok(Input::Raw {
            content_type: content_type.to_string(),
            body: inbound.body.clone(),
        })
    }

    async fn invoke(
        &self,
        action: &Action,
        context: RequestContext,
        id: String,
        input: Input,
    ) -> Result<(Output, Duration)> {
        let handler = action.handler().ok_or_else(|| {
            Error::internal_server(format!(
                "resource handler not found for {}",
                self.route_key(&action.name)
            ))
            .alarm()
        })?;
        let invocation = Invocation {
            context,
            action: action.name.clone(),
            id,
            input,
        };

        let started = Instant::now();
        let result = match run_guarded(handler, invocation).await {
            Ok(result) => result,
            Err(panic) => Err(Error::internal_server(format!(
                "panic in {}, {}",
                self.route_key(&action.name),
                panic_message(panic.as_ref())
            ))
            .alarm()),
        };
        let elapsed = started.elapsed();

        let status = match &result {
            Ok(_) => StatusCode::OK.as_u16(),
            Err(e) => e.status,
        };
        record_action(self.kind().as_str(), &action.name, status, elapsed);
        result.map(|output| (output, elapsed))
    }
}

async fn run_guarded(
    handler: &Handler,
    invocation: Invocation,
) -> std::result::Result<Result<Output>, Box<dyn Any + Send>> {
    let future = std::panic::catch_unwind(AssertUnwindSafe(|| handler(invocation)))?;
    AssertUnwindSafe(future).catch_unwind().await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn required_id(action: &Action, route: &Route) -> Result<String> {
    route
        .id(action.id_style)
        .ok_or_else(|| Error::bad_request("missing required id parameter").debug())
}

/// Points a decoded body at the id it is being written to and marks it updated.
fn bind_to_id(mut resource: AnyResource, id: &str) -> AnyResource {
    if resource.id() != id {
        resource.identity_mut().id = id.to_string();
        resource.bind_persistence_id();
    }
    resource.identity_mut().touch();
    resource
}

fn route_not_found(inbound: &Inbound) -> Error {
    Error::not_found(format!("no route for {} {}", inbound.method, route_path(&inbound.route))).debug()
}

fn route_path(route: &Route) -> String {
    let mut path = format!("/{}", route.kind);
    if let Some(action) = &route.action {
        path.push_str(ACTION_DELIMITER);
        path.push_str(action);
    }
    if let Some(rest) = &route.rest {
        path.push_str(rest);
    }
    path
}

/// Encodes a handler output. `Output::None` is `204 No Content`.
fn respond(output: Output, latency: Duration) -> Result<Response> {
    let count = output.count();
    let (status, content_type, body) = match output {
        Output::None => (StatusCode::NO_CONTENT, None, Bytes::new()),
        Output::One(resource) => (
            StatusCode::OK,
            Some(CONTENT_TYPE_JSON.to_string()),
            Bytes::from(encode(&resource)?),
        ),
        Output::Many(collection) => (
            StatusCode::OK,
            Some(CONTENT_TYPE_JSON.to_string()),
            Bytes::from(encode(&collection)?),
        ),
        Output::Json(value) => (
            StatusCode::OK,
            Some(CONTENT_TYPE_JSON.to_string()),
            Bytes::from(encode(&value)?),
        ),
        Output::Raw { content_type, body } => (StatusCode::OK, Some(content_type), body),
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    if let Some(content_type) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
        headers.insert(CONTENT_TYPE, content_type);
    }
    if let Ok(latency) = HeaderValue::from_str(&format!("{:?}", latency)) {
        headers.insert(HEADER_LATENCY, latency);
    }
    if let Some(count) = count {
        headers.insert(HEADER_COUNT, HeaderValue::from(count));
    }
    Ok(response)
}
