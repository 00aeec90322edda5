use super::{Client, Inbound, Producer, RequestContext, Route, Server, MAX_BODY_BYTES};
use crate::error::Error;
use crate::resource::{Factory, Kind};
use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, Method, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Every kind served by this process. Built once at startup.
#[derive(Default)]
pub struct Servers {
    servers: HashMap<Kind, Server>,
}

impl Servers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, server: Server) {
        self.servers.insert(server.kind().clone(), server);
    }

    /// Serves `factory`'s kind with the actions `producer` declares.
    pub fn serve<P: Producer>(
        &mut self,
        factory: Factory,
        producer: Arc<P>,
        labels: Option<Client>,
    ) {
        self.insert(Server::new(factory, producer.actions()).with_label_client(labels));
    }

    pub fn get(&self, kind: &str) -> Option<&Server> {
        self.servers.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &Kind> {
        self.servers.keys()
    }
}

/// Routes every path below the base path to the server of its kind.
///
/// Meant to be nested under the base path, so the handler sees
/// `/<kind>[:<action>][/<id>]`.
pub fn resource_router(servers: Arc<Servers>) -> Router {
    Router::new()
        .route("/{head}", any(dispatch))
        .route("/{head}/{*rest}", any(dispatch))
        .fallback(unmatched)
        .with_state(servers)
}

/// Paths no resource route matches, such as `/kind/` or `/`.
async fn unmatched(method: Method, uri: Uri) -> Response {
    Error::not_found(format!("no route for {} {}", method, uri.path()))
        .debug()
        .into_response()
}

async fn dispatch(
    State(servers): State<Arc<Servers>>,
    context: RequestContext,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let Some(route) = Route::parse(path) else {
        return Error::not_found(format!("no route for {}", path))
            .debug()
            .into_response();
    };
    let Some(server) = servers.get(&route.kind) else {
        return Error::not_found(format!("kind {} is not served here", route.kind))
            .debug()
            .into_response();
    };
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            return Error::bad_request(format!("could not read request body, {}", e))
                .debug()
                .into_response()
        }
    };
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .filter(|essence| !essence.is_empty());

    server
        .dispatch(Inbound {
            context,
            method: parts.method,
            route,
            content_type,
            body,
        })
        .await
}
