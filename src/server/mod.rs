//! Server initialization and routing

use crate::config::Config;
use crate::middleware;
use crate::resource::{FactoryRegistry, Kind};
use crate::rest::{resource_router, Consumers, Servers, Transport};
use crate::state::AppState;
use crate::store::{MemoryStore, StoreProducer};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub kinds: Vec<String>,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut kinds: Vec<String> = state.servers.kinds().map(Kind::to_string).collect();
    kinds.sort();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        kinds,
    })
}

/// Builds the application state: consumers from the configuration and one
/// store-backed server per configured kind, all sharing one [`MemoryStore`].
pub fn build_state(config: Config) -> Result<AppState> {
    let registry = FactoryRegistry::standard();
    let transport = Transport::new(&config.rest.transport)?;
    let consumers = Consumers::new(&config.rest.consumers, &transport);
    let labels = consumers.client(Kind::LABEL.as_str()).cloned();

    let store = Arc::new(MemoryStore::new());
    let mut servers = Servers::new();
    for kind in &config.serve_kinds {
        let factory = registry
            .get(kind)
            .cloned()
            .with_context(|| format!("unknown kind {} in MESH_SERVE_KINDS", kind))?;
        let producer = Arc::new(StoreProducer::new(store.clone(), factory.clone()));
        servers.serve(factory, producer, labels.clone());
        info!(kind = %kind, "serving kind");
    }

    Ok(AppState::new(config, registry, consumers, servers))
}

/// Build the HTTP router.
///
/// Resource routes live under the base path behind the authorization stage,
/// and the access stage when it is enabled. `/health` and `/metrics` are
/// open.
pub fn build_router(state: AppState, prometheus: Option<PrometheusHandle>) -> Router {
    let mut resources = resource_router(state.servers.clone());
    if state.config.auth.access_enabled {
        resources = resources.layer(from_fn_with_state(state.clone(), middleware::access));
    }
    resources = resources.layer(from_fn_with_state(state.clone(), middleware::authorization));

    let mut app = Router::new()
        .route("/health", get(health))
        .with_state(state.clone());
    if let Some(handle) = prometheus {
        app = app.route(
            "/metrics",
            get(move || std::future::ready(handle.render())),
        );
    }

    let base_path = state.config.rest.base_path.as_str();
    let app = if base_path.is_empty() {
        app.merge(resources)
    } else {
        app.nest(base_path, resources)
    };

    app.layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config, prometheus: Option<PrometheusHandle>) -> Result<()> {
    let http_addr = config.http_addr();
    let state = build_state(config)?;
    let app = build_router(state, prometheus);

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal, {}", e);
    }
}
