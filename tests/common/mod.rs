//! Common test utilities

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use mesh_core::config::{AuthConfig, Config, RestConfig, TelemetryConfig, TransportConfig};
use mesh_core::rest::Consumer;
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;

pub const BASE_PATH: &str = "/mesh/1.0";

/// Configuration pointing every given kind at `target`.
pub fn test_config(target: &str, kinds: &[(&str, bool)]) -> Config {
    let consumers = kinds
        .iter()
        .map(|(kind, public)| {
            (
                kind.to_string(),
                Consumer {
                    kind: kind.to_string(),
                    target: target.to_string(),
                    base_path: BASE_PATH.to_string(),
                    public: *public,
                    ..Consumer::default()
                },
            )
        })
        .collect::<HashMap<_, _>>();

    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        rest: RestConfig {
            base_path: BASE_PATH.to_string(),
            consumer_file: None,
            consumers,
            transport: TransportConfig {
                max_tries: 1,
                ..TransportConfig::default()
            },
        },
        auth: AuthConfig {
            default_entity_id: None,
            ..AuthConfig::default()
        },
        telemetry: TelemetryConfig::default(),
        serve_kinds: vec!["label".to_string()],
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Sends one request through the router.
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<(&str, Vec<u8>)>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some((content_type, body)) => builder
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn send_json(
    app: &Router,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: &Value,
) -> TestResponse {
    send(
        app,
        method,
        path,
        headers,
        Some(("application/json", serde_json::to_vec(body).unwrap())),
    )
    .await
}
