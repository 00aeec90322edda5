//! Configuration management for Mesh Core

use crate::rest::Consumer;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Routing and outbound consumer configuration
    pub rest: RestConfig,
    /// Authorization and access stage configuration
    pub auth: AuthConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
    /// Kinds served by the binary from its in-memory store
    pub serve_kinds: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Prefix of every resource route, e.g. `/mesh/1.0`
    pub base_path: String,
    pub consumer_file: Option<PathBuf>,
    /// Sibling services by kind, loaded from `consumer_file`
    pub consumers: HashMap<String, Consumer>,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_idle_conns: usize,
    pub max_tries: u32,
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_idle_conns: 256,
            max_tries: 3,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// When false the authorization stage resolves the default entity
    /// without looking at the request.
    pub enabled: bool,
    /// When false the access stage is not installed.
    pub access_enabled: bool,
    pub default_entity_id: Option<String>,
    /// Client id accepted on public endpoints in place of a bearer token
    pub default_client_id: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            access_enabled: true,
            default_entity_id: None,
            default_client_id: "mesh-api-client-key".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `text` or `json`
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: false,
            service_name: "mesh-core".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let consumer_file = env::var("REST_CONSUMER_FILE").ok().map(PathBuf::from);
        let consumers = match &consumer_file {
            Some(path) => load_consumers(path)?,
            None => HashMap::new(),
        };

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            rest: RestConfig {
                base_path: normalize_base_path(
                    &env::var("REST_BASE_PATH").unwrap_or_else(|_| "/mesh/1.0".to_string()),
                ),
                consumer_file,
                consumers,
                transport: TransportConfig {
                    max_idle_conns: env::var("REST_TRANSPORT_MAX_IDLE_CONNS")
                        .unwrap_or_else(|_| "256".to_string())
                        .parse()
                        .context("Invalid REST_TRANSPORT_MAX_IDLE_CONNS")?,
                    max_tries: env::var("REST_TRANSPORT_MAX_TRIES")
                        .unwrap_or_else(|_| "3".to_string())
                        .parse()
                        .context("Invalid REST_TRANSPORT_MAX_TRIES")?,
                    request_timeout: Duration::from_secs(
                        env::var("REST_TRANSPORT_REQUEST_TIMEOUT")
                            .unwrap_or_else(|_| "60".to_string())
                            .parse()
                            .context("Invalid REST_TRANSPORT_REQUEST_TIMEOUT")?,
                    ),
                },
            },
            auth: AuthConfig {
                enabled: parse_bool(&env::var("AUTH_ENABLED").unwrap_or_else(|_| "true".to_string())),
                access_enabled: parse_bool(
                    &env::var("ACCESS_ENABLED").unwrap_or_else(|_| "true".to_string()),
                ),
                default_entity_id: env::var("AUTH_DEFAULT_ENTITY_ID")
                    .ok()
                    .filter(|id| !id.is_empty()),
                default_client_id: env::var("AUTH_DEFAULT_CLIENT_ID")
                    .unwrap_or_else(|_| "mesh-api-client-key".to_string()),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: parse_bool(
                    &env::var("METRICS_ENABLED").unwrap_or_else(|_| "false".to_string()),
                ),
                service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "mesh-core".to_string()),
            },
            serve_kinds: parse_list(
                &env::var("MESH_SERVE_KINDS").unwrap_or_else(|_| "entity,label".to_string()),
            ),
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Reads the consumer map: a JSON object from kind to consumer entry.
/// Entries without a kind take the key they are stored under.
pub fn load_consumers(path: &Path) -> Result<HashMap<String, Consumer>> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read consumer file {}", path.display()))?;
    let mut consumers: HashMap<String, Consumer> = serde_json::from_slice(&data)
        .with_context(|| format!("failed to parse consumer file {}", path.display()))?;
    for (kind, consumer) in consumers.iter_mut() {
        if consumer.kind.is_empty() {
            consumer.kind = kind.clone();
        }
    }
    Ok(consumers)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_base_path(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_temp(contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("mesh-consumers-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_consumers() {
        let path = write_temp(
            r#"{
                "entity": {"target": "http://entity:8080", "base_path": "/mesh/1.0"},
                "introspect": {"kind": "introspect", "target": "http://token:8080", "public": false},
                "token": {"target": "http://token:8080", "public": true, "actions": ["create"]}
            }"#,
        );
        let consumers = load_consumers(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(consumers.len(), 3);
        assert_eq!(consumers["entity"].kind, "entity");
        assert_eq!(consumers["entity"].target, "http://entity:8080");
        assert!(consumers["token"].public);
        assert_eq!(consumers["token"].actions, vec!["create".to_string()]);
    }

    #[test]
    fn test_load_consumers_missing_file_fails() {
        let path = env::temp_dir().join("mesh-consumers-does-not-exist.json");
        assert!(load_consumers(&path).is_err());
    }

    #[test]
    fn test_load_consumers_bad_json_fails() {
        let path = write_temp("[not an object");
        let result = load_consumers(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" TRUE "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("entity, label,,object"), vec!["entity", "label", "object"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/mesh/1.0/"), "/mesh/1.0");
        assert_eq!(normalize_base_path("mesh"), "/mesh");
        assert_eq!(normalize_base_path("/"), "");
    }

    #[test]
    fn test_defaults() {
        let transport = TransportConfig::default();
        assert_eq!(transport.max_idle_conns, 256);
        assert_eq!(transport.max_tries, 3);
        assert_eq!(AuthConfig::default().default_client_id, "mesh-api-client-key");
        assert_eq!(TelemetryConfig::default().log_format, "text");
    }
}
