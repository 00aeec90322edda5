//! Outbound client toward sibling services' routers

use super::{RequestContext, ACTION_DELIMITER, ACTION_GET, ACTION_QUERY, CONTENT_TYPE_JSON, HEADER_TRANSACTION_ID};
use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::resource::{decode, decode_many, Filter, Resource};
use crate::telemetry::metrics::record_client_request;
use anyhow::Context;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Body argument for calls that send nothing.
pub const NO_BODY: Option<&'static ()> = None;

/// Where a sibling service serving one kind lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    #[serde(default)]
    pub kind: String,
    /// Actions the consumer is known to expose. Informational.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Scheme and authority, e.g. `http://entity:8080`.
    pub target: String,
    #[serde(default)]
    pub base_path: String,
    /// Endpoints of this kind accept client credentials in place of a token.
    #[serde(default)]
    pub public: bool,
}

/// Connection pool shared by every [`Client`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    max_tries: u32,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_idle_conns)
            .timeout(config.request_timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            http,
            max_tries: config.max_tries.max(1),
        })
    }
}

/// Client for one consumer.
#[derive(Debug, Clone)]
pub struct Client {
    consumer: Consumer,
    transport: Transport,
}

impl Client {
    pub fn new(consumer: Consumer, transport: Transport) -> Self {
        Self {
            consumer,
            transport,
        }
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// `target + base_path + "/" + kind [+ ":" + action] [+ "/" + id]`
    pub fn url(&self, action: &str, id: &str) -> String {
        let mut url = format!(
            "{}{}/{}",
            self.consumer.target, self.consumer.base_path, self.consumer.kind
        );
        if !action.is_empty() {
            url.push_str(ACTION_DELIMITER);
            url.push_str(action);
        }
        let id = id.trim_start_matches('/');
        if !id.is_empty() {
            url.push('/');
            url.push_str(id);
        }
        url
    }

    /// Posts `body` as JSON, or an empty body for `None`, and returns the raw
    /// response body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        cx: &RequestContext,
        action: &str,
        id: &str,
        body: Option<&B>,
    ) -> Result<Bytes> {
        let body = match body {
            Some(body) => Bytes::from(serde_json::to_vec(body).map_err(|e| {
                Error::internal_server(format!("could not marshal request body, {}", e)).alarm()
            })?),
            None => Bytes::new(),
        };
        self.send(cx, action, id, &[], CONTENT_TYPE_JSON, body)
            .await
            .map(|(body, _)| body)
    }

    /// Empty-bodied post with query parameters.
    pub async fn post_with_query(
        &self,
        cx: &RequestContext,
        action: &str,
        id: &str,
        query: &[(&str, &str)],
    ) -> Result<Bytes> {
        self.send(cx, action, id, query, CONTENT_TYPE_JSON, Bytes::new())
            .await
            .map(|(body, _)| body)
    }

    /// Posts a non-JSON body. Returns the response body and its content type.
    pub async fn post_with_raw(
        &self,
        cx: &RequestContext,
        action: &str,
        id: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(Bytes, Option<String>)> {
        self.send(cx, action, id, &[], content_type, body).await
    }

    /// Fetches one resource by id.
    pub async fn get<R: Resource>(&self, cx: &RequestContext, id: &str) -> Result<R> {
        let body = self.post(cx, ACTION_GET, id, NO_BODY).await?;
        if body.is_empty() {
            return Err(Error::not_found(format!("{} {} not found", self.consumer.kind, id)).debug());
        }
        decode(&body).map_err(|e| unexpected_body(&self.consumer.kind, e))
    }

    /// Runs a query; a `204 No Content` answer is an empty result.
    pub async fn query<R: Resource>(&self, cx: &RequestContext, filter: &Filter) -> Result<Vec<R>> {
        let body = self.post(cx, ACTION_QUERY, "", Some(filter)).await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        decode_many(&body).map_err(|e| unexpected_body(&self.consumer.kind, e))
    }

    async fn send(
        &self,
        cx: &RequestContext,
        action: &str,
        id: &str,
        query: &[(&str, &str)],
        content_type: &str,
        body: Bytes,
    ) -> Result<(Bytes, Option<String>)> {
        let url = self.url(action, id);
        let mut attempt = 0;
        // Only connection failures are retried: those never reached the peer.
        let response = loop {
            attempt += 1;
            let mut request = self
                .transport
                .http
                .post(&url)
                .header(CONTENT_TYPE, content_type)
                .body(body.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(transaction_id) = &cx.transaction_id {
                request = request.header(HEADER_TRANSACTION_ID, transaction_id);
            }
            if let Some(authorization) = &cx.authorization {
                request = request.header(AUTHORIZATION, authorization);
            }
            match request.send().await {
                Ok(response) => break response,
                Err(e) if e.is_connect() && attempt < self.transport.max_tries => {
                    tracing::debug!(url = %url, attempt, "retrying after connection failure, {}", e);
                }
                Err(e) => {
                    record_client_request(&self.consumer.kind, action, "unreachable");
                    return Err(
                        Error::internal_server(format!("request to {} failed, {}", url, e)).alarm(),
                    );
                }
            }
        };

        let status = response.status();
        let response_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| {
            Error::internal_server(format!("could not read response from {}, {}", url, e)).alarm()
        })?;

        if status.as_u16() >= 400 {
            record_client_request(&self.consumer.kind, action, "error");
            return Err(classify(status, &body));
        }
        record_client_request(&self.consumer.kind, action, "ok");
        Ok((body, response_type))
    }
}

fn unexpected_body(kind: &str, e: Error) -> Error {
    Error::internal_server(format!("unexpected {} response, {}", kind, e.description)).alarm()
}

/// `Not Found` → `not_found`
pub fn normalize_status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unknown")
        .to_lowercase()
        .replace(' ', "_")
}

/// Error for a failed response: whatever structured error the body holds,
/// over a fallback made of the status and the raw body.
pub fn classify(status: StatusCode, body: &[u8]) -> Error {
    let mut error = Error::internal_server(String::from_utf8_lossy(body).into_owned());
    error.status = status.as_u16();
    error.code = normalize_status_text(status);

    if let Ok(decoded) = serde_json::from_slice::<Error>(body) {
        if decoded.status != 0 {
            error.status = decoded.status;
        }
        if !decoded.code.is_empty() {
            error.code = decoded.code;
        }
        if !decoded.description.is_empty() {
            error.description = decoded.description;
        }
        if decoded.uri.is_some() {
            error.uri = decoded.uri;
        }
    }
    error.debug()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn client(target: &str, base_path: &str, kind: &str) -> Client {
        let consumer = Consumer {
            kind: kind.to_string(),
            target: target.to_string(),
            base_path: base_path.to_string(),
            ..Consumer::default()
        };
        Client::new(consumer, Transport::new(&TransportConfig::default()).unwrap())
    }

    #[test]
    fn test_url_shapes() {
        let client = client("http://entity:8080", "/mesh/1.0", "entity");

        assert_eq!(client.url("", ""), "http://entity:8080/mesh/1.0/entity");
        assert_eq!(client.url("query", ""), "http://entity:8080/mesh/1.0/entity:query");
        assert_eq!(client.url("get", "abc"), "http://entity:8080/mesh/1.0/entity:get/abc");
        assert_eq!(client.url("fetch", "/a/b"), "http://entity:8080/mesh/1.0/entity:fetch/a/b");
    }

    #[rstest]
    #[case(StatusCode::NOT_FOUND, "not_found")]
    #[case(StatusCode::BAD_REQUEST, "bad_request")]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error")]
    #[case(StatusCode::BAD_GATEWAY, "bad_gateway")]
    fn test_normalize_status_text(#[case] status: StatusCode, #[case] expected: &str) {
        assert_eq!(normalize_status_text(status), expected);
    }

    #[test]
    fn test_classify_structured_error() {
        let body = br#"{"status":403,"error":"forbidden","error_description":"entity is disabled"}"#;
        let error = classify(StatusCode::FORBIDDEN, body);

        assert_eq!(error.status, 403);
        assert_eq!(error.code, "forbidden");
        assert_eq!(error.description, "entity is disabled");
    }

    #[test]
    fn test_classify_plain_body_falls_back() {
        let error = classify(StatusCode::BAD_GATEWAY, b"upstream exploded");

        assert_eq!(error.status, 502);
        assert_eq!(error.code, "bad_gateway");
        assert_eq!(error.description, "upstream exploded");
    }

    #[test]
    fn test_classify_partial_error_keeps_fallback_fields() {
        let error = classify(StatusCode::NOT_FOUND, br#"{"error_description":"no such label"}"#);

        assert_eq!(error.status, 404);
        assert_eq!(error.code, "not_found");
        assert_eq!(error.description, "no such label");
    }
}
