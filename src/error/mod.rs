//! Unified error handling for Mesh Core
//!
//! Errors are resources of kind `error`. They travel over the wire as
//! `{"status", "error", "error_description", "error_uri"}` so that sibling
//! services can hand them back to clients unchanged.

use crate::resource::{Identity, Kind, Level, Resource};
use crate::telemetry;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// The fixed taxonomy of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    InternalServer,
    NotImplemented,
    BadGateway,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Ok,
        ErrorKind::BadRequest,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::InternalServer,
        ErrorKind::NotImplemented,
        ErrorKind::BadGateway,
    ];

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Ok => StatusCode::OK,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Ok => "ok",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InternalServer => "internal_server",
            ErrorKind::NotImplemented => "not_implemented",
            ErrorKind::BadGateway => "bad_gateway",
        }
    }

    fn default_description(self) -> &'static str {
        match self {
            ErrorKind::Ok => "ok",
            ErrorKind::BadRequest => "request was malformed or incomplete",
            ErrorKind::Forbidden => "access to the resource is forbidden",
            ErrorKind::NotFound => "resource not found",
            ErrorKind::InternalServer => "internal server error",
            ErrorKind::NotImplemented => "not implemented",
            ErrorKind::BadGateway => "upstream service failed",
        }
    }
}

/// Error resource.
///
/// Construct one through the per-kind constructors, then chain one of
/// [`Error::debug`], [`Error::info`] or [`Error::alarm`] to report it at the
/// point where it happens.
#[derive(Error, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[error("{code}: {description}")]
pub struct Error {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub status: u16,
    #[serde(rename = "error", default)]
    pub code: String,
    #[serde(rename = "error_description", default)]
    pub description: String,
    #[serde(rename = "error_uri", default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Error {
    /// Fresh error of the given kind with its default description.
    pub fn of(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_description())
    }

    /// Fresh error of the given kind. Every call yields a new identity.
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        let mut identity = Identity::default();
        identity.init(Kind::ERROR);
        Self {
            identity,
            status: kind.status().as_u16(),
            code: kind.code().to_string(),
            description: description.into(),
            uri: None,
        }
    }

    pub fn ok() -> Self {
        Self::of(ErrorKind::Ok)
    }

    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, description)
    }

    pub fn forbidden(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, description)
    }

    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, description)
    }

    pub fn internal_server(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServer, description)
    }

    pub fn not_implemented(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, description)
    }

    pub fn bad_gateway(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadGateway, description)
    }

    /// Copy of this error under a new identity with a different description.
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        let mut identity = Identity::default();
        identity.init(Kind::ERROR);
        Self {
            identity,
            status: self.status,
            code: self.code.clone(),
            description: description.into(),
            uri: self.uri.clone(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Taxonomy entry matching this error's code, if it is a known one.
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.code() == self.code)
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.code == kind.code()
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn debug(self) -> Self {
        self.report(Level::Debug)
    }

    pub fn info(self) -> Self {
        self.report(Level::Info)
    }

    /// Reports the error as an operational alarm.
    pub fn alarm(self) -> Self {
        self.report(Level::Alarm)
    }

    fn report(self, level: Level) -> Self {
        telemetry::emit(level, &self.to_string());
        self
    }
}

impl Resource for Error {
    const KIND: Kind = Kind::ERROR;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::internal_server(format!("json processing failed, {}", e)).alarm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_taxonomy_statuses() {
        assert_eq!(Error::ok().status, 200);
        assert_eq!(Error::bad_request("x").status, 400);
        assert_eq!(Error::forbidden("x").status, 403);
        assert_eq!(Error::not_found("x").status, 404);
        assert_eq!(Error::internal_server("x").status, 500);
        assert_eq!(Error::not_implemented("x").status, 501);
        assert_eq!(Error::bad_gateway("x").status, 502);
    }

    #[test]
    fn test_with_description_keeps_code_and_renews_identity() {
        let base = Error::forbidden("no");
        let copy = base.with_description("entity is disabled");

        assert_eq!(copy.code, "forbidden");
        assert_eq!(copy.status, 403);
        assert_eq!(copy.description, "entity is disabled");
        assert_ne!(copy.identity.id, base.identity.id);
        assert_eq!(base.description, "no");
    }

    #[test]
    fn test_wire_field_names() {
        let err = Error::not_found("missing").with_uri("https://docs/errors");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["error_description"], "missing");
        assert_eq!(json["error_uri"], "https://docs/errors");
        assert_eq!(json["kind"], "error");
    }

    #[test]
    fn test_decode_from_sibling_body() {
        let body = r#"{"status":403,"error":"forbidden","error_description":"nope"}"#;
        let err: Error = serde_json::from_str(body).unwrap();

        assert!(err.is(ErrorKind::Forbidden));
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unknown_status_maps_to_internal() {
        let err = Error {
            status: 0,
            ..Error::default()
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_json_failure_is_reported_as_alarm() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let err = tracing::subscriber::with_default(subscriber, || {
            let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Error::from(source)
        });

        assert!(err.is(ErrorKind::InternalServer));
        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("ERROR"));
        assert!(logged.contains("json processing failed"));
    }

    #[test]
    fn test_display() {
        let err = Error::bad_request("content type not supported");
        assert_eq!(err.to_string(), "bad_request: content type not supported");
    }
}
