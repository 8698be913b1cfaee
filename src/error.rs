//! Typed error hierarchy for the api-devices crate.
//!
//! `DevicesError` separates failures detected locally (bad token, bad
//! arguments) from failures reported by the service, and both from
//! transport-level failures that never produced an HTTP status:
//!
//! - `InvalidToken` / `InvalidParams` are raised before any request is sent.
//! - `ApiV1` / `ApiV2` carry the status code and whatever structured detail
//!   the service returned, translated by the version's error wrapper.
//! - `Auth` covers the OAuth2 token endpoint.
//! - `Parse` covers 2xx bodies that fail schema validation.
//! - `Network` wraps `reqwest::Error` unchanged.

use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::v2::schemas::ErrorResponse;

/// Unified error type for all api-devices operations.
#[derive(Debug, thiserror::Error)]
pub enum DevicesError {
    /// No bearer token (or an empty one) was supplied.
    #[error("{0}")]
    InvalidToken(String),

    /// A required argument was missing or outside its allowed values.
    #[error("{0}")]
    InvalidParams(String),

    /// The token endpoint could not be reached, rejected the client
    /// credentials, or answered with something that is not a token.
    #[error("authentication failed: {message}")]
    Auth {
        /// Status and body of the failed token request, when available.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-2xx response from a v1 endpoint.
    #[error(transparent)]
    ApiV1(#[from] ApiV1Error),

    /// Non-2xx response from a v2 endpoint.
    #[error(transparent)]
    ApiV2(#[from] ApiV2Error),

    /// A successful response body did not match the expected schema.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// DNS, TCP, TLS or timeout failure; no HTTP status is available.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DevicesError>;

/// A response that came back with a non-success status.
///
/// The executor builds one of these from every failed response and hands
/// it to the version-specific translator. Its `Display` mirrors the
/// familiar "`400 Client Error: Bad Request for url: ...`" wording.
#[derive(Debug, Clone)]
pub struct HttpFailure {
    /// Status returned by the API.
    pub status: StatusCode,
    /// Full URL of the failed request, query string included.
    pub url: String,
    /// Raw response body; empty when it could not be read.
    pub body: String,
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.status.is_server_error() {
            "Server Error"
        } else {
            "Client Error"
        };
        let reason = self.status.canonical_reason().unwrap_or("Unknown");
        write!(
            f,
            "{} {kind}: {reason} for url: {}",
            self.status.as_u16(),
            self.url
        )
    }
}

/// Error returned by the v1 API.
///
/// v1 has no formal error envelope, so `detail` is whatever JSON the
/// server sent back (an empty object when the body is not JSON).
#[derive(Debug, Clone, thiserror::Error)]
#[error("(api_devices_error) {error}")]
pub struct ApiV1Error {
    /// Description of the HTTP failure.
    pub error: String,
    /// Parsed response body, or `{}`.
    pub detail: Value,
    /// HTTP status code.
    pub status_code: u16,
}

impl ApiV1Error {
    /// Translates a failed v1 response.
    pub fn wrap(failure: &HttpFailure) -> Self {
        let detail = serde_json::from_str::<Value>(&failure.body)
            .unwrap_or_else(|_| Value::Object(Map::new()));
        ApiV1Error {
            error: failure.to_string(),
            detail,
            status_code: failure.status.as_u16(),
        }
    }
}

/// Error returned by the v2 API.
///
/// Built from the `{code, detail, source}` envelope. When the body does
/// not match that envelope the error still surfaces, with code
/// `"unknown"` and the HTTP failure description as its detail.
///
/// `Display` and `Error` are written by hand: the `source` field is API
/// data, not a cause chain, so it must not be picked up as `Error::source`.
#[derive(Debug, Clone)]
pub struct ApiV2Error {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable explanation.
    pub detail: String,
    /// Raw error source reported by the API, if any.
    pub source: Option<Map<String, Value>>,
    /// HTTP status code.
    pub status_code: u16,
}

impl std::fmt::Display for ApiV2Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.code, self.detail)
    }
}

impl std::error::Error for ApiV2Error {}

/// Code used when the error body is not a valid envelope.
pub const UNKNOWN_ERROR_CODE: &str = "unknown";

impl ApiV2Error {
    /// Translates a failed v2 response.
    pub fn wrap(failure: &HttpFailure) -> Self {
        let status_code = failure.status.as_u16();
        match serde_json::from_str::<ErrorResponse>(&failure.body) {
            Ok(envelope) => ApiV2Error {
                code: envelope.code,
                detail: envelope.detail,
                source: envelope.source,
                status_code,
            },
            Err(err) => {
                tracing::debug!(error = %err, "error body is not a v2 error envelope");
                ApiV2Error {
                    code: UNKNOWN_ERROR_CODE.to_string(),
                    detail: failure.to_string(),
                    source: None,
                    status_code,
                }
            }
        }
    }
}
