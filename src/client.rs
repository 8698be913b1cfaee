//! Authenticated HTTP session and request executor for API-devices.
//!
//! `ApiClient` wraps a `reqwest::Client`, the API base URL and an
//! authorization source. It is cheap to clone; every query builder holds
//! its own clone and all of them share one connection pool.
//!
//! Authorization comes from one of two places:
//! - a fixed bearer token supplied by the caller ([`ApiClient::new`]);
//! - a shared [`TokenCache`] ([`ApiClient::with_token_cache`]), asked for a
//!   token on every request so expired tokens are refreshed transparently.
//!
//! Execution contract ([`ApiClient::execute`]):
//! - URL = base URL + resource path; accumulated parameters go in the query
//!   string; an optional JSON body is attached.
//! - 2xx: the body is decoded into the caller's type.
//! - non-2xx: the response becomes a version-specific error
//!   (`ApiV1`/`ApiV2`). Nothing is retried.
//! - Transport failures propagate as `Network`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::auth::{BearerAuth, TokenCache};
use crate::error::{ApiV1Error, ApiV2Error, DevicesError, HttpFailure, Result};
use crate::query::QueryParams;

/// Connect timeout (TCP + TLS handshake).
const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout, response body included.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Which API generation a request targets. Selects the error translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// `/customers/...` endpoints.
    V1,
    /// `/v2/...` endpoints.
    V2,
}

impl ApiVersion {
    /// Converts a failed response into this version's error.
    pub fn translate(self, failure: &HttpFailure) -> DevicesError {
        match self {
            ApiVersion::V1 => DevicesError::ApiV1(ApiV1Error::wrap(failure)),
            ApiVersion::V2 => DevicesError::ApiV2(ApiV2Error::wrap(failure)),
        }
    }
}

#[derive(Clone)]
enum Authorization {
    Fixed(BearerAuth),
    Cached(Arc<TokenCache>),
}

impl Authorization {
    async fn bearer(&self) -> Result<BearerAuth> {
        match self {
            Authorization::Fixed(auth) => Ok(auth.clone()),
            Authorization::Cached(cache) => {
                let token = cache.token().await?;
                BearerAuth::new(Some(&token))
            }
        }
    }
}

pub(crate) fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn build_api_client() -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(API_CONNECT_TIMEOUT)
        .timeout(API_REQUEST_TIMEOUT)
        .build()?)
}

/// Authenticated session for the API-devices REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Authorization,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.auth {
            Authorization::Fixed(_) => "fixed",
            Authorization::Cached(_) => "token-cache",
        };
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("auth", &auth)
            .finish()
    }
}

impl ApiClient {
    /// Creates a session that sends `token` on every request.
    ///
    /// Fails with `InvalidToken` when `token` is `None` or empty; no
    /// request is made.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let auth = BearerAuth::new(token)?;
        Ok(ApiClient {
            client: build_api_client()?,
            base_url: base_url.to_string(),
            auth: Authorization::Fixed(auth),
        })
    }

    /// Creates a session that asks `cache` for a token on every request.
    pub fn with_token_cache(base_url: &str, cache: Arc<TokenCache>) -> Result<Self> {
        Ok(ApiClient {
            client: build_api_client()?,
            base_url: base_url.to_string(),
            auth: Authorization::Cached(cache),
        })
    }

    /// API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and decodes the JSON response as `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        version: ApiVersion,
        method: Method,
        resource: &str,
        params: &QueryParams,
        payload: Option<&Value>,
    ) -> Result<T> {
        let body = self
            .send_request(version, method, resource, params, payload)
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends a request whose response body carries nothing of interest
    /// (PUT/DELETE assignment, assignment requests).
    pub async fn execute_empty(
        &self,
        version: ApiVersion,
        method: Method,
        resource: &str,
        params: &QueryParams,
        payload: Option<&Value>,
    ) -> Result<()> {
        self.send_request(version, method, resource, params, payload)
            .await
            .map(|_| ())
    }

    /// One round trip. Returns the body of a 2xx response.
    ///
    /// Failed responses are read in full so the error translator sees what
    /// the API said. A 2xx body that breaks off mid-transfer is a
    /// `Network` error, even when the caller ignores the body.
    #[instrument(skip_all, fields(method = %method, resource = %resource))]
    async fn send_request(
        &self,
        version: ApiVersion,
        method: Method,
        resource: &str,
        params: &QueryParams,
        payload: Option<&Value>,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url, resource);
        let auth = self.auth.bearer().await?;

        let mut req = auth.apply(self.client.request(method, &url));
        if !params.is_empty() {
            req = req.query(&params.to_pairs());
        }
        if let Some(body) = payload {
            req = req.json(body);
        }

        let started = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();
        let final_url = resp.url().to_string();

        if !status.is_success() {
            // A failed response whose body cannot be read is translated
            // from its status alone.
            let body = resp.text().await.unwrap_or_default();
            let elapsed_ms = elapsed_millis(started);
            warn!(status = status.as_u16(), elapsed_ms, "request failed");
            let failure = HttpFailure {
                status,
                url: final_url,
                body,
            };
            return Err(version.translate(&failure));
        }

        let body = resp.text().await?;
        let elapsed_ms = elapsed_millis(started);
        info!(status = status.as_u16(), elapsed_ms, "request completed");
        debug!(bytes = body.len(), "response body received");
        Ok(body)
    }
}
