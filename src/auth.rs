//! Bearer authentication and OAuth2 client-credentials token caching.
//!
//! Two pieces live here:
//!
//! - [`BearerAuth`] decorates outgoing requests with
//!   `Authorization: Bearer <token>`. It refuses to exist without a token,
//!   so a missing token is reported before any request is built.
//! - [`TokenCache`] acquires tokens from the token endpoint using the
//!   client_credentials grant and hands out the cached one until it
//!   expires. The cache is an explicit object: callers that want to share
//!   it wrap it in an `Arc` and pass it to each client.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::client::elapsed_millis;
use crate::error::{DevicesError, Result};

/// Grant type used when none is configured.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";

/// Token lifetime assumed when the endpoint omits `expires_in` (24h).
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 86_400;

/// Timeout for token requests. They are small and should be fast.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Authenticator ────────────────────────────────────────────────────

/// Attaches a bearer token to requests.
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    /// Fails with `InvalidToken` when `token` is `None` or empty.
    pub fn new(token: Option<&str>) -> Result<Self> {
        match token {
            Some(t) if !t.is_empty() => Ok(BearerAuth {
                token: t.to_string(),
            }),
            _ => Err(DevicesError::InvalidToken(
                "No token set to query API-devices".to_string(),
            )),
        }
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Sets the `Authorization` header on `req`.
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.token)
    }
}

// Keep the token out of debug output.
impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").field("token", &"<redacted>").finish()
    }
}

// ── Token cache ──────────────────────────────────────────────────────

/// Settings for the token endpoint.
#[derive(Clone)]
pub struct AuthConfig {
    /// Full URL of the token endpoint.
    pub url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Audience the token is requested for.
    pub audience: String,
    /// Grant type, normally [`DEFAULT_GRANT_TYPE`].
    pub grant_type: String,
}

impl AuthConfig {
    /// Builds a config using the client_credentials grant.
    pub fn new(url: &str, client_id: &str, client_secret: &str, audience: &str) -> Self {
        AuthConfig {
            url: url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            audience: audience.to_string(),
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

/// Form body sent to the token endpoint.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

/// Fields of the token response we use. Anything else is ignored.
#[derive(Deserialize)]
pub struct TokenResponse {
    /// Absent only on malformed responses, which are rejected.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A token together with the instant it stops being valid.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Caches a bearer token and refreshes it from the token endpoint.
///
/// Invariants:
/// - At most one token is cached; a refresh replaces it wholesale.
/// - A cached token is handed out only while `now < expires_at`.
/// - `expires_at` is measured from when the token request *started*, so
///   the time spent waiting for the endpoint counts against the lifetime.
/// - Refreshes are serialized by the mutex: callers that find the token
///   expired at the same time wait for a single refresh and share it.
pub struct TokenCache {
    client: reqwest::Client,
    config: AuthConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Creates an empty cache. No request is made until [`token`](Self::token).
    pub fn new(config: AuthConfig) -> Self {
        TokenCache {
            client: build_token_client(),
            config,
            cached: Mutex::new(None),
        }
    }

    /// Creates a cache pre-seeded with `token`, valid for `ttl`.
    ///
    /// Fails with `InvalidParams` when `ttl` is too large to represent.
    pub fn with_token(config: AuthConfig, token: &str, ttl: Duration) -> Result<Self> {
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            DevicesError::InvalidParams(format!("token lifetime out of range: {ttl:?}"))
        })?;
        Ok(TokenCache {
            client: build_token_client(),
            config,
            cached: Mutex::new(Some(CachedToken {
                access_token: token.to_string(),
                expires_at,
            })),
        })
    }

    /// Returns a valid token, requesting a new one if none is cached or
    /// the cached one has expired.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref() {
            if current.is_valid(Instant::now()) {
                return Ok(current.access_token.clone());
            }
            debug!("cached token expired");
        }

        let fresh = self.request_token().await?;
        let token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drops the cached token so the next call to `token()` refreshes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Performs one client_credentials grant.
    ///
    /// The body is read as text before the status check so a rejected
    /// request keeps the endpoint's explanation in the error.
    #[instrument(skip(self), fields(url = %self.config.url))]
    async fn request_token(&self) -> Result<CachedToken> {
        let started = Instant::now();
        let form = TokenRequest {
            grant_type: &self.config.grant_type,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            audience: &self.config.audience,
        };

        let response = self
            .client
            .post(&self.config.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| auth_error("token endpoint unreachable", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| auth_error("failed to read token response", e))?;

        if !status.is_success() {
            return Err(DevicesError::Auth {
                message: format!("token request failed ({status}): {body}"),
                source: None,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| auth_error("failed to parse token response", e))?;
        let access_token = parsed.access_token.ok_or_else(|| DevicesError::Auth {
            message: "token response has no access_token".to_string(),
            source: None,
        })?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = started
            .checked_add(Duration::from_secs(expires_in))
            .ok_or_else(|| DevicesError::Auth {
                message: format!("token lifetime out of range: expires_in={expires_in}"),
                source: None,
            })?;

        info!(
            expires_in,
            elapsed_ms = elapsed_millis(started),
            "acquired access token"
        );

        Ok(CachedToken {
            access_token,
            expires_at,
        })
    }
}

fn build_token_client() -> reqwest::Client {
    // Only TLS backend initialisation can fail here; fall back to defaults.
    reqwest::Client::builder()
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

fn auth_error<E>(message: &str, err: E) -> DevicesError
where
    E: std::error::Error + Send + Sync + 'static,
{
    DevicesError::Auth {
        message: message.to_string(),
        source: Some(Box::new(err)),
    }
}
