//! Integration tests for the client-credentials token cache using wiremock.
//!
//! A mock token endpoint counts how often it is called so the tests can
//! check when the cache refreshes and when it reuses its token.

use std::sync::Arc;

use api_devices::auth::{AuthConfig, TokenCache};
use api_devices::error::DevicesError;
use api_devices::v2::DevicesV2Api;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CUSTOMER_ID: &str = "9a919a42-b506-49ee-b053-402827b761b7";

fn config(server: &MockServer) -> AuthConfig {
    AuthConfig::new(
        &format!("{}/oauth/token", server.uri()),
        "client-id",
        "client-secret",
        "https://api-devices/",
    )
}

async fn mount_token(server: &MockServer, body: serde_json::Value, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn valid_token_is_reused() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        json!({"access_token": "tok-1", "expires_in": 3600, "token_type": "Bearer"}),
        1,
    )
    .await;

    let cache = TokenCache::new(config(&server));
    assert_eq!(cache.token().await.unwrap(), "tok-1");
    assert_eq!(cache.token().await.unwrap(), "tok-1");
    assert_eq!(cache.token().await.unwrap(), "tok-1");
}

#[tokio::test]
async fn expired_token_is_replaced() {
    let server = MockServer::start().await;
    // expires_in = 0 makes the first token stale as soon as it is stored.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "expires_in": 0})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-2", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = TokenCache::new(config(&server));
    assert_eq!(cache.token().await.unwrap(), "tok-1");
    assert_eq!(cache.token().await.unwrap(), "tok-2");
    // Within the new token's lifetime: served from the cache.
    assert_eq!(cache.token().await.unwrap(), "tok-2");
}

#[tokio::test]
async fn oversized_expiry_is_auth_error() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        json!({"access_token": "tok", "expires_in": u64::MAX}),
        1,
    )
    .await;

    let err = TokenCache::new(config(&server)).token().await.unwrap_err();
    match err {
        DevicesError::Auth { message, .. } => {
            assert!(message.contains("out of range"), "unexpected message: {message}");
        }
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_expiry_uses_default_lifetime() {
    let server = MockServer::start().await;
    mount_token(&server, json!({"access_token": "tok"}), 1).await;

    let cache = TokenCache::new(config(&server));
    cache.token().await.unwrap();
    cache.token().await.unwrap();
}

#[tokio::test]
async fn invalidate_forces_refresh() {
    let server = MockServer::start().await;
    mount_token(&server, json!({"access_token": "tok", "expires_in": 3600}), 2).await;

    let cache = TokenCache::new(config(&server));
    cache.token().await.unwrap();
    cache.invalidate().await;
    cache.token().await.unwrap();
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    mount_token(&server, json!({"access_token": "shared", "expires_in": 3600}), 1).await;

    let cache = Arc::new(TokenCache::new(config(&server)));
    let (a, b, c) = tokio::join!(cache.token(), cache.token(), cache.token());
    assert_eq!(a.unwrap(), "shared");
    assert_eq!(b.unwrap(), "shared");
    assert_eq!(c.unwrap(), "shared");
}

#[tokio::test]
async fn rejected_credentials_are_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "access_denied"})),
        )
        .mount(&server)
        .await;

    let err = TokenCache::new(config(&server)).token().await.unwrap_err();
    match err {
        DevicesError::Auth { message, .. } => {
            assert!(message.contains("401"), "unexpected message: {message}");
            assert!(message.contains("access_denied"));
        }
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_access_token_is_auth_error() {
    let server = MockServer::start().await;
    mount_token(&server, json!({"expires_in": 3600}), 1).await;

    let err = TokenCache::new(config(&server)).token().await.unwrap_err();
    assert!(matches!(err, DevicesError::Auth { .. }), "got {err:?}");
}

#[tokio::test]
async fn api_requests_carry_cached_token() {
    let auth_server = MockServer::start().await;
    let api_server = MockServer::start().await;
    mount_token(
        &auth_server,
        json!({"access_token": "cached-token", "expires_in": 3600}),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/download-link/{CUSTOMER_ID}")))
        .and(header("Authorization", "Bearer cached-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"jamf": null, "kaseya": "https://download.example.com/agent.msi"}
        })))
        .expect(2)
        .mount(&api_server)
        .await;

    let cache = Arc::new(TokenCache::new(config(&auth_server)));
    let api = DevicesV2Api::with_token_cache(&api_server.uri(), cache).unwrap();

    for _ in 0..2 {
        let links = api.download_link(CUSTOMER_ID).unwrap().get().await.unwrap();
        assert!(links.data.jamf.is_none());
    }
}
