//! # Gateway Integration Tests
//!
//! End-to-end tests driving the per-listener axum apps against a mock
//! upstream: the three reference listeners (combined, bearer-only,
//! api-token-only), pass-through semantics, rejection status codes and
//! credential rotation.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metrics_auth_gateway::core::config::{
    CredentialSourceConfig, GatewayConfig, ListenerConfig, ServerSettings,
};
use metrics_auth_gateway::{AuthScheme, CredentialSet, GatewayError, GatewayServer};

const ANY_OF_PORT: u16 = 9091;
const BEARER_PORT: u16 = 9092;
const API_TOKEN_PORT: u16 = 9093;

fn test_credentials() -> CredentialSet {
    let source: HashMap<String, String> = [
        ("PROM_ADMIN_USER", "admin"),
        ("PROM_ADMIN_PASSWORD", "S3cur3Pass!"),
        ("PROM_BEARER_TOKEN", "tok-123"),
        ("PROM_API_TOKEN", "api-456"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    CredentialSet::from_map(&source).unwrap()
}

fn test_config(upstream_url: &str) -> GatewayConfig {
    GatewayConfig {
        server: ServerSettings {
            bind_address: "127.0.0.1".to_string(),
            upstream_url: upstream_url.to_string(),
            upstream_timeout: "5s".to_string(),
        },
        listeners: vec![
            ListenerConfig {
                port: ANY_OF_PORT,
                scheme: AuthScheme::AnyOf,
            },
            ListenerConfig {
                port: BEARER_PORT,
                scheme: AuthScheme::Bearer,
            },
            ListenerConfig {
                port: API_TOKEN_PORT,
                scheme: AuthScheme::ApiToken,
            },
        ],
        credentials: CredentialSourceConfig::default(),
    }
}

async fn mock_upstream() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", "up"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"status":"success","data":{"result":[]}}"#, "application/json"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/-/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Healthy.\n"))
        .mount(&server)
        .await;

    server
}

fn gateway(upstream_url: &str) -> GatewayServer {
    GatewayServer::new(test_config(upstream_url), test_credentials()).unwrap()
}

fn query_request(headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri("/api/v1/query?query=up");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(
    server: &GatewayServer,
    port: u16,
    headers: &[(&str, &str)],
) -> axum::response::Response {
    let app = server.listener_app(port).unwrap();
    app.oneshot(query_request(headers)).await.unwrap()
}

// base64("admin:S3cur3Pass!")
const ADMIN_BASIC: &str = "Basic YWRtaW46UzNjdXIzUGFzcyE=";

#[tokio::test]
async fn combined_port_accepts_basic_bearer_and_api_token() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    for headers in [
        vec![("authorization", ADMIN_BASIC)],
        vec![("authorization", "Bearer tok-123")],
        vec![("x-api-token", "api-456")],
    ] {
        let response = send(&server, ANY_OF_PORT, &headers).await;
        assert_eq!(response.status(), StatusCode::OK, "{headers:?}");
    }
}

#[tokio::test]
async fn combined_port_without_credentials_rejects_401_with_challenge() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let response = send(&server, ANY_OF_PORT, &[]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .expect("Basic rejection must carry a challenge")
        .to_str()
        .unwrap();
    assert!(challenge.starts_with("Basic"));

    // Rejections carry no body
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn combined_port_token_only_failure_rejects_403() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let response = send(&server, ANY_OF_PORT, &[("authorization", "Bearer wrong")]).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
}

#[tokio::test]
async fn bearer_port_enforces_exact_token() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let ok = send(&server, BEARER_PORT, &[("authorization", "Bearer tok-123")]).await;
    assert_eq!(ok.status(), StatusCode::OK);

    let wrong = send(&server, BEARER_PORT, &[("authorization", "Bearer wrong")]).await;
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    // Basic credentials are not accepted on the bearer-only port
    let basic = send(&server, BEARER_PORT, &[("authorization", ADMIN_BASIC)]).await;
    assert_eq!(basic.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn api_token_port_enforces_exact_token() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let ok = send(&server, API_TOKEN_PORT, &[("x-api-token", "api-456")]).await;
    assert_eq!(ok.status(), StatusCode::OK);

    let wrong = send(&server, API_TOKEN_PORT, &[("x-api-token", "api-457")]).await;
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let absent = send(&server, API_TOKEN_PORT, &[]).await;
    assert_eq!(absent.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn forwarded_requests_pass_upstream_response_through_unchanged() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let response = send(&server, BEARER_PORT, &[("authorization", "Bearer tok-123")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.as_ref(), br#"{"status":"success","data":{"result":[]}}"#);
}

#[tokio::test]
async fn upstream_error_statuses_pass_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&upstream)
        .await;

    let server = gateway(&upstream.uri());
    let response = send(&server, BEARER_PORT, &[("authorization", "Bearer tok-123")]).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.as_ref(), b"upstream down");
}

#[tokio::test]
async fn health_endpoints_are_forwarded_like_any_path() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let app = server.listener_app(BEARER_PORT).unwrap();
    let request = Request::builder()
        .method("GET")
        .uri("/-/healthy")
        .header("authorization", "Bearer tok-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unconfigured_port_refuses_to_build_a_listener() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let err = server.listener_app(9999).unwrap_err();
    assert!(matches!(err, GatewayError::UnknownPort { port: 9999 }));
}

#[tokio::test]
async fn credential_rotation_takes_effect_on_the_next_request() {
    let upstream = mock_upstream().await;
    let server = gateway(&upstream.uri());

    let before = send(&server, BEARER_PORT, &[("authorization", "Bearer tok-123")]).await;
    assert_eq!(before.status(), StatusCode::OK);

    let rotated: HashMap<String, String> = [
        ("PROM_ADMIN_USER", "admin"),
        ("PROM_ADMIN_PASSWORD", "S3cur3Pass!"),
        ("PROM_BEARER_TOKEN", "tok-789"),
        ("PROM_API_TOKEN", "api-456"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    server
        .credential_store()
        .swap(CredentialSet::from_map(&rotated).unwrap());

    let old = send(&server, BEARER_PORT, &[("authorization", "Bearer tok-123")]).await;
    assert_eq!(old.status(), StatusCode::FORBIDDEN);

    let new = send(&server, BEARER_PORT, &[("authorization", "Bearer tok-789")]).await;
    assert_eq!(new.status(), StatusCode::OK);
}
