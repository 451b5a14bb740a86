//! # Upstream Proxy
//!
//! Forwards authenticated requests verbatim to the upstream metrics API and
//! passes the upstream response through unchanged: method, path, query string,
//! headers and body all survive the hop, minus the hop-by-hop headers that
//! only make sense on a single connection.
//!
//! Upstream unavailability is not this gateway's concern beyond reporting it:
//! a failed upstream call surfaces to the client as a 502 with no retry
//! guidance.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tracing::debug;

use crate::core::error::{GatewayError, GatewayResult};

/// Largest request body the proxy will buffer before forwarding
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Hop-by-hop headers per RFC 7230 §6.1; never forwarded in either direction.
/// `host` and `content-length` are recomputed by the client/server layers.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Reverse proxy for the upstream metrics API
#[derive(Debug, Clone)]
pub struct UpstreamProxy {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl UpstreamProxy {
    /// Create a proxy for the given upstream base URL
    pub fn new(upstream_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let base_url = reqwest::Url::parse(upstream_url)
            .map_err(|e| GatewayError::config(format!("Invalid upstream URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::from)?;

        Ok(Self { client, base_url })
    }

    /// Forward one request and return the upstream response unchanged
    pub async fn forward(&self, request: Request) -> GatewayResult<Response> {
        let (parts, body) = request.into_parts();

        let mut target = self.base_url.clone();
        target.set_path(parts.uri.path());
        target.set_query(parts.uri.query());

        let body_bytes: bytes::Bytes = to_bytes(body, MAX_BODY_SIZE)
            .await
            .map_err(|e| GatewayError::internal(format!("Failed to read request body: {}", e)))?;

        // axum is on http 1.x while reqwest 0.11 is on http 0.2, so method and
        // headers cross the boundary by name/bytes
        let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
            .map_err(|e| GatewayError::internal(format!("Invalid method: {}", e)))?;

        let mut upstream_request = self
            .client
            .request(method, target.clone())
            .body(body_bytes);

        for (name, value) in filter_headers(&parts.headers) {
            upstream_request = upstream_request.header(name.as_str(), value.as_bytes());
        }

        debug!(url = %target, "Forwarding request upstream");

        let upstream_response = upstream_request.send().await.map_err(GatewayError::from)?;

        let status = StatusCode::from_u16(upstream_response.status().as_u16())
            .map_err(|e| GatewayError::internal(format!("Invalid upstream status: {}", e)))?;

        let mut response_headers = HeaderMap::new();
        for (name, value) in upstream_response.headers() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                response_headers.insert(name, value);
            }
        }

        let response_body = upstream_response.bytes().await.map_err(GatewayError::from)?;

        let mut response = Response::builder()
            .status(status)
            .body(Body::from(response_body))
            .map_err(|e| GatewayError::internal(format!("Failed to build response: {}", e)))?;
        *response.headers_mut() = response_headers;

        Ok(response)
    }
}

/// Headers eligible for forwarding, hop-by-hop ones removed
fn filter_headers(headers: &HeaderMap) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| name.eq_ignore_ascii_case(hop))
}
