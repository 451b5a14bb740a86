//! # Authentication Middleware
//!
//! Wires the pure validator into axum's request pipeline. Each listener gets
//! one instance of this middleware carrying its fixed scheme and a shared
//! handle to the credential store; on a forward decision the request continues
//! to the proxy handler untouched, on a reject decision the response carries
//! the mapped status, an empty body, and a `WWW-Authenticate` challenge for
//! the Basic case.
//!
//! Only the outcome, scheme and port are logged. Credential values never
//! reach a log line.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::auth::credentials::CredentialStore;
use crate::auth::scheme::AuthScheme;
use crate::auth::validator::{decide, Decision};

/// Per-listener state handed to the middleware
#[derive(Clone)]
pub struct AuthState {
    /// Shared credential store; each request takes a snapshot
    pub store: Arc<CredentialStore>,
    /// The scheme fixed for this listener at bind time
    pub scheme: AuthScheme,
    /// Listener port, for log correlation only
    pub port: u16,
}

/// Axum middleware function enforcing the listener's scheme
pub async fn require_auth(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let credentials = state.store.load();
    let decision = decide(&credentials, state.scheme, request.headers());

    match decision {
        Decision::Forward => {
            debug!(
                scheme = state.scheme.as_str(),
                port = state.port,
                path = request.uri().path(),
                outcome = "forward",
                "Request authenticated"
            );
            next.run(request).await
        }
        Decision::Reject { status, challenge } => {
            warn!(
                scheme = state.scheme.as_str(),
                port = state.port,
                path = request.uri().path(),
                outcome = "reject",
                status = status.as_u16(),
                "Request rejected"
            );
            let mut response = status.into_response();
            if let Some(challenge) = challenge {
                if let Ok(value) = challenge.parse() {
                    response.headers_mut().insert(WWW_AUTHENTICATE, value);
                }
            }
            response
        }
    }
}
