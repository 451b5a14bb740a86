//! # Scheme Router
//!
//! Maps an inbound listening port to its configured authentication scheme. The
//! mapping is fixed by deployment configuration before any listener binds: a
//! port with no entry is a configuration bug and the gateway refuses to bind it
//! rather than silently allowing or denying traffic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::config::ListenerConfig;
use crate::core::error::{GatewayError, GatewayResult};

/// Authentication scheme bound to a listening port
///
/// `AnyOf` is the combined port: Basic, Bearer and API token are all
/// accepted, evaluated in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// No authentication; every request is forwarded
    None,
    /// HTTP Basic authentication against the configured role pairs
    Basic,
    /// `Authorization: Bearer <token>` against the configured bearer token
    Bearer,
    /// `X-API-Token` header against the configured API token
    ApiToken,
    /// Basic, then Bearer, then API token; first success wins
    AnyOf,
}

impl AuthScheme {
    /// Scheme name for log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Bearer => "bearer",
            Self::ApiToken => "api_token",
            Self::AnyOf => "any_of",
        }
    }
}

/// Port-to-scheme table built from the listener configuration
#[derive(Debug, Clone)]
pub struct SchemeRouter {
    table: HashMap<u16, AuthScheme>,
}

impl SchemeRouter {
    /// Build the router from configured listeners
    pub fn from_listeners(listeners: &[ListenerConfig]) -> Self {
        let table = listeners
            .iter()
            .map(|listener| (listener.port, listener.scheme))
            .collect();
        Self { table }
    }

    /// Look up the scheme for a port
    ///
    /// `UnknownPort` here means the deployment configuration and the set of
    /// bound listeners have diverged; the caller must treat it as fatal for
    /// that listener, not as a request-time rejection.
    pub fn scheme_for_port(&self, port: u16) -> GatewayResult<AuthScheme> {
        self.table
            .get(&port)
            .copied()
            .ok_or_else(|| GatewayError::unknown_port(port))
    }

    /// All configured ports, in no particular order
    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.table.keys().copied()
    }
}
