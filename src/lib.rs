//! # Metrics Authentication Gateway - Core Library Crate
//!
//! A stateless authentication gateway fronting a Prometheus-compatible metrics
//! API. Each listening port is bound at startup to one authentication scheme
//! (Basic, Bearer token, API token, or any-of); inbound credentials are
//! validated against an immutable, externally sourced credential set, and
//! accepted requests are proxied verbatim to the upstream.
//!
//! The decision path is a pure function of `(request headers, scheme,
//! credential set)`: no session, no cookie, no lockout counter, no shared
//! mutable state. Credential rotation swaps in a new immutable set atomically.

/// Core functionality: error types and configuration management
pub mod core;

/// Authentication: credential loading, scheme routing, validation, middleware
pub mod auth;

/// Gateway server and upstream proxying
pub mod gateway;

// Re-export commonly used types for easier access

/// Main error and result types used throughout the gateway
pub use crate::core::error::{GatewayError, GatewayResult};

/// Main configuration structure for the gateway
pub use crate::core::config::GatewayConfig;

/// Credential set and store, the external credential surface
pub use crate::auth::credentials::{CredentialSet, CredentialStore};

/// Per-port authentication schemes
pub use crate::auth::scheme::{AuthScheme, SchemeRouter};

/// The request decision type
pub use crate::auth::validator::Decision;

/// The server entry point
pub use crate::gateway::server::GatewayServer;
