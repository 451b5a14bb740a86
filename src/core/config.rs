//! # Configuration Module
//!
//! This module handles configuration management for the gateway.
//!
//! ## Key Features
//! - YAML configuration parsing with serde
//! - Environment variable override support (`GATEWAY_*`, applied once at load)
//! - Comprehensive validation with detailed error messages
//!
//! The loaded configuration is an explicit, immutable object constructed once at
//! process start and passed by reference to every request-handling path. The
//! process environment is consulted only here, never mid-request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::scheme::AuthScheme;
use crate::core::error::{GatewayError, GatewayResult};

/// Main gateway configuration structure
///
/// This structure represents the complete configuration for the gateway.
/// It uses serde for deserialization from YAML files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration (bind address, upstream, timeouts)
    pub server: ServerSettings,

    /// Listener definitions: one authentication scheme per port
    pub listeners: Vec<ListenerConfig>,

    /// Credential source configuration
    #[serde(default)]
    pub credentials: CredentialSourceConfig,
}

/// Server-level settings shared by all listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the listeners bind to (each listener adds its own port)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Base URL of the upstream metrics API (e.g. `http://127.0.0.1:9090`)
    pub upstream_url: String,

    /// Upstream request timeout, human-readable (e.g. "30s", "1m")
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout: String,
}

/// One listening port with its fixed authentication scheme
///
/// The scheme is associated with the port at configuration time and is fixed
/// for the port's lifetime; there is no per-request scheme negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Port to bind on `server.bind_address`
    pub port: u16,

    /// Authentication scheme enforced on this port
    pub scheme: AuthScheme,
}

/// Where the credential set is sourced from
///
/// When `env_file` is set, credentials are read from that env-style file
/// (recommended owner-only permissions). Otherwise they are read from the
/// process environment, once, at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSourceConfig {
    /// Optional path to an env-style credentials file
    #[serde(default)]
    pub env_file: Option<PathBuf>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_upstream_timeout() -> String {
    "30s".to_string()
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await.map_err(|e| {
            GatewayError::config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut config: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse config: {}", e)))?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern: GATEWAY_<FIELD>
    /// For example: GATEWAY_UPSTREAM_URL=http://prometheus:9090
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        use std::env;

        if let Ok(addr) = env::var("GATEWAY_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Ok(url) = env::var("GATEWAY_UPSTREAM_URL") {
            self.server.upstream_url = url;
        }

        if let Ok(timeout) = env::var("GATEWAY_UPSTREAM_TIMEOUT") {
            // Parse eagerly so a bad override fails at startup, not first request
            humantime::parse_duration(&timeout).map_err(|e| {
                GatewayError::config(format!("Invalid GATEWAY_UPSTREAM_TIMEOUT: {}", e))
            })?;
            self.server.upstream_timeout = timeout;
        }

        if let Ok(path) = env::var("GATEWAY_CREDENTIALS_FILE") {
            self.credentials.env_file = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Validate the configuration, producing a descriptive error on the first problem
    pub fn validate(&self) -> GatewayResult<()> {
        if self.listeners.is_empty() {
            return Err(GatewayError::config(
                "At least one listener must be configured",
            ));
        }

        let mut seen_ports = std::collections::HashSet::new();
        for listener in &self.listeners {
            if !seen_ports.insert(listener.port) {
                return Err(GatewayError::config(format!(
                    "Duplicate listener port: {}",
                    listener.port
                )));
            }
        }

        reqwest::Url::parse(&self.server.upstream_url)
            .map_err(|e| GatewayError::config(format!("Invalid upstream URL: {}", e)))?;

        self.upstream_timeout()?;

        Ok(())
    }

    /// Parsed upstream timeout
    pub fn upstream_timeout(&self) -> GatewayResult<Duration> {
        humantime::parse_duration(&self.server.upstream_timeout).map_err(|e| {
            GatewayError::config(format!(
                "Invalid upstream_timeout '{}': {}",
                self.server.upstream_timeout, e
            ))
        })
    }
}
