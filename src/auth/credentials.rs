//! # Credential Loader
//!
//! Produces a validated, immutable [`CredentialSet`] from an external key-value
//! source: an env-style file (via `dotenvy`) or the process environment, read
//! once at startup.
//!
//! Two things can go wrong here and both are fatal before the gateway serves
//! traffic: a required key is absent (`MissingCredential`), or a supplied
//! secret still carries its documented placeholder value
//! (`PlaceholderCredential`). The loader logs key names and pass/fail outcome
//! only, never secret values, and the `Debug` impl redacts accordingly.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::core::error::{GatewayError, GatewayResult};

/// Secrets whose value starts with this prefix are treated as unconfigured
/// placeholders (e.g. `CHANGE_ME_ADMIN_PASSWORD`)
pub const PLACEHOLDER_PREFIX: &str = "CHANGE_ME";

/// Required credential keys
pub const KEY_ADMIN_USER: &str = "PROM_ADMIN_USER";
pub const KEY_ADMIN_PASSWORD: &str = "PROM_ADMIN_PASSWORD";
pub const KEY_BEARER_TOKEN: &str = "PROM_BEARER_TOKEN";
pub const KEY_API_TOKEN: &str = "PROM_API_TOKEN";

/// Optional secondary role key pairs: (role name, user key, password key)
const OPTIONAL_ROLE_KEYS: &[(&str, &str, &str)] = &[
    ("standard-user", "PROM_USER_USER", "PROM_USER_PASSWORD"),
    ("viewer", "PROM_VIEWER_USER", "PROM_VIEWER_PASSWORD"),
    ("test", "PROM_TEST_USER", "PROM_TEST_PASSWORD"),
];

/// One Basic-auth role: a named (username, password) pair
#[derive(Clone)]
pub struct RoleCredential {
    pub role: String,
    pub username: String,
    password: String,
}

/// The immutable, externally sourced collection of valid usernames, passwords
/// and tokens
///
/// Loaded once at startup and never mutated while serving traffic. Rotation
/// swaps in a freshly validated replacement through [`CredentialStore`].
#[derive(Clone)]
pub struct CredentialSet {
    roles: Vec<RoleCredential>,
    bearer_token: String,
    api_token: String,
}

impl std::fmt::Debug for CredentialSet {
    // Role names only; secrets are never formatted
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field(
                "roles",
                &self.roles.iter().map(|r| r.role.as_str()).collect::<Vec<_>>(),
            )
            .field("bearer_token", &"<redacted>")
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl CredentialSet {
    /// Build a credential set from a flat key-value mapping
    pub fn from_map(source: &HashMap<String, String>) -> GatewayResult<Self> {
        let admin_user = require(source, KEY_ADMIN_USER)?;
        let admin_password = require_secret(source, KEY_ADMIN_PASSWORD)?;
        let bearer_token = require_secret(source, KEY_BEARER_TOKEN)?;
        let api_token = require_secret(source, KEY_API_TOKEN)?;

        let mut roles = vec![RoleCredential {
            role: "admin".to_string(),
            username: admin_user,
            password: admin_password,
        }];

        for (role, user_key, password_key) in OPTIONAL_ROLE_KEYS {
            match (source.get(*user_key), source.get(*password_key)) {
                (Some(username), Some(_)) => {
                    let password = require_secret(source, password_key)?;
                    debug!(role, key = user_key, "Loaded secondary role credential");
                    roles.push(RoleCredential {
                        role: role.to_string(),
                        username: username.clone(),
                        password,
                    });
                }
                (None, None) => {}
                // A half-configured role pair is a deployment bug, not an
                // optional role. Report the absent half.
                (Some(_), None) => {
                    return Err(GatewayError::missing_credential(*password_key));
                }
                (None, Some(_)) => {
                    return Err(GatewayError::missing_credential(*user_key));
                }
            }
        }

        info!(
            roles = roles.len(),
            "✅ Credential set loaded and validated"
        );

        Ok(Self {
            roles,
            bearer_token,
            api_token,
        })
    }

    /// Build a credential set from the process environment
    ///
    /// Read once at startup only; request handlers never consult the ambient
    /// environment.
    pub fn from_process_env() -> GatewayResult<Self> {
        let source: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&source)
    }

    /// Build a credential set from an env-style file
    ///
    /// The file should be readable only by the gateway process (owner-only
    /// permissions recommended); its contents never appear in logs.
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let mut source = HashMap::new();
        for item in dotenvy::from_path_iter(path.as_ref()).map_err(|e| {
            GatewayError::config(format!(
                "Failed to read credentials file {}: {}",
                path.as_ref().display(),
                e
            ))
        })? {
            let (key, value) = item.map_err(|e| {
                GatewayError::config(format!("Malformed credentials file entry: {}", e))
            })?;
            source.insert(key, value);
        }
        Self::from_map(&source)
    }

    /// Check a Basic-auth (username, password) pair against every configured role
    pub fn matches_basic(&self, username: &str, password: &str) -> bool {
        // No short-circuit across roles: every pair is compared so the work
        // done does not depend on which role matched
        let mut matched = false;
        for role in &self.roles {
            let user_ok = ct_eq(username.as_bytes(), role.username.as_bytes());
            let pass_ok = ct_eq(password.as_bytes(), role.password.as_bytes());
            matched |= user_ok & pass_ok;
        }
        matched
    }

    /// Check a bearer token in constant time
    pub fn matches_bearer(&self, token: &str) -> bool {
        ct_eq(token.as_bytes(), self.bearer_token.as_bytes())
    }

    /// Check an API token in constant time
    pub fn matches_api_token(&self, token: &str) -> bool {
        ct_eq(token.as_bytes(), self.api_token.as_bytes())
    }

    /// Configured role names, for logging
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.role.as_str())
    }
}

/// Constant-time comparison of two byte slices
///
/// The length check leaks only the length, which a correct guess would share
/// anyway; `ct_eq` keeps the per-byte comparison time-independent.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).into()
}

/// Fetch a required non-secret key
fn require(source: &HashMap<String, String>, key: &str) -> GatewayResult<String> {
    source
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| GatewayError::missing_credential(key))
}

/// Fetch a required secret key, refusing documented placeholder values
fn require_secret(source: &HashMap<String, String>, key: &str) -> GatewayResult<String> {
    let value = require(source, key)?;
    if value.starts_with(PLACEHOLDER_PREFIX) {
        return Err(GatewayError::placeholder_credential(key));
    }
    Ok(value)
}

/// Shared handle to the current credential set
///
/// Readers take a cheap `Arc` clone; rotation installs a brand-new validated
/// set as an atomic replacement. Fields of a live set are never mutated in
/// place, so a reader can never observe a half-updated set.
#[derive(Debug)]
pub struct CredentialStore {
    current: RwLock<Arc<CredentialSet>>,
}

impl CredentialStore {
    pub fn new(initial: CredentialSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Snapshot of the current credential set
    pub fn load(&self) -> Arc<CredentialSet> {
        self.current.read().clone()
    }

    /// Install a replacement credential set (rotation)
    pub fn swap(&self, next: CredentialSet) {
        *self.current.write() = Arc::new(next);
        info!("🔄 Credential set rotated");
    }
}
