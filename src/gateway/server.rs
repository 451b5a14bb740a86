//! # Gateway Server
//!
//! Binds one TCP listener per configured port, each with its own axum app:
//! the authentication middleware for that port's fixed scheme in front of the
//! upstream proxy handler. All listeners are bound before any of them serves,
//! so a configuration problem (including a port with no scheme) fails startup
//! instead of serving half a deployment.
//!
//! The credential store is shared across listeners; each request takes an
//! `Arc` snapshot, so rotation never blocks or tears a read.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::Router as AxumRouter;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::auth::credentials::{CredentialSet, CredentialStore};
use crate::auth::middleware::{require_auth, AuthState};
use crate::auth::scheme::SchemeRouter;
use crate::core::config::GatewayConfig;
use crate::core::error::{GatewayError, GatewayResult};
use crate::gateway::proxy::UpstreamProxy;

/// The authentication gateway: listeners, schemes, credentials and proxy
pub struct GatewayServer {
    config: GatewayConfig,
    scheme_router: SchemeRouter,
    store: Arc<CredentialStore>,
    proxy: UpstreamProxy,
}

impl GatewayServer {
    /// Create a server from validated configuration and loaded credentials
    pub fn new(config: GatewayConfig, credentials: CredentialSet) -> GatewayResult<Self> {
        let scheme_router = SchemeRouter::from_listeners(&config.listeners);
        let proxy = UpstreamProxy::new(&config.server.upstream_url, config.upstream_timeout()?)?;

        Ok(Self {
            config,
            scheme_router,
            store: Arc::new(CredentialStore::new(credentials)),
            proxy,
        })
    }

    /// Shared credential store handle, for rotation by the embedding process
    pub fn credential_store(&self) -> Arc<CredentialStore> {
        self.store.clone()
    }

    /// Build the axum app for one listener port
    ///
    /// Fails with `UnknownPort` when the port has no configured scheme; the
    /// listener must not bind in that case.
    pub fn listener_app(&self, port: u16) -> GatewayResult<AxumRouter> {
        let scheme = self.scheme_router.scheme_for_port(port)?;

        let auth_state = AuthState {
            store: self.store.clone(),
            scheme,
            port,
        };

        let app = AxumRouter::new()
            .fallback(proxy_handler)
            .with_state(self.proxy.clone())
            .layer(from_fn_with_state(auth_state, require_auth))
            .layer(TraceLayer::new_for_http());

        Ok(app)
    }

    /// Bind every configured listener and serve them concurrently
    #[instrument(skip(self))]
    pub async fn start(self) -> GatewayResult<()> {
        // Bind everything first so one bad listener aborts the whole startup
        let mut bound = Vec::new();
        for listener in &self.config.listeners {
            let app = self.listener_app(listener.port)?;
            let addr: SocketAddr =
                format!("{}:{}", self.config.server.bind_address, listener.port)
                    .parse()
                    .map_err(|e| {
                        GatewayError::config(format!(
                            "Invalid bind address for port {}: {}",
                            listener.port, e
                        ))
                    })?;

            let tcp = TcpListener::bind(addr).await.map_err(|e| {
                GatewayError::internal(format!("Failed to bind listener on {}: {}", addr, e))
            })?;

            info!(
                port = listener.port,
                scheme = listener.scheme.as_str(),
                "🔐 Listener bound"
            );
            bound.push((listener.port, tcp, app));
        }

        info!(
            upstream = %self.config.server.upstream_url,
            listeners = bound.len(),
            "🌐 Gateway serving"
        );

        let mut tasks = tokio::task::JoinSet::new();
        for (port, tcp, app) in bound {
            tasks.spawn(async move {
                axum::serve(tcp, app)
                    .await
                    .map_err(|e| GatewayError::internal(format!("Listener {} error: {}", port, e)))
            });
        }

        while let Some(result) = tasks.join_next().await {
            result.map_err(|e| GatewayError::internal(format!("Listener task failed: {}", e)))??;
        }

        Ok(())
    }
}

/// Terminal handler: every authenticated request is forwarded verbatim
async fn proxy_handler(
    State(proxy): State<UpstreamProxy>,
    request: Request,
) -> Result<Response, GatewayError> {
    proxy.forward(request).await
}
