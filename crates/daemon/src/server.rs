//! Server lifecycle: wiring the services together and running the listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::files::ShareRegistry;
use crate::http::{self, AppState};

/// Server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not listening.
    Stopped,
    /// Listener bound, about to accept.
    Starting,
    /// Accepting connections.
    Running,
    /// Draining in-flight requests.
    ShuttingDown,
}

/// The LanShare server: one registry and the HTTP surface in front of it.
pub struct ShareServer {
    config: Config,
    registry: Arc<ShareRegistry>,
    app_state: Arc<AppState>,
    state: Arc<RwLock<ServerState>>,
    shutdown_token: CancellationToken,
}

impl ShareServer {
    /// Create a server and share every path listed in the configuration.
    ///
    /// Paths that cannot be shared are logged and skipped.
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(ShareRegistry::new());
        for path in &config.share.paths {
            match registry.add(path) {
                Ok(outcome) => info!(id = %outcome.id, "Shared {:?} from configuration", path),
                Err(e) => warn!("Skipping configured share {:?}: {}", path, e),
            }
        }

        let app_state = Arc::new(AppState::new(&config, Arc::clone(&registry)));

        Self {
            config,
            registry,
            app_state,
            state: Arc::new(RwLock::new(ServerState::Stopped)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Returns the current state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Returns the share registry.
    pub fn registry(&self) -> &Arc<ShareRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the HTTP router for this server.
    pub fn router(&self) -> Router {
        http::router(
            Arc::clone(&self.app_state),
            self.config.server.public_dir.clone(),
        )
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr()?;
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))
    }

    /// Serve requests on `listener` until [`ShareServer::shutdown`] is called.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Stopped {
                anyhow::bail!("Server is already running");
            }
            *state = ServerState::Starting;
        }

        let local_addr = listener.local_addr()?;
        let router = self.router();
        let token = self.shutdown_token.clone();

        *self.state.write().await = ServerState::Running;
        info!("Listening on http://{}", local_addr);

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .context("HTTP server error");

        *self.state.write().await = ServerState::Stopped;
        info!("Server stopped");
        result
    }

    /// Stop accepting connections and let in-flight requests finish.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write().await;
            if *state == ServerState::Stopped || *state == ServerState::ShuttingDown {
                return;
            }
            *state = ServerState::ShuttingDown;
        }
        info!("Shutting down...");
        self.shutdown_token.cancel();
    }

    /// Returns the shutdown token for external tasks to observe shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }
}
