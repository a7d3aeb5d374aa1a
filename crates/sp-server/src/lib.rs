//! # sp-server
//!
//! Axum server hosting the SAML service provider.
//!
//! The server owns the process-wide pieces the protocol crate leaves to its
//! host: the session store and replay cache, the background sweeper, and
//! the outer router with health checks and security headers.
//!
//! ## Usage
//!
//! ```ignore
//! use sp_core::SpConfig;
//! use sp_server::Server;
//!
//! let config = SpConfig::from_env()?;
//! Server::new(config)?.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod router;

pub use router::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sp_core::SpConfig;
use sp_protocol_saml::{DefaultXmlSecurity, ServiceProvider};
use sp_session::{ReplayCache, SessionStore, Sweeper};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// The service provider server.
pub struct Server {
    sp: Arc<ServiceProvider>,
    sessions: Arc<SessionStore>,
    replay: Arc<ReplayCache>,
}

impl Server {
    /// Builds the stores and the service provider.
    ///
    /// Fails when the configuration is invalid or the IdP certificate
    /// cannot be loaded.
    pub fn new(config: SpConfig) -> anyhow::Result<Self> {
        let sessions = Arc::new(SessionStore::new(config.session_ttl()));
        let replay = Arc::new(ReplayCache::new(config.replay_window()));
        let security = Arc::new(DefaultXmlSecurity::new(config.allow_sha1_signatures));

        let sp = ServiceProvider::new(config, security, Arc::clone(&sessions), Arc::clone(&replay))?;
        tracing::info!(entity_id = %sp.config().entity_id, "service provider configured");

        Ok(Self {
            sp: Arc::new(sp),
            sessions,
            replay,
        })
    }

    /// Runs the server until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.sp.config();
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = Sweeper::spawn(
            Arc::clone(&self.sessions),
            Arc::clone(&self.replay),
            config.sweep_interval(),
            shutdown_rx,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        let _ = shutdown_tx.send(true);
        sweeper.await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// The service provider.
    #[must_use]
    pub fn service_provider(&self) -> &Arc<ServiceProvider> {
        &self.sp
    }

    /// Creates the application router without binding a listener.
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.sp))
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
