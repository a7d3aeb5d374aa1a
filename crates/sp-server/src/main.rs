//! # SAML SP Server
//!
//! Entry point for the service provider.

#![forbid(unsafe_code)]

use sp_core::SpConfig;
use sp_server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sp_=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("SAML service provider starting...");

    let config = SpConfig::from_env()?;
    Server::new(config)?.run().await
}
