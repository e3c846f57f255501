//! # SyncScript Server
//!
//! The HTTP surface of SyncScript. Every vault route authorizes its caller
//! through `core_access`, and every successful mutation is announced on the
//! vault's server-sent event stream.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

use crate::{
    config::{get_config, AppConfig},
    router::create_router,
    state::build_app_state,
};
use std::net::SocketAddr;
use syncscript::BroadcastHub;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Builds the application state and serves the router on `listener` until
/// the process receives Ctrl+C.
pub async fn run(listener: TcpListener, config: AppConfig) -> anyhow::Result<()> {
    debug!(
        port = config.port,
        db_url = %config.db_url,
        citation_model = config.citation.is_some(),
        "Server configuration loaded"
    );

    let app_state = build_app_state(config).await?;
    let events = app_state.events.clone();
    let app = create_router(app_state);

    info!(address = %listener.local_addr()?, "SyncScript is accepting connections.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(events))
        .await?;
    info!("Server stopped.");

    Ok(())
}

/// Waits for Ctrl+C, then closes every event channel so that open
/// event streams end and the server can drain.
async fn shutdown_signal(events: BroadcastHub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    match events.close_all() {
        Ok(closed) => info!(closed, "Shutdown signal received; closed event channels."),
        Err(e) => warn!("Failed to close event channels: {e}"),
    }
}

/// Process entry point: loads `.env`, installs the log subscriber, reads the
/// configuration and binds the listening port.
pub async fn start() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = get_config(None)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    run(listener, config).await
}
