//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds all shared resources, such
//! as the configuration, the database, the event hub and the citation model
//! client, making them accessible to all request handlers.

use crate::{auth::jwt::JwtKeys, config::AppConfig};
use anyhow::anyhow;
use std::sync::Arc;
use syncscript::{
    providers::{
        ai::{chat::ChatCompletionsProvider, AiProvider},
        db::sqlite::SqliteProvider,
    },
    BroadcastHub, UploadPolicy,
};
use tracing::{info, warn};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// The database provider for users, vaults and their contents.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// Session token keys.
    pub jwt: JwtKeys,
    /// Per-vault real-time event channels.
    pub events: BroadcastHub,
    /// The citation model; `None` means citations always use the fallback format.
    pub citation_provider: Option<Arc<dyn AiProvider>>,
    pub upload_policy: Arc<UploadPolicy>,
}

/// Builds the shared application state from the configuration.
///
/// - It opens the SQLite database and ensures the schema exists.
/// - It derives the JWT keys, refusing to start without a secret.
/// - It instantiates the citation model client when one is configured.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let secret = config
        .jwt_secret
        .clone()
        .ok_or_else(|| anyhow!("jwt_secret is required. Please set JWT_SECRET in your .env file."))?;
    let jwt = JwtKeys::new(&secret, config.jwt_ttl_secs);

    let citation_provider: Option<Arc<dyn AiProvider>> = match &config.citation {
        Some(citation) => {
            let mut provider = ChatCompletionsProvider::new(
                citation.api_url.clone(),
                citation.api_key.clone(),
                citation.model.clone(),
            )?;
            if let Some(referer) = &citation.referer {
                provider = provider.with_referer(referer.clone());
            }
            info!(api_url = %citation.api_url, "Configured citation model.");
            Some(Arc::new(provider) as Arc<dyn AiProvider>)
        }
        None => {
            warn!("No citation model configured; citations will use the fallback format.");
            None
        }
    };

    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    // Ensure the database schema is up-to-date on startup.
    sqlite_provider.initialize_schema().await?;

    let upload_policy = UploadPolicy {
        max_bytes: config.uploads.max_bytes,
        allowed_content_types: config.uploads.allowed_content_types.clone(),
    };

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        jwt,
        events: BroadcastHub::default(),
        citation_provider,
        upload_policy: Arc::new(upload_policy),
    })
}
