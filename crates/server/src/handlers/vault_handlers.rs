//! # Vault Route Handlers
//!
//! Listing, creating, reading, updating and deleting vaults. Creating a vault
//! only requires a signed-in caller, who becomes its first OWNER.

use super::{announce, authorize_caller, wrap_response, ApiResponse, AppError, AppState};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_access::Action;
use serde::Deserialize;
use syncscript::{Vault, VaultDetail, VaultEventKind, VaultSummary, VaultUpdate};
use tracing::info;

#[derive(Deserialize)]
pub struct CreateVaultRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Lists the caller's vaults with their role and content counts.
pub async fn list_vaults_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<Vec<VaultSummary>>>, AppError> {
    let user_id = caller.require_user()?;
    let vaults = app_state.sqlite_provider.list_vaults_for_user(user_id).await?;
    Ok(wrap_response(vaults))
}

pub async fn create_vault_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<CreateVaultRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vault>>), AppError> {
    let user_id = caller.require_user()?;
    let vault = app_state
        .sqlite_provider
        .create_vault(user_id, &payload.title, payload.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, wrap_response(vault)))
}

/// Returns the vault with its members, sources, annotations and uploads.
pub async fn get_vault_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
) -> Result<Json<ApiResponse<VaultDetail>>, AppError> {
    authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;
    let detail = app_state
        .sqlite_provider
        .get_vault_detail(&vault_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vault '{vault_id}' not found")))?;
    Ok(wrap_response(detail))
}

pub async fn update_vault_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
    Json(payload): Json<VaultUpdate>,
) -> Result<Json<ApiResponse<Vault>>, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::UpdateVault).await?;
    let vault = app_state
        .sqlite_provider
        .update_vault(&vault_id, &payload)
        .await?;
    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::VaultUpdated {
            vault: vault.clone(),
        },
    );
    Ok(wrap_response(vault))
}

/// Hard-deletes the vault and everything in it, then closes its event channel.
pub async fn delete_vault_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::DeleteVault).await?;
    app_state.sqlite_provider.delete_vault(&vault_id).await?;
    info!(vault_id = %vault_id, user_id = %grant.user_id, "Vault deleted by owner.");

    announce(&app_state, &vault_id, &grant.user_id, VaultEventKind::VaultDeleted);
    if let Err(e) = app_state.events.close(&vault_id) {
        tracing::warn!(vault_id = %vault_id, "Failed to close event channel: {e}");
    }
    Ok(StatusCode::NO_CONTENT)
}
