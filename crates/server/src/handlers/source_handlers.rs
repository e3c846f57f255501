use super::{announce, authorize_caller, wrap_response, ApiResponse, AppError, AppState};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_access::Action;
use serde::Deserialize;
use syncscript::{Source, VaultEventKind};

#[derive(Deserialize)]
pub struct CreateSourceRequest {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub citation: Option<String>,
}

/// Loads a source, treating one from another vault as missing.
pub(crate) async fn source_in_vault(
    app_state: &AppState,
    vault_id: &str,
    source_id: &str,
) -> Result<Source, AppError> {
    app_state
        .sqlite_provider
        .get_source(source_id)
        .await?
        .filter(|s| s.vault_id == vault_id)
        .ok_or_else(|| AppError::NotFound(format!("Source '{source_id}' not found")))
}

pub async fn list_sources_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Source>>>, AppError> {
    authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;
    let sources = app_state.sqlite_provider.list_sources(&vault_id).await?;
    Ok(wrap_response(sources))
}

pub async fn create_source_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
    Json(payload): Json<CreateSourceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Source>>), AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::AddSource).await?;
    let source = app_state
        .sqlite_provider
        .create_source(
            &vault_id,
            &payload.title,
            &payload.url,
            payload.citation.as_deref(),
        )
        .await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::SourceAdded {
            source: source.clone(),
        },
    );
    Ok((StatusCode::CREATED, wrap_response(source)))
}

pub async fn delete_source_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, source_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::DeleteSource).await?;
    source_in_vault(&app_state, &vault_id, &source_id).await?;
    app_state.sqlite_provider.delete_source(&source_id).await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::SourceDeleted { source_id },
    );
    Ok(StatusCode::NO_CONTENT)
}
