//! # Upload Route Handlers
//!
//! The client uploads PDF bytes to the storage CDN and then registers the
//! result here. Registration checks the configured type and size limits.

use super::{announce, authorize_caller, wrap_response, ApiResponse, AppError, AppState};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_access::Action;
use syncscript::{FileUpload, NewFileUpload, VaultEventKind};

pub async fn list_uploads_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<FileUpload>>>, AppError> {
    authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;
    let uploads = app_state.sqlite_provider.list_uploads(&vault_id).await?;
    Ok(wrap_response(uploads))
}

pub async fn record_upload_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
    Json(payload): Json<NewFileUpload>,
) -> Result<(StatusCode, Json<ApiResponse<FileUpload>>), AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::AddPdf).await?;
    let upload = app_state
        .sqlite_provider
        .record_upload(&vault_id, &grant.user_id, payload, &app_state.upload_policy)
        .await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::FileUploaded {
            file: upload.clone(),
        },
    );
    Ok((StatusCode::CREATED, wrap_response(upload)))
}

pub async fn delete_upload_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, upload_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::DeletePdf).await?;
    app_state
        .sqlite_provider
        .get_upload(&upload_id)
        .await?
        .filter(|u| u.vault_id == vault_id)
        .ok_or_else(|| AppError::NotFound(format!("Upload '{upload_id}' not found")))?;
    app_state.sqlite_provider.delete_upload(&upload_id).await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::FileDeleted { file_id: upload_id },
    );
    Ok(StatusCode::NO_CONTENT)
}
