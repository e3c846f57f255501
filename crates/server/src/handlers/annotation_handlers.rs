//! # Annotation Route Handlers
//!
//! Contributors may delete their own annotations; deleting anyone else's
//! requires OWNER. The author is looked up before the decision is made.

use super::{
    announce, authorize_caller, source_handlers::source_in_vault, wrap_response, ApiResponse,
    AppError, AppState,
};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_access::Action;
use serde::Deserialize;
use syncscript::{Annotation, VaultEventKind};

#[derive(Deserialize)]
pub struct CreateAnnotationRequest {
    pub content: String,
    #[serde(default)]
    pub page_number: Option<i64>,
}

pub async fn list_annotations_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, source_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<Annotation>>>, AppError> {
    authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;
    source_in_vault(&app_state, &vault_id, &source_id).await?;
    let annotations = app_state.sqlite_provider.list_annotations(&source_id).await?;
    Ok(wrap_response(annotations))
}

pub async fn create_annotation_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, source_id)): Path<(String, String)>,
    Json(payload): Json<CreateAnnotationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Annotation>>), AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::AddAnnotation).await?;
    source_in_vault(&app_state, &vault_id, &source_id).await?;

    let annotation = app_state
        .sqlite_provider
        .create_annotation(&source_id, &grant.user_id, &payload.content, payload.page_number)
        .await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::AnnotationAdded {
            annotation: annotation.clone(),
        },
    );
    Ok((StatusCode::CREATED, wrap_response(annotation)))
}

pub async fn delete_annotation_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, annotation_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    // Membership first, so outsiders cannot discover annotation ids.
    authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;

    let annotation = app_state
        .sqlite_provider
        .get_annotation(&annotation_id)
        .await?
        .filter(|a| a.vault_id == vault_id)
        .ok_or_else(|| AppError::NotFound(format!("Annotation '{annotation_id}' not found")))?;

    let grant = authorize_caller(
        &app_state,
        &caller,
        &vault_id,
        Action::DeleteAnnotation {
            author_id: annotation.author_id.clone(),
        },
    )
    .await?;
    app_state
        .sqlite_provider
        .delete_annotation(&annotation_id)
        .await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::AnnotationDeleted {
            annotation_id,
            source_id: annotation.source_id,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}
