use super::{
    announce, authorize_caller, source_handlers::source_in_vault, wrap_response, ApiResponse,
    AppError, AppState,
};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    Json,
};
use core_access::Action;
use serde::{Deserialize, Serialize};
use syncscript::{generate_citation, CitationOrigin, CitationRequest, PaperMetadata, Source, VaultEventKind};

#[derive(Deserialize)]
pub struct GenerateCitationRequest {
    #[serde(flatten)]
    pub paper: CitationRequest,
    /// Stores the result on this source when given.
    #[serde(default)]
    pub source_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CitationResponse {
    pub citation: String,
    pub source: CitationOrigin,
    pub metadata: PaperMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_source: Option<Source>,
}

/// Generates an APA citation, falling back to a fixed format when the
/// model is unavailable.
pub async fn generate_citation_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
    Json(payload): Json<GenerateCitationRequest>,
) -> Result<Json<ApiResponse<CitationResponse>>, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::GenerateCitation).await?;
    if let Some(source_id) = &payload.source_id {
        source_in_vault(&app_state, &vault_id, source_id).await?;
    }

    let generated =
        generate_citation(app_state.citation_provider.as_deref(), &payload.paper).await?;

    let updated_source = match &payload.source_id {
        Some(source_id) => Some(
            app_state
                .sqlite_provider
                .set_source_citation(source_id, &generated.citation)
                .await?,
        ),
        None => None,
    };

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::CitationGenerated {
            citation: generated.citation.clone(),
            source_id: payload.source_id.clone(),
        },
    );

    Ok(wrap_response(CitationResponse {
        citation: generated.citation,
        source: generated.source,
        metadata: generated.metadata,
        updated_source,
    }))
}
