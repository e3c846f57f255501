//! # General Route Handlers
//!
//! The root, health check and public statistics endpoints.

use super::{wrap_response, ApiResponse, AppError, AppState};
use axum::{extract::State, Json};
use syncscript::Stats;

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "syncscript server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Site-wide totals for the landing page. Public.
pub async fn stats_handler(
    State(app_state): State<AppState>,
) -> Result<Json<ApiResponse<Stats>>, AppError> {
    let stats = app_state.sqlite_provider.stats().await?;
    Ok(wrap_response(stats))
}
