//! # Authentication Route Handlers
//!
//! Password registration and login, both of which return a session token,
//! and a `me` endpoint for the current caller.

use super::{wrap_response, ApiResponse, AppError, AppState};
use crate::auth::middleware::CallerIdentity;
use axum::{extract::State, http::StatusCode, Json};
use core_access::{find_user_by_id, register_user, verify_credentials, User};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

fn session_for(app_state: &AppState, user: User) -> Result<SessionResponse, AppError> {
    let token = app_state
        .jwt
        .issue(&user.id)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign session token: {e}")))?;
    Ok(SessionResponse { token, user })
}

/// Creates a password account and signs the new user in.
pub async fn register_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), AppError> {
    let user = register_user(
        &app_state.sqlite_provider.db,
        &payload.email,
        &payload.name,
        &payload.password,
    )
    .await?;
    let session = session_for(&app_state, user)?;
    Ok((StatusCode::CREATED, wrap_response(session)))
}

/// Exchanges an email and password for a session token.
pub async fn login_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    let user = verify_credentials(&app_state.sqlite_provider.db, &payload.email, &payload.password)
        .await?;
    info!(user_id = %user.id, "User signed in.");
    Ok(wrap_response(session_for(&app_state, user)?))
}

/// Returns the details of the currently authenticated user.
pub async fn get_me_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user_id = caller.require_user()?;
    let user = find_user_by_id(&app_state.sqlite_provider.db, user_id)
        .await?
        // A valid token for an account that no longer exists.
        .ok_or(AppError::Access(core_access::AccessError::Unauthenticated))?;
    Ok(wrap_response(user))
}
