//! # Membership Route Handlers
//!
//! Only OWNERs manage members. Removal and role changes go through the
//! last-owner guard, so a vault always keeps at least one OWNER.

use super::{announce, authorize_caller, wrap_response, ApiResponse, AppError, AppState};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_access::{add_member, change_member_role, find_user_by_email, remove_member, Action, Role};
use serde::Deserialize;
use syncscript::{MemberView, VaultEventKind};

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse::<Role>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

pub async fn list_members_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<MemberView>>>, AppError> {
    authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;
    let members = app_state.sqlite_provider.list_members(&vault_id).await?;
    Ok(wrap_response(members))
}

/// Adds an existing user, looked up by email, to the vault.
pub async fn add_member_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MemberView>>), AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::ManageMembers).await?;
    let role = parse_role(&payload.role)?;

    let user = find_user_by_email(&app_state.sqlite_provider.db, &payload.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user found with email '{}'", payload.email)))?;

    let membership = add_member(app_state.sqlite_provider.memberships(), &vault_id, &user.id, role)
        .await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::MemberAdded {
            user_id: user.id.clone(),
            role,
        },
    );

    let member = MemberView {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: membership.role,
        joined_at: membership.created_at,
    };
    Ok((StatusCode::CREATED, wrap_response(member)))
}

pub async fn change_member_role_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, user_id)): Path<(String, String)>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<MemberView>>, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::ManageMembers).await?;
    let role = parse_role(&payload.role)?;

    let membership =
        change_member_role(app_state.sqlite_provider.memberships(), &vault_id, &user_id, role)
            .await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::MemberRoleChanged {
            user_id: user_id.clone(),
            role,
        },
    );

    let member = app_state
        .sqlite_provider
        .list_members(&vault_id)
        .await?
        .into_iter()
        .find(|m| m.user_id == membership.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Member '{user_id}' not found")))?;
    Ok(wrap_response(member))
}

/// Removes a member. An OWNER may remove themselves unless they are the last one.
pub async fn remove_member_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path((vault_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::ManageMembers).await?;
    remove_member(app_state.sqlite_provider.memberships(), &vault_id, &user_id).await?;

    announce(
        &app_state,
        &vault_id,
        &grant.user_id,
        VaultEventKind::MemberRemoved { user_id },
    );
    Ok(StatusCode::NO_CONTENT)
}
