//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `syncscript-server`.
//! The handlers are split into logical sub-modules by resource. Every vault
//! handler authorizes the caller through `core_access::authorize` before it
//! touches persisted state, and announces successful mutations on the vault's
//! event channel.

pub mod annotation_handlers;
pub mod auth_handlers;
pub mod citation_handlers;
pub mod event_handlers;
pub mod general;
pub mod member_handlers;
pub mod source_handlers;
pub mod upload_handlers;
pub mod vault_handlers;

pub use annotation_handlers::*;
pub use auth_handlers::*;
pub use citation_handlers::*;
pub use event_handlers::*;
pub use general::*;
pub use member_handlers::*;
pub use source_handlers::*;
pub use upload_handlers::*;
pub use vault_handlers::*;

// Shared items used by multiple handler modules.
use super::{auth::middleware::CallerIdentity, errors::AppError, state::AppState, types::ApiResponse};
use axum::Json;
use core_access::{authorize, Action, Grant};
use syncscript::{publish_best_effort, VaultEvent, VaultEventKind};

/// Wraps a successful result in the standard `ApiResponse` format.
pub(crate) fn wrap_response<T>(result: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { result })
}

/// Authorizes `action` in `vault_id` for the caller.
pub(crate) async fn authorize_caller(
    app_state: &AppState,
    caller: &CallerIdentity,
    vault_id: &str,
    action: Action,
) -> Result<Grant, AppError> {
    Ok(authorize(
        app_state.sqlite_provider.memberships(),
        &caller.0,
        vault_id,
        &action,
    )
    .await?)
}

/// Announces a change on the vault's channel. Failures are only logged.
pub(crate) fn announce(app_state: &AppState, vault_id: &str, actor_id: &str, kind: VaultEventKind) {
    publish_best_effort(&app_state.events, VaultEvent::new(vault_id, actor_id, kind));
}
