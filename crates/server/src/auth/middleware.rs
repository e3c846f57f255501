//! # Caller Identity Extraction
//!
//! The `CallerIdentity` extractor never rejects a request. A missing,
//! malformed, invalid or expired token all resolve to `Identity::Anonymous`,
//! and the permission resolver then answers `Unauthenticated` for any vault
//! operation.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use core_access::Identity;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::{errors::AppError, state::AppState};

/// The identity of the caller, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Identity);

impl CallerIdentity {
    /// The caller's user id, or `Unauthenticated` for anonymous callers.
    pub fn require_user(&self) -> Result<&str, AppError> {
        self.0
            .user_id()
            .ok_or(AppError::Access(core_access::AccessError::Unauthenticated))
    }
}

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer_header =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state).await;

        let identity = match bearer_header {
            Ok(Some(TypedHeader(Authorization(bearer)))) => {
                match state.jwt.verify(bearer.token()) {
                    Ok(user_id) => Identity::User(user_id),
                    Err(e) => {
                        warn!("JWT validation failed: {}", e);
                        Identity::Anonymous
                    }
                }
            }
            Ok(None) => {
                debug!("No Authorization header found, treating caller as anonymous.");
                Identity::Anonymous
            }
            Err(e) => {
                warn!("Malformed Authorization header: {}", e);
                Identity::Anonymous
            }
        };

        Ok(CallerIdentity(identity))
    }
}
