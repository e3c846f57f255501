//! # Permission Resolver
//!
//! `resolve` answers "what role does this user hold in this vault?" and
//! `authorize` answers "may this caller perform this action here?". Every
//! mutating operation in the application calls `authorize` before touching
//! persisted state.

use crate::{
    error::AccessError,
    membership::MembershipStore,
    policy::{evaluate, Action, Role},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The authenticated identity of a caller, passed explicitly to every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No valid session was presented.
    Anonymous,
    /// A signed-in user, by user id.
    User(String),
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::User(id) => Some(id),
        }
    }
}

/// Proof that a caller passed `authorize`, with the role they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub user_id: String,
    pub role: Role,
}

/// Returns the caller's role in `vault_id`, or `None` when they are not a member.
pub async fn resolve<S: MembershipStore + ?Sized>(
    store: &S,
    user_id: &str,
    vault_id: &str,
) -> Result<Option<Role>, AccessError> {
    let membership = store.find_membership(user_id, vault_id).await?;
    Ok(membership.map(|m| m.role))
}

/// Decides whether `identity` may perform `action` in `vault_id`.
///
/// The checks run in a fixed order: an anonymous caller is rejected with
/// `Unauthenticated` before any lookup, a missing membership yields
/// `NotAMember`, and an insufficient role yields `Forbidden` naming the
/// minimum role.
pub async fn authorize<S: MembershipStore + ?Sized>(
    store: &S,
    identity: &Identity,
    vault_id: &str,
    action: &Action,
) -> Result<Grant, AccessError> {
    let user_id = identity.user_id().ok_or(AccessError::Unauthenticated)?;

    let role = resolve(store, user_id, vault_id)
        .await?
        .ok_or(AccessError::NotAMember)?;

    if let Err(denied) = evaluate(role, user_id, action) {
        info!(
            user_id = %user_id,
            vault_id = %vault_id,
            role = %role,
            action = action.name(),
            "Authorization denied."
        );
        return Err(denied);
    }

    debug!(user_id = %user_id, vault_id = %vault_id, action = action.name(), "Authorization granted.");
    Ok(Grant {
        user_id: user_id.to_string(),
        role,
    })
}
