//! # Vault Membership
//!
//! Membership rows are the only contended state in the access model. This
//! module defines the persistence seam the resolver reads through
//! (`MembershipStore`) and its turso-backed implementation.
//!
//! Every mutation that could strip a vault of its last OWNER performs the
//! owner count and the write as one atomic unit: writes are serialised behind
//! an async mutex and run inside a single database transaction.

use crate::{
    error::AccessError,
    policy::Role,
    timestamps::{now_timestamp, parse_timestamp},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use turso::{Database, Row, params};

/// A (user, vault, role) association.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Membership {
    pub vault_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Membership {
    type Error = AccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let role_str: String = row.get(2)?;
        let role = role_str
            .parse::<Role>()
            .map_err(|e| AccessError::DataIntegrity(e.to_string()))?;
        let created_at_str: String = row.get(3)?;
        let created_at = parse_timestamp(&created_at_str).map_err(AccessError::DataIntegrity)?;

        Ok(Membership {
            vault_id: row.get(0)?,
            user_id: row.get(1)?,
            role,
            created_at,
        })
    }
}

/// The persistence operations the access model depends on.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Looks up the membership keyed by (user, vault).
    async fn find_membership(
        &self,
        user_id: &str,
        vault_id: &str,
    ) -> Result<Option<Membership>, AccessError>;

    /// Counts the OWNER memberships of a vault, read from live state.
    async fn count_owners(&self, vault_id: &str) -> Result<u64, AccessError>;

    /// Lists all memberships of a vault, owners first.
    async fn list_memberships(&self, vault_id: &str) -> Result<Vec<Membership>, AccessError>;

    /// Inserts a new membership. Fails with `VaultNotFound` when the vault is
    /// gone and `AlreadyMember` on a duplicate key.
    async fn insert_membership(
        &self,
        vault_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, AccessError>;

    /// Deletes a membership unless it is the vault's only OWNER.
    /// Returns the removed membership.
    async fn remove_membership_guarded(
        &self,
        vault_id: &str,
        user_id: &str,
    ) -> Result<Membership, AccessError>;

    /// Changes a member's role unless that demotes the vault's only OWNER.
    /// Returns the updated membership.
    async fn update_role_guarded(
        &self,
        vault_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, AccessError>;
}

const SELECT_MEMBERSHIP: &str =
    "SELECT vault_id, user_id, role, created_at FROM vault_members WHERE vault_id = ? AND user_id = ?";
const COUNT_OWNERS: &str =
    "SELECT COUNT(*) FROM vault_members WHERE vault_id = ? AND role = 'OWNER'";

/// The last-owner guard: may `current` move away from OWNER given `owner_count`?
fn guard_last_owner(
    current: &Membership,
    new_role: Option<Role>,
    owner_count: i64,
) -> Result<(), AccessError> {
    let leaves_owner = current.role == Role::Owner && new_role != Some(Role::Owner);
    if leaves_owner && owner_count <= 1 {
        Err(AccessError::LastOwnerProtected)
    } else {
        Ok(())
    }
}

/// A `MembershipStore` over a turso database.
///
/// Clones share the same database and the same write lock, so every clone
/// participates in the same serialisation of membership writes.
#[derive(Clone)]
pub struct TursoMembershipStore {
    db: Database,
    write_lock: Arc<Mutex<()>>,
}

impl TursoMembershipStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Removes or re-roles a member inside one transaction.
    /// `new_role == None` means removal.
    async fn guarded_mutation(
        &self,
        vault_id: &str,
        user_id: &str,
        new_role: Option<Role>,
    ) -> Result<Membership, AccessError> {
        let _guard = self.write_lock.lock().await;
        let mut conn = self.db.connect()?;
        let tx = conn.transaction().await?;

        let checked: Result<(Membership, i64), AccessError> = async {
            let mut stmt = tx.prepare(SELECT_MEMBERSHIP).await?;
            let mut rows = stmt.query(params![vault_id, user_id]).await?;
            let current = match rows.next().await? {
                Some(row) => Membership::try_from(&row)?,
                None => return Err(AccessError::MemberNotFound),
            };

            let mut stmt = tx.prepare(COUNT_OWNERS).await?;
            let mut rows = stmt.query(params![vault_id]).await?;
            let owner_count = match rows.next().await? {
                Some(row) => row.get::<i64>(0)?,
                None => 0,
            };

            guard_last_owner(&current, new_role, owner_count)?;
            Ok((current, owner_count))
        }
        .await;

        let (current, owner_count) = match checked {
            Ok(v) => v,
            Err(e) => {
                tx.rollback().await?;
                if matches!(e, AccessError::LastOwnerProtected) {
                    warn!(vault_id = %vault_id, user_id = %user_id, "Rejected mutation of the last owner.");
                }
                return Err(e);
            }
        };

        let result = match new_role {
            None => {
                tx.execute(
                    "DELETE FROM vault_members WHERE vault_id = ? AND user_id = ?",
                    params![vault_id, user_id],
                )
                .await?;
                current
            }
            Some(role) => {
                tx.execute(
                    "UPDATE vault_members SET role = ? WHERE vault_id = ? AND user_id = ?",
                    params![role.as_str(), vault_id, user_id],
                )
                .await?;
                Membership { role, ..current }
            }
        };
        tx.commit().await?;

        debug!(vault_id = %vault_id, user_id = %user_id, owners_before = owner_count, "Membership mutation committed.");
        Ok(result)
    }
}

impl fmt::Debug for TursoMembershipStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TursoMembershipStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl MembershipStore for TursoMembershipStore {
    async fn find_membership(
        &self,
        user_id: &str,
        vault_id: &str,
    ) -> Result<Option<Membership>, AccessError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(SELECT_MEMBERSHIP, params![vault_id, user_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Membership::try_from(&row)?)),
            None => Ok(None),
        }
    }

    async fn count_owners(&self, vault_id: &str) -> Result<u64, AccessError> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(COUNT_OWNERS, params![vault_id]).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(count.max(0) as u64)
    }

    async fn list_memberships(&self, vault_id: &str) -> Result<Vec<Membership>, AccessError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT vault_id, user_id, role, created_at FROM vault_members WHERE vault_id = ? ORDER BY created_at ASC",
                params![vault_id],
            )
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(Membership::try_from(&row)?);
        }
        // OWNER first, then CONTRIBUTOR, then VIEWER; stable on join order.
        members.sort_by_key(|m| std::cmp::Reverse(m.role.rank()));
        Ok(members)
    }

    async fn insert_membership(
        &self,
        vault_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, AccessError> {
        let _guard = self.write_lock.lock().await;
        let created_at = now_timestamp();
        let mut conn = self.db.connect()?;
        let tx = conn.transaction().await?;

        let checked: Result<(), AccessError> = async {
            let mut stmt = tx.prepare("SELECT 1 FROM vaults WHERE id = ?").await?;
            let mut rows = stmt.query(params![vault_id]).await?;
            if rows.next().await?.is_none() {
                return Err(AccessError::VaultNotFound);
            }
            let mut stmt = tx.prepare(SELECT_MEMBERSHIP).await?;
            let mut rows = stmt.query(params![vault_id, user_id]).await?;
            if rows.next().await?.is_some() {
                return Err(AccessError::AlreadyMember);
            }
            Ok(())
        }
        .await;
        if let Err(e) = checked {
            tx.rollback().await?;
            return Err(e);
        }

        tx.execute(
            "INSERT INTO vault_members (vault_id, user_id, role, created_at) VALUES (?, ?, ?, ?)",
            params![vault_id, user_id, role.as_str(), created_at.clone()],
        )
        .await?;
        tx.commit().await?;

        Ok(Membership {
            vault_id: vault_id.to_string(),
            user_id: user_id.to_string(),
            role,
            created_at: parse_timestamp(&created_at).map_err(AccessError::DataIntegrity)?,
        })
    }

    async fn remove_membership_guarded(
        &self,
        vault_id: &str,
        user_id: &str,
    ) -> Result<Membership, AccessError> {
        self.guarded_mutation(vault_id, user_id, None).await
    }

    async fn update_role_guarded(
        &self,
        vault_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, AccessError> {
        self.guarded_mutation(vault_id, user_id, Some(role)).await
    }
}

/// Adds `user_id` to a vault with `role`.
///
/// The caller is expected to have authorized `Action::ManageMembers` first.
pub async fn add_member<S: MembershipStore + ?Sized>(
    store: &S,
    vault_id: &str,
    user_id: &str,
    role: Role,
) -> Result<Membership, AccessError> {
    let membership = store.insert_membership(vault_id, user_id, role).await?;
    info!(vault_id = %vault_id, user_id = %user_id, role = %role, "Member added.");
    Ok(membership)
}

/// Removes `user_id` from a vault, refusing to remove the sole OWNER.
pub async fn remove_member<S: MembershipStore + ?Sized>(
    store: &S,
    vault_id: &str,
    user_id: &str,
) -> Result<Membership, AccessError> {
    let removed = store.remove_membership_guarded(vault_id, user_id).await?;
    info!(vault_id = %vault_id, user_id = %user_id, "Member removed.");
    Ok(removed)
}

/// Moves `user_id` to `role`, refusing to demote the sole OWNER.
/// Setting the current role again is a no-op that still succeeds.
pub async fn change_member_role<S: MembershipStore + ?Sized>(
    store: &S,
    vault_id: &str,
    user_id: &str,
    role: Role,
) -> Result<Membership, AccessError> {
    let updated = store.update_role_guarded(vault_id, user_id, role).await?;
    info!(vault_id = %vault_id, user_id = %user_id, role = %role, "Member role changed.");
    Ok(updated)
}
