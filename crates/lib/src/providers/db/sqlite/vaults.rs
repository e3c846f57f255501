//! Vault lifecycle: creation with an initial owner, listing, details,
//! updates and cascading deletion.

use super::{count_all, count_by_key, required, sql, timestamp_at, vault_from_row, SqliteProvider};
use crate::{
    errors::StoreError,
    types::{MemberView, SourceWithAnnotations, Stats, Vault, VaultDetail, VaultSummary, VaultUpdate},
};
use core_access::{
    timestamps::{now_timestamp, parse_timestamp},
    Role,
};
use tracing::info;
use turso::params;
use uuid::Uuid;

impl SqliteProvider {
    /// Creates a vault and makes `owner_id` its first OWNER in the same transaction.
    pub async fn create_vault(
        &self,
        owner_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vault, StoreError> {
        let title = required("title", title)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();

        let mut conn = self.connect()?;
        let tx = conn.transaction().await?;
        tx.execute(
            "INSERT INTO vaults (id, title, description, created_at) VALUES (?, ?, ?, ?)",
            params![id.clone(), title.clone(), description.clone(), created_at.clone()],
        )
        .await?;
        tx.execute(
            "INSERT INTO vault_members (vault_id, user_id, role, created_at) VALUES (?, ?, ?, ?)",
            params![id.clone(), owner_id, Role::Owner.as_str(), created_at.clone()],
        )
        .await?;
        tx.commit().await?;

        info!(vault_id = %id, owner_id = %owner_id, "Created vault.");
        Ok(Vault {
            id,
            title,
            description,
            created_at: parse_timestamp(&created_at).map_err(StoreError::DataIntegrity)?,
        })
    }

    pub async fn get_vault(&self, vault_id: &str) -> Result<Option<Vault>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn.query(sql::SELECT_VAULT, params![vault_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(vault_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Lists the vaults `user_id` belongs to, newest first, with counts.
    pub async fn list_vaults_for_user(&self, user_id: &str) -> Result<Vec<VaultSummary>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_VAULTS_FOR_USER, params![user_id])
            .await?;

        let mut listed = Vec::new();
        while let Some(row) = rows.next().await? {
            let vault = vault_from_row(&row)?;
            let role_str: String = row.get(4)?;
            let role = role_str
                .parse::<Role>()
                .map_err(|e| StoreError::DataIntegrity(e.to_string()))?;
            listed.push((vault, role));
        }

        let mut summaries = Vec::with_capacity(listed.len());
        for (vault, role) in listed {
            let member_count = count_by_key(
                &conn,
                "SELECT COUNT(*) FROM vault_members WHERE vault_id = ?",
                &vault.id,
            )
            .await?;
            let source_count =
                count_by_key(&conn, "SELECT COUNT(*) FROM sources WHERE vault_id = ?", &vault.id)
                    .await?;
            let file_count = count_by_key(
                &conn,
                "SELECT COUNT(*) FROM file_uploads WHERE vault_id = ?",
                &vault.id,
            )
            .await?;
            summaries.push(VaultSummary {
                vault,
                role,
                member_count,
                source_count,
                file_count,
            });
        }
        Ok(summaries)
    }

    /// Members of a vault with their profiles, owners first.
    pub async fn list_members(&self, vault_id: &str) -> Result<Vec<MemberView>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_MEMBERS_WITH_USERS, params![vault_id])
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            let role_str: String = row.get(3)?;
            members.push(MemberView {
                user_id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                role: role_str
                    .parse::<Role>()
                    .map_err(|e| StoreError::DataIntegrity(e.to_string()))?,
                joined_at: timestamp_at(&row, 4)?,
            });
        }
        members.sort_by_key(|m| match m.role {
            Role::Owner => 0,
            Role::Contributor => 1,
            Role::Viewer => 2,
        });
        Ok(members)
    }

    /// Loads a vault with its members, sources (with annotations) and uploads.
    pub async fn get_vault_detail(&self, vault_id: &str) -> Result<Option<VaultDetail>, StoreError> {
        let Some(vault) = self.get_vault(vault_id).await? else {
            return Ok(None);
        };

        let members = self.list_members(vault_id).await?;
        let mut sources = Vec::new();
        for source in self.list_sources(vault_id).await? {
            let annotations = self.list_annotations(&source.id).await?;
            sources.push(SourceWithAnnotations {
                source,
                annotations,
            });
        }
        let file_uploads = self.list_uploads(vault_id).await?;

        Ok(Some(VaultDetail {
            vault,
            members,
            sources,
            file_uploads,
        }))
    }

    /// Applies a partial update to a vault's title and description.
    pub async fn update_vault(&self, vault_id: &str, update: &VaultUpdate) -> Result<Vault, StoreError> {
        let mut vault = self
            .get_vault(vault_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Vault '{vault_id}'")))?;

        if let Some(title) = &update.title {
            vault.title = required("title", title)?;
        }
        if let Some(description) = &update.description {
            let trimmed = description.trim();
            vault.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }

        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE vaults SET title = ?, description = ? WHERE id = ?",
                params![vault.title.clone(), vault.description.clone(), vault_id],
            )
            .await?;
        // Deleted between the read above and this write.
        if updated == 0 {
            return Err(StoreError::NotFound(format!("Vault '{vault_id}'")));
        }
        info!(vault_id = %vault_id, "Updated vault details.");
        Ok(vault)
    }

    /// Hard-deletes a vault and everything it owns.
    pub async fn delete_vault(&self, vault_id: &str) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().await?;

        let mut source_ids = Vec::new();
        {
            let mut stmt = tx
                .prepare("SELECT id FROM sources WHERE vault_id = ?")
                .await?;
            let mut rows = stmt.query(params![vault_id]).await?;
            while let Some(row) = rows.next().await? {
                source_ids.push(row.get::<String>(0)?);
            }
        }

        for source_id in &source_ids {
            tx.execute(
                "DELETE FROM annotations WHERE source_id = ?",
                params![source_id.as_str()],
            )
            .await?;
        }
        tx.execute("DELETE FROM sources WHERE vault_id = ?", params![vault_id])
            .await?;
        tx.execute("DELETE FROM file_uploads WHERE vault_id = ?", params![vault_id])
            .await?;
        tx.execute("DELETE FROM vault_members WHERE vault_id = ?", params![vault_id])
            .await?;
        let deleted = tx
            .execute("DELETE FROM vaults WHERE id = ?", params![vault_id])
            .await?;

        if deleted == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("Vault '{vault_id}'")));
        }
        tx.commit().await?;

        info!(vault_id = %vault_id, sources = source_ids.len(), "Deleted vault and its contents.");
        Ok(())
    }

    /// Site-wide totals.
    pub async fn stats(&self) -> Result<Stats, StoreError> {
        let conn = self.connect()?;
        Ok(Stats {
            total_users: count_all(&conn, "SELECT COUNT(*) FROM users").await?,
            total_vaults: count_all(&conn, "SELECT COUNT(*) FROM vaults").await?,
            total_papers: count_all(&conn, "SELECT COUNT(*) FROM file_uploads").await?,
            total_annotations: count_all(&conn, "SELECT COUNT(*) FROM annotations").await?,
        })
    }
}
