use super::{required, source_from_row, sql, SqliteProvider};
use crate::{errors::StoreError, types::Source};
use core_access::timestamps::{now_timestamp, parse_timestamp};
use tracing::info;
use turso::params;
use uuid::Uuid;

impl SqliteProvider {
    /// Adds a source to a vault. The vault lookup and the insert share one
    /// transaction, so a concurrently deleted vault never gains a source.
    pub async fn create_source(
        &self,
        vault_id: &str,
        title: &str,
        url: &str,
        citation: Option<&str>,
    ) -> Result<Source, StoreError> {
        let title = required("title", title)?;
        let url = required("url", url)?;
        let citation = citation
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();

        let mut conn = self.connect()?;
        let tx = conn.transaction().await?;
        let vault_exists = {
            let mut stmt = tx.prepare(sql::VAULT_EXISTS).await?;
            let mut rows = stmt.query(params![vault_id]).await?;
            rows.next().await?.is_some()
        };
        if !vault_exists {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("Vault '{vault_id}'")));
        }
        tx.execute(
            "INSERT INTO sources (id, vault_id, title, url, citation, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id.clone(),
                vault_id,
                title.clone(),
                url.clone(),
                citation.clone(),
                created_at.clone()
            ],
        )
        .await?;
        tx.commit().await?;

        info!(source_id = %id, vault_id = %vault_id, "Created source.");
        Ok(Source {
            id,
            vault_id: vault_id.to_string(),
            title,
            url,
            citation,
            created_at: parse_timestamp(&created_at).map_err(StoreError::DataIntegrity)?,
        })
    }

    pub async fn get_source(&self, source_id: &str) -> Result<Option<Source>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn.query(sql::SELECT_SOURCE, params![source_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(source_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Sources of a vault, newest first.
    pub async fn list_sources(&self, vault_id: &str) -> Result<Vec<Source>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_SOURCES_BY_VAULT, params![vault_id])
            .await?;
        let mut sources = Vec::new();
        while let Some(row) = rows.next().await? {
            sources.push(source_from_row(&row)?);
        }
        Ok(sources)
    }

    /// Stores generated citation text on a source.
    pub async fn set_source_citation(
        &self,
        source_id: &str,
        citation: &str,
    ) -> Result<Source, StoreError> {
        let citation = required("citation", citation)?;
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE sources SET citation = ? WHERE id = ?",
                params![citation.as_str(), source_id],
            )
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("Source '{source_id}'")));
        }
        self.get_source(source_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Source '{source_id}'")))
    }

    /// Deletes a source together with its annotations.
    pub async fn delete_source(&self, source_id: &str) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().await?;
        let annotations = tx
            .execute(
                "DELETE FROM annotations WHERE source_id = ?",
                params![source_id],
            )
            .await?;
        let deleted = tx
            .execute("DELETE FROM sources WHERE id = ?", params![source_id])
            .await?;
        if deleted == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("Source '{source_id}'")));
        }
        tx.commit().await?;

        info!(source_id = %source_id, annotations, "Deleted source.");
        Ok(())
    }
}
