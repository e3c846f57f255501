use super::{annotation_from_row, required, sql, SqliteProvider};
use crate::{errors::StoreError, types::Annotation};
use core_access::timestamps::{now_timestamp, parse_timestamp};
use tracing::info;
use turso::params;
use uuid::Uuid;

impl SqliteProvider {
    /// Adds a note to a source. `page_number`, when given, must be 1 or more.
    pub async fn create_annotation(
        &self,
        source_id: &str,
        author_id: &str,
        content: &str,
        page_number: Option<i64>,
    ) -> Result<Annotation, StoreError> {
        let content = required("content", content)?;
        if let Some(page) = page_number {
            if page < 1 {
                return Err(StoreError::Validation(format!(
                    "page_number must be at least 1, got {page}"
                )));
            }
        }
        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();

        let mut conn = self.connect()?;
        let tx = conn.transaction().await?;
        let vault_id = {
            let mut stmt = tx.prepare(sql::SOURCE_VAULT_ID).await?;
            let mut rows = stmt.query(params![source_id]).await?;
            match rows.next().await? {
                Some(row) => Some(row.get::<String>(0)?),
                None => None,
            }
        };
        let Some(vault_id) = vault_id else {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("Source '{source_id}'")));
        };
        tx.execute(
            "INSERT INTO annotations (id, source_id, author_id, content, page_number, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id.clone(),
                source_id,
                author_id,
                content.clone(),
                page_number,
                created_at.clone()
            ],
        )
        .await?;
        tx.commit().await?;

        info!(annotation_id = %id, source_id = %source_id, author_id = %author_id, "Created annotation.");
        Ok(Annotation {
            id,
            source_id: source_id.to_string(),
            vault_id,
            author_id: author_id.to_string(),
            content,
            page_number,
            created_at: parse_timestamp(&created_at).map_err(StoreError::DataIntegrity)?,
        })
    }

    pub async fn get_annotation(&self, annotation_id: &str) -> Result<Option<Annotation>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_ANNOTATION, params![annotation_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(annotation_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Annotations of a source, newest first.
    pub async fn list_annotations(&self, source_id: &str) -> Result<Vec<Annotation>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_ANNOTATIONS_BY_SOURCE, params![source_id])
            .await?;
        let mut annotations = Vec::new();
        while let Some(row) = rows.next().await? {
            annotations.push(annotation_from_row(&row)?);
        }
        Ok(annotations)
    }

    pub async fn delete_annotation(&self, annotation_id: &str) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM annotations WHERE id = ?", params![annotation_id])
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("Annotation '{annotation_id}'")));
        }
        info!(annotation_id = %annotation_id, "Deleted annotation.");
        Ok(())
    }
}
