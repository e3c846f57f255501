//! Registration of uploaded PDFs. The bytes themselves live with the
//! storage provider; only metadata is kept here.

use super::{required, sql, upload_from_row, SqliteProvider};
use crate::{
    errors::StoreError,
    types::{FileUpload, NewFileUpload, UploadPolicy},
};
use core_access::timestamps::{now_timestamp, parse_timestamp};
use tracing::{info, warn};
use turso::params;
use uuid::Uuid;

/// Checks an upload against the configured limits.
pub fn validate_upload(upload: &NewFileUpload, policy: &UploadPolicy) -> Result<(), StoreError> {
    required("file_name", &upload.file_name)?;
    let url = upload.file_url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(StoreError::Validation(
            "file_url must be an http(s) URL".to_string(),
        ));
    }
    if !policy
        .allowed_content_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(upload.content_type.trim()))
    {
        return Err(StoreError::Validation(format!(
            "Content type '{}' is not allowed. Only PDF files are allowed",
            upload.content_type
        )));
    }
    if upload.size_bytes < 0 {
        return Err(StoreError::Validation(
            "size_bytes cannot be negative".to_string(),
        ));
    }
    if upload.size_bytes as u64 > policy.max_bytes {
        return Err(StoreError::Validation(format!(
            "File size must be less than {} bytes",
            policy.max_bytes
        )));
    }
    Ok(())
}

impl SqliteProvider {
    pub async fn record_upload(
        &self,
        vault_id: &str,
        uploaded_by: &str,
        upload: NewFileUpload,
        policy: &UploadPolicy,
    ) -> Result<FileUpload, StoreError> {
        if let Err(e) = validate_upload(&upload, policy) {
            warn!(vault_id = %vault_id, file = %upload.file_name, "Rejected upload: {e}");
            return Err(e);
        }
        let id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();
        let file_name = upload.file_name.trim().to_string();
        let file_url = upload.file_url.trim().to_string();
        let content_type = upload.content_type.trim().to_ascii_lowercase();

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
            "INSERT INTO file_uploads (id, vault_id, uploaded_by, file_name, file_url, public_id, content_type, size_bytes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id.clone(),
                vault_id,
                uploaded_by,
                file_name.clone(),
                file_url.clone(),
                upload.public_id.clone(),
                content_type.clone(),
                upload.size_bytes,
                created_at.clone()
            ],
        )
        .await?;
        tx.commit().await?;

        info!(upload_id = %id, vault_id = %vault_id, size = upload.size_bytes, "Recorded file upload.");
        Ok(FileUpload {
            id,
            vault_id: vault_id.to_string(),
            uploaded_by: uploaded_by.to_string(),
            file_name,
            file_url,
            public_id: upload.public_id,
            content_type,
            size_bytes: upload.size_bytes,
            created_at: parse_timestamp(&created_at).map_err(StoreError::DataIntegrity)?,
        })
    }

    pub async fn get_upload(&self, upload_id: &str) -> Result<Option<FileUpload>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn.query(sql::SELECT_UPLOAD, params![upload_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(upload_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Uploads of a vault, newest first.
    pub async fn list_uploads(&self, vault_id: &str) -> Result<Vec<FileUpload>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_UPLOADS_BY_VAULT, params![vault_id])
            .await?;
        let mut uploads = Vec::new();
        while let Some(row) = rows.next().await? {
            uploads.push(upload_from_row(&row)?);
        }
        Ok(uploads)
    }

    pub async fn delete_upload(&self, upload_id: &str) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM file_uploads WHERE id = ?", params![upload_id])
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("Upload '{upload_id}'")));
        }
        info!(upload_id = %upload_id, "Deleted file upload record.");
        Ok(())
    }
}
