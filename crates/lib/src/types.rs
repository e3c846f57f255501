//! Domain records returned by the repositories.

use chrono::{DateTime, Utc};
use core_access::Role;
use serde::{Deserialize, Serialize};

/// A shared collaboration space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vault {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A vault as listed on a member's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSummary {
    #[serde(flatten)]
    pub vault: Vault,
    /// The requesting user's role in this vault.
    pub role: Role,
    pub member_count: u64,
    pub source_count: u64,
    pub file_count: u64,
}

/// A member together with the user's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberView {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

/// A bibliographic reference within a vault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub vault_id: String,
    pub title: String,
    pub url: String,
    pub citation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user-authored note on a source. The author never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub id: String,
    pub source_id: String,
    /// The vault of the annotated source.
    pub vault_id: String,
    pub author_id: String,
    pub content: String,
    pub page_number: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWithAnnotations {
    #[serde(flatten)]
    pub source: Source,
    pub annotations: Vec<Annotation>,
}

/// A PDF registered in a vault. The bytes live with the CDN.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileUpload {
    pub id: String,
    pub vault_id: String,
    pub uploaded_by: String,
    pub file_name: String,
    pub file_url: String,
    /// The storage provider's identifier, used to delete the object.
    pub public_id: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to register an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileUpload {
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub public_id: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Limits applied when registering uploads.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec!["application/pdf".to_string()],
        }
    }
}

/// The full contents of a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultDetail {
    #[serde(flatten)]
    pub vault: Vault,
    pub members: Vec<MemberView>,
    pub sources: Vec<SourceWithAnnotations>,
    pub file_uploads: Vec<FileUpload>,
}

/// Partial update of a vault's details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultUpdate {
    #[serde(default)]
    pub title: Option<String>,
    /// `Some("")` clears the description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Site-wide totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: u64,
    pub total_vaults: u64,
    pub total_papers: u64,
    pub total_annotations: u64,
}
