use crate::{
    errors::StoreError,
    types::{Annotation, FileUpload, Source, Vault},
};
use chrono::{DateTime, Utc};
use core_access::{timestamps::parse_timestamp, TursoMembershipStore};
use std::fmt::{self, Debug};
use turso::{params, Connection, Database, Row};

mod annotations;
pub mod sql;
mod sources;
mod uploads;

pub use uploads::validate_upload;
mod vaults;

/// A provider for interacting with a local SQLite database using Turso.
///
/// This provider holds a `Database` instance, which manages a connection pool.
/// When cloned, it shares the same underlying database, allowing for concurrent and
/// shared access to the same database file or in-memory instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
    memberships: TursoMembershipStore,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a unique,
    ///   isolated in-memory database. To share an in-memory database across multiple
    ///   `SqliteProvider` instances (e.g., in tests), create one provider and
    ///   then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| StoreError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::StorageConnection(e.to_string()))?;
        // Use `query` for PRAGMA statements that return a value to avoid "unexpected row" errors.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| StoreError::StorageConnection(e.to_string()))?;

        let memberships = TursoMembershipStore::new(db.clone());
        Ok(Self { db, memberships })
    }

    /// Ensures that all required application tables and indexes exist.
    /// This function is idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| StoreError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// The membership store sharing this provider's database and write lock.
    pub fn memberships(&self) -> &TursoMembershipStore {
        &self.memberships
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        self.db
            .connect()
            .map_err(|e| StoreError::StorageConnection(e.to_string()))
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

// --- Row mapping helpers ---

fn timestamp_at(row: &Row, idx: usize) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(StoreError::DataIntegrity)
}

fn vault_from_row(row: &Row) -> Result<Vault, StoreError> {
    Ok(Vault {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

fn source_from_row(row: &Row) -> Result<Source, StoreError> {
    Ok(Source {
        id: row.get(0)?,
        vault_id: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        citation: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
    })
}

fn annotation_from_row(row: &Row) -> Result<Annotation, StoreError> {
    Ok(Annotation {
        id: row.get(0)?,
        source_id: row.get(1)?,
        vault_id: row.get(2)?,
        author_id: row.get(3)?,
        content: row.get(4)?,
        page_number: row.get(5)?,
        created_at: timestamp_at(row, 6)?,
    })
}

fn upload_from_row(row: &Row) -> Result<FileUpload, StoreError> {
    Ok(FileUpload {
        id: row.get(0)?,
        vault_id: row.get(1)?,
        uploaded_by: row.get(2)?,
        file_name: row.get(3)?,
        file_url: row.get(4)?,
        public_id: row.get(5)?,
        content_type: row.get(6)?,
        size_bytes: row.get(7)?,
        created_at: timestamp_at(row, 8)?,
    })
}

/// Runs a `SELECT COUNT(*)` keyed by a single parameter.
async fn count_by_key(conn: &Connection, sql: &str, key: &str) -> Result<u64, StoreError> {
    let mut rows = conn.query(sql, params![key]).await?;
    let count = match rows.next().await? {
        Some(row) => row.get::<i64>(0)?,
        None => 0,
    };
    Ok(count.max(0) as u64)
}

async fn count_all(conn: &Connection, sql: &str) -> Result<u64, StoreError> {
    let mut rows = conn.query(sql, ()).await?;
    let count = match rows.next().await? {
        Some(row) => row.get::<i64>(0)?,
        None => 0,
    };
    Ok(count.max(0) as u64)
}

/// Trims a required text field, rejecting it when empty.
fn required(field: &str, value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StoreError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}
