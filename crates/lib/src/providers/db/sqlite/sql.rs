//! # SQLite Schema and Shared Queries
//!
//! This module centralizes SQL strings for the SQLite provider so the
//! repository code stays free of schema details.

/// Idempotent schema creation, executed in order on every startup.
///
/// Timestamps are RFC 3339 text written by the application. Cascades are
/// performed explicitly by the repositories inside a transaction.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS vaults (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS vault_members (
        vault_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (vault_id, user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_vault_members_user ON vault_members (user_id)",
    "CREATE TABLE IF NOT EXISTS sources (
        id TEXT PRIMARY KEY,
        vault_id TEXT NOT NULL,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        citation TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sources_vault ON sources (vault_id)",
    "CREATE TABLE IF NOT EXISTS annotations (
        id TEXT PRIMARY KEY,
        source_id TEXT NOT NULL,
        author_id TEXT NOT NULL,
        content TEXT NOT NULL,
        page_number INTEGER,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_annotations_source ON annotations (source_id)",
    "CREATE TABLE IF NOT EXISTS file_uploads (
        id TEXT PRIMARY KEY,
        vault_id TEXT NOT NULL,
        uploaded_by TEXT NOT NULL,
        file_name TEXT NOT NULL,
        file_url TEXT NOT NULL,
        public_id TEXT,
        content_type TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_file_uploads_vault ON file_uploads (vault_id)",
];

pub const VAULT_EXISTS: &str = "SELECT 1 FROM vaults WHERE id = ?";

pub const SOURCE_VAULT_ID: &str = "SELECT vault_id FROM sources WHERE id = ?";

pub const SELECT_VAULT: &str =
    "SELECT id, title, description, created_at FROM vaults WHERE id = ?";

pub const SELECT_SOURCE: &str =
    "SELECT id, vault_id, title, url, citation, created_at FROM sources WHERE id = ?";

pub const SELECT_SOURCES_BY_VAULT: &str =
    "SELECT id, vault_id, title, url, citation, created_at FROM sources WHERE vault_id = ? ORDER BY created_at DESC";

pub const SELECT_ANNOTATION: &str = "
    SELECT a.id, a.source_id, s.vault_id, a.author_id, a.content, a.page_number, a.created_at
    FROM annotations a JOIN sources s ON s.id = a.source_id
    WHERE a.id = ?";

pub const SELECT_ANNOTATIONS_BY_SOURCE: &str = "
    SELECT a.id, a.source_id, s.vault_id, a.author_id, a.content, a.page_number, a.created_at
    FROM annotations a JOIN sources s ON s.id = a.source_id
    WHERE a.source_id = ?
    ORDER BY a.created_at DESC";

pub const SELECT_UPLOAD: &str = "
    SELECT id, vault_id, uploaded_by, file_name, file_url, public_id, content_type, size_bytes, created_at
    FROM file_uploads WHERE id = ?";

pub const SELECT_UPLOADS_BY_VAULT: &str = "
    SELECT id, vault_id, uploaded_by, file_name, file_url, public_id, content_type, size_bytes, created_at
    FROM file_uploads WHERE vault_id = ? ORDER BY created_at DESC";

pub const SELECT_MEMBERS_WITH_USERS: &str = "
    SELECT m.user_id, u.name, u.email, m.role, m.created_at
    FROM vault_members m JOIN users u ON u.id = m.user_id
    WHERE m.vault_id = ?
    ORDER BY m.created_at ASC";

pub const SELECT_VAULTS_FOR_USER: &str = "
    SELECT v.id, v.title, v.description, v.created_at, m.role
    FROM vaults v JOIN vault_members m ON m.vault_id = v.id
    WHERE m.user_id = ?
    ORDER BY v.created_at DESC";
