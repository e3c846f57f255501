//! # Users & Credentials
//!
//! Users are created either by registering with a password or on their first
//! identity-provider sign-in. Identity-provider accounts carry no credential
//! hash and cannot log in with a password.

use crate::{
    error::CoreAccessError,
    timestamps::{now_timestamp, parse_timestamp},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turso::{Connection, Database, Row, params};
use uuid::Uuid;

/// Represents a user in the system.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// The unique, deterministic ID of the user (UUIDv5 of the normalised email).
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string; absent for identity-provider-only accounts.
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// The timestamp when the user was first created.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for User {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> std::result::Result<Self, Self::Error> {
        let created_at_str: String = row.get(4)?;
        let created_at = parse_timestamp(&created_at_str).map_err(CoreAccessError::DataIntegrity)?;

        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at,
        })
    }
}

const SELECT_USER_BY_EMAIL: &str =
    "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The deterministic user id for an email address.
pub fn user_id_for_email(email: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, normalize_email(email).as_bytes()).to_string()
}

async fn select_one(
    conn: &Connection,
    sql: &str,
    key: &str,
) -> Result<Option<User>, CoreAccessError> {
    let mut rows = conn.query(sql, params![key]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(User::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Looks a user up by email.
pub async fn find_user_by_email(db: &Database, email: &str) -> Result<Option<User>, CoreAccessError> {
    let conn = db.connect()?;
    select_one(&conn, SELECT_USER_BY_EMAIL, &normalize_email(email)).await
}

/// Looks a user up by id.
pub async fn find_user_by_id(db: &Database, user_id: &str) -> Result<Option<User>, CoreAccessError> {
    let conn = db.connect()?;
    select_one(
        &conn,
        "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
        user_id,
    )
    .await
}

/// Inserts a user unless the email is already taken.
///
/// Returns `None` when a row with the same email or id already exists, even
/// one committed after the caller's own lookup.
async fn insert_user(
    conn: &Connection,
    email: &str,
    name: &str,
    password_hash: Option<String>,
) -> Result<Option<User>, CoreAccessError> {
    let user_id = user_id_for_email(email);
    let inserted = conn
        .execute(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT DO NOTHING",
            params![
                user_id.clone(),
                name,
                email,
                password_hash.as_deref(),
                now_timestamp()
            ],
        )
        .await?;
    if inserted == 0 {
        return Ok(None);
    }

    select_one(conn, SELECT_USER_BY_EMAIL, email)
        .await?
        .map(Some)
        .ok_or_else(|| CoreAccessError::UserPersistenceFailed(email.to_string()))
}

/// Registers a new password-based account.
pub async fn register_user(
    db: &Database,
    email: &str,
    name: &str,
    password: &str,
) -> Result<User, CoreAccessError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(CoreAccessError::InvalidInput("a valid email is required".to_string()));
    }
    if name.trim().is_empty() {
        return Err(CoreAccessError::InvalidInput("name is required".to_string()));
    }
    if password.len() < 8 {
        return Err(CoreAccessError::InvalidInput(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let conn = db.connect()?;
    if select_one(&conn, SELECT_USER_BY_EMAIL, &email).await?.is_some() {
        return Err(CoreAccessError::EmailTaken(email));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreAccessError::PasswordHash(e.to_string()))?
        .to_string();

    let Some(user) = insert_user(&conn, &email, name.trim(), Some(hash)).await? else {
        return Err(CoreAccessError::EmailTaken(email));
    };
    info!(user_id = %user.id, "Registered new user.");
    Ok(user)
}

/// Finds a user by email, creating them on first identity-provider sign-in.
///
/// This is idempotent: the id is derived from the email, and an existing
/// account is returned untouched.
pub async fn get_or_create_user(
    db: &Database,
    email: &str,
    name: Option<&str>,
) -> Result<User, CoreAccessError> {
    let email = normalize_email(email);
    let conn = db.connect()?;

    if let Some(user) = select_one(&conn, SELECT_USER_BY_EMAIL, &email).await? {
        return Ok(user);
    }

    // Fall back to the local part of the address as a display name.
    let display_name = match name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => email.split('@').next().unwrap_or_default().to_string(),
    };

    match insert_user(&conn, &email, &display_name, None).await? {
        Some(user) => {
            info!(user_id = %user.id, "Created user from identity provider sign-in.");
            Ok(user)
        }
        // A concurrent sign-in created the account first.
        None => select_one(&conn, SELECT_USER_BY_EMAIL, &email)
            .await?
            .ok_or_else(|| CoreAccessError::UserPersistenceFailed(email.clone())),
    }
}

/// Checks an email/password pair.
///
/// Unknown emails, identity-provider-only accounts and wrong passwords all
/// yield `InvalidCredentials`.
pub async fn verify_credentials(
    db: &Database,
    email: &str,
    password: &str,
) -> Result<User, CoreAccessError> {
    let Some(user) = find_user_by_email(db, email).await? else {
        return Err(CoreAccessError::InvalidCredentials);
    };
    let Some(stored) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "Password login attempted on an identity-provider account.");
        return Err(CoreAccessError::InvalidCredentials);
    };

    let parsed = PasswordHash::new(stored)
        .map_err(|e| CoreAccessError::DataIntegrity(format!("Corrupt password hash: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| CoreAccessError::InvalidCredentials)?;

    Ok(user)
}
