use crate::policy::Role;
use thiserror::Error;
use turso::Error as TursoError;

/// The outcome of a denied or failed authorization or membership operation.
///
/// The first four variants are expected denials; callers report them to the
/// end user and never retry. They must stay distinguishable all the way to
/// the transport layer.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Authentication required.")]
    Unauthenticated,
    #[error("You do not have access to this vault.")]
    NotAMember,
    #[error("{reason}")]
    Forbidden { required: Role, reason: String },
    #[error("Cannot remove or demote the last owner of the vault.")]
    LastOwnerProtected,
    #[error("User is already a member of this vault.")]
    AlreadyMember,
    #[error("User is not a member of this vault.")]
    MemberNotFound,
    #[error("Vault not found.")]
    VaultNotFound,
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
}

impl AccessError {
    /// Returns `true` for the expected denial outcomes (as opposed to
    /// infrastructure failures).
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AccessError::Unauthenticated
                | AccessError::NotAMember
                | AccessError::Forbidden { .. }
                | AccessError::LastOwnerProtected
        )
    }

    /// A stable, upper-case code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "UNAUTHENTICATED",
            AccessError::NotAMember => "NOT_A_MEMBER",
            AccessError::Forbidden { .. } => "FORBIDDEN",
            AccessError::LastOwnerProtected => "LAST_OWNER_PROTECTED",
            AccessError::AlreadyMember => "ALREADY_MEMBER",
            AccessError::MemberNotFound => "MEMBER_NOT_FOUND",
            AccessError::VaultNotFound => "NOT_FOUND",
            AccessError::DataIntegrity(_) | AccessError::Database(_) => "INTERNAL",
        }
    }
}

/// Errors raised by user persistence and credential checks.
#[derive(Error, Debug)]
pub enum CoreAccessError {
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
    #[error("Failed to create or find user for identifier: {0}")]
    UserPersistenceFailed(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("A user with email '{0}' already exists.")]
    EmailTaken(String),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Invalid registration: {0}")]
    InvalidInput(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}
