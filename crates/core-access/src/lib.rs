//! # Core Access Crate
//!
//! This crate is the central authority for identity, authentication (AuthN)
//! and vault authorization (AuthZ) in `syncscript`.
//!
//! - [`policy`] holds the closed `Role` set, the `Action` catalogue and the
//!   authorization table.
//! - [`resolver`] resolves a caller's role in a vault and authorizes actions.
//! - [`membership`] persists memberships and enforces the last-owner guard.
//! - [`users`] registers users and verifies credentials.

pub mod error;
pub mod membership;
pub mod policy;
pub mod resolver;
pub mod timestamps;
pub mod users;

pub use error::{AccessError, CoreAccessError};
pub use membership::{
    add_member, change_member_role, remove_member, Membership, MembershipStore,
    TursoMembershipStore,
};
pub use policy::{evaluate, Action, Role, UnknownRole};
pub use resolver::{authorize, resolve, Grant, Identity};
pub use users::{
    find_user_by_email, find_user_by_id, get_or_create_user, register_user, user_id_for_email,
    verify_credentials, User,
};
