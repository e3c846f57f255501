//! # SyncScript Vault Library
//!
//! The domain layer of SyncScript: persistent storage for vaults, their
//! sources, annotations and uploaded papers; real-time event fan-out; and
//! AI-assisted APA citation generation.
//!
//! Access decisions live in the `core-access` crate and are re-exported here
//! so that callers only need one dependency.

pub mod citation;
pub mod errors;
pub mod events;
pub mod metadata;
pub mod providers;
pub mod types;

pub use citation::{
    generate_citation, generate_fallback_citation, CitationOrigin, CitationRequest,
    GeneratedCitation,
};
pub use errors::{CitationError, EventError, StoreError};
pub use events::{publish_best_effort, BroadcastHub, EventPublisher, VaultEvent, VaultEventKind};
pub use metadata::{extract_metadata, PaperMetadata};
pub use providers::db::sqlite::SqliteProvider;
pub use types::*;

pub use core_access::{
    authorize, resolve, AccessError, Action, Grant, Identity, MembershipStore, Role,
};
