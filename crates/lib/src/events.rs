//! # Real-time Vault Events
//!
//! Every mutation of vault content is announced on a per-vault channel named
//! `vault-{id}`. Delivery is best-effort: publishing never fails the request
//! that caused it.

use crate::{
    errors::EventError,
    types::{Annotation, FileUpload, Source, Vault},
};
use chrono::{DateTime, Utc};
use core_access::Role;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Buffered events per vault before slow subscribers start lagging.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// The payload of a vault event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum VaultEventKind {
    SourceAdded { source: Source },
    SourceDeleted { source_id: String },
    AnnotationAdded { annotation: Annotation },
    AnnotationDeleted { annotation_id: String, source_id: String },
    FileUploaded { file: FileUpload },
    FileDeleted { file_id: String },
    MemberAdded { user_id: String, role: Role },
    MemberRemoved { user_id: String },
    MemberRoleChanged { user_id: String, role: Role },
    VaultUpdated { vault: Vault },
    VaultDeleted,
    CitationGenerated {
        citation: String,
        source_id: Option<String>,
    },
}

impl VaultEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            VaultEventKind::SourceAdded { .. } => "source-added",
            VaultEventKind::SourceDeleted { .. } => "source-deleted",
            VaultEventKind::AnnotationAdded { .. } => "annotation-added",
            VaultEventKind::AnnotationDeleted { .. } => "annotation-deleted",
            VaultEventKind::FileUploaded { .. } => "file-uploaded",
            VaultEventKind::FileDeleted { .. } => "file-deleted",
            VaultEventKind::MemberAdded { .. } => "member-added",
            VaultEventKind::MemberRemoved { .. } => "member-removed",
            VaultEventKind::MemberRoleChanged { .. } => "member-role-changed",
            VaultEventKind::VaultUpdated { .. } => "vault-updated",
            VaultEventKind::VaultDeleted => "vault-deleted",
            VaultEventKind::CitationGenerated { .. } => "citation-generated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultEvent {
    pub vault_id: String,
    /// The user whose action produced the event.
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: VaultEventKind,
}

impl VaultEvent {
    pub fn new(vault_id: impl Into<String>, actor_id: impl Into<String>, kind: VaultEventKind) -> Self {
        Self {
            vault_id: vault_id.into(),
            actor_id: actor_id.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn channel(&self) -> String {
        channel_name(&self.vault_id)
    }
}

pub fn channel_name(vault_id: &str) -> String {
    format!("vault-{vault_id}")
}

/// A sink for vault events.
pub trait EventPublisher: Send + Sync {
    /// Publishes an event, returning how many subscribers received it.
    fn publish(&self, event: VaultEvent) -> Result<usize, EventError>;
}

/// Publishes an event and logs, rather than returns, any failure.
pub fn publish_best_effort(publisher: &dyn EventPublisher, event: VaultEvent) {
    let name = event.kind.name();
    let channel = event.channel();
    match publisher.publish(event) {
        Ok(receivers) => debug!(%channel, event = name, receivers, "Published vault event."),
        Err(e) => warn!(%channel, event = name, "Failed to publish vault event: {e}"),
    }
}

/// An in-process publisher backed by one broadcast channel per vault.
#[derive(Clone, Debug)]
pub struct BroadcastHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<VaultEvent>>>>,
    capacity: usize,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Subscribes to all future events of a vault.
    pub fn subscribe(&self, vault_id: &str) -> Result<broadcast::Receiver<VaultEvent>, EventError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| EventError::Registry(e.to_string()))?;
        let sender = channels
            .entry(channel_name(vault_id))
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.subscribe())
    }

    /// The number of live subscribers on a vault's channel.
    pub fn subscriber_count(&self, vault_id: &str) -> usize {
        self.channels
            .read()
            .ok()
            .and_then(|channels| {
                channels
                    .get(&channel_name(vault_id))
                    .map(|sender| sender.receiver_count())
            })
            .unwrap_or(0)
    }

    /// Drops a vault's channel, ending every subscription to it.
    pub fn close(&self, vault_id: &str) -> Result<(), EventError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| EventError::Registry(e.to_string()))?;
        channels.remove(&channel_name(vault_id));
        Ok(())
    }

    /// Drops every channel. Used on shutdown so open streams can finish.
    pub fn close_all(&self) -> Result<usize, EventError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| EventError::Registry(e.to_string()))?;
        let closed = channels.len();
        channels.clear();
        Ok(closed)
    }
}

impl EventPublisher for BroadcastHub {
    fn publish(&self, event: VaultEvent) -> Result<usize, EventError> {
        let channel = event.channel();
        let mut channels = self
            .channels
            .write()
            .map_err(|e| EventError::Registry(e.to_string()))?;

        let Some(sender) = channels.get(&channel) else {
            return Ok(0);
        };
        match sender.send(event) {
            Ok(receivers) => Ok(receivers),
            Err(_) => {
                // Every subscriber has gone away.
                channels.remove(&channel);
                Ok(0)
            }
        }
    }
}
