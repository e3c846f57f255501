//! # Vault Event Stream
//!
//! Streams a vault's events to a member as server-sent events. The stream
//! ends after the vault is deleted or the subscriber is removed from it.

use super::{authorize_caller, AppError, AppState};
use crate::auth::middleware::CallerIdentity;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use core_access::Action;
use futures::stream::{self, Stream};
use syncscript::{VaultEvent, VaultEventKind};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Whether `event` is the last one `subscriber` should receive.
fn ends_subscription(event: &VaultEvent, subscriber: &str) -> bool {
    match &event.kind {
        VaultEventKind::VaultDeleted => true,
        VaultEventKind::MemberRemoved { user_id } => user_id == subscriber,
        _ => false,
    }
}

pub async fn vault_events_handler(
    State(app_state): State<AppState>,
    caller: CallerIdentity,
    Path(vault_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let grant = authorize_caller(&app_state, &caller, &vault_id, Action::ViewVault).await?;
    let receiver = app_state
        .events
        .subscribe(&vault_id)
        .map_err(|e| AppError::Internal(e.into()))?;
    info!(vault_id = %vault_id, user_id = %grant.user_id, "Subscribed to vault events.");

    let subscriber = grant.user_id;
    let events = stream::unfold(
        (receiver, subscriber, false),
        |(mut receiver, subscriber, finished)| async move {
            if finished {
                return None;
            }
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let last = ends_subscription(&event, &subscriber);
                        let sse = Event::default().event(event.kind.name()).json_data(&event);
                        return Some((sse, (receiver, subscriber, last)));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event subscriber lagged behind; events were dropped.");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
