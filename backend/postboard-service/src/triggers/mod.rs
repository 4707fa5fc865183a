//! Reactive triggers bound to document store change events.
//!
//! | Collection      | Change  | Trigger                     |
//! |-----------------|---------|-----------------------------|
//! | `likes`         | created | [`Trigger::LikeNotification`] |
//! | `likes`         | deleted | [`Trigger::LikeNotificationCleanup`] |
//! | `comments`      | created | [`Trigger::CommentNotification`] |
//! | `users`         | updated | [`Trigger::UserImagePropagation`] |
//! | `posts`         | deleted | [`Trigger::PostCascadeDelete`] |
//!
//! Trigger failures are logged and counted, never retried and never
//! propagated to the writer that caused the event.

pub mod notifications;
pub mod post_cascade;
pub mod user_image;

use crate::metrics;
use crate::models::{COMMENTS, LIKES, POSTS, USERS};
use crate::SharedStore;
use doc_store::{ChangeEvent, ChangeKind, Document, DocumentStore, StoreError, StoreResult};
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    LikeNotification,
    LikeNotificationCleanup,
    CommentNotification,
    UserImagePropagation,
    PostCascadeDelete,
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::LikeNotification => "like_notification",
            Trigger::LikeNotificationCleanup => "like_notification_cleanup",
            Trigger::CommentNotification => "comment_notification",
            Trigger::UserImagePropagation => "user_image_propagation",
            Trigger::PostCascadeDelete => "post_cascade_delete",
        }
    }

    /// The trigger bound to this event, if any.
    pub fn for_event(event: &ChangeEvent) -> Option<Trigger> {
        match (event.reference.collection.as_str(), event.kind) {
            (LIKES, ChangeKind::Created) => Some(Trigger::LikeNotification),
            (LIKES, ChangeKind::Deleted) => Some(Trigger::LikeNotificationCleanup),
            (COMMENTS, ChangeKind::Created) => Some(Trigger::CommentNotification),
            (USERS, ChangeKind::Updated) => Some(Trigger::UserImagePropagation),
            (POSTS, ChangeKind::Deleted) => Some(Trigger::PostCascadeDelete),
            _ => None,
        }
    }

    pub async fn run(
        self,
        store: &dyn DocumentStore,
        event: &ChangeEvent,
    ) -> StoreResult<TriggerOutcome> {
        match self {
            Trigger::LikeNotification => {
                notifications::notify_on_like(store, &created_document(event)?).await
            }
            Trigger::CommentNotification => {
                notifications::notify_on_comment(store, &created_document(event)?).await
            }
            Trigger::LikeNotificationCleanup => {
                notifications::remove_like_notification(store, &event.reference).await
            }
            Trigger::UserImagePropagation => {
                let (Some(before), Some(after)) = (&event.before, &event.after) else {
                    return Err(missing_snapshot(event));
                };
                user_image::propagate_user_image(store, before, after).await
            }
            Trigger::PostCascadeDelete => {
                post_cascade::cascade_post_delete(store, &event.reference.id).await
            }
        }
    }
}

fn created_document(event: &ChangeEvent) -> StoreResult<Document> {
    event
        .after
        .clone()
        .map(|data| Document::new(event.reference.clone(), data))
        .ok_or_else(|| missing_snapshot(event))
}

fn missing_snapshot(event: &ChangeEvent) -> StoreError {
    StoreError::InvalidDocument(format!(
        "{} {} event is missing a snapshot",
        event.reference,
        event.kind.as_str()
    ))
}

/// What a successful trigger invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Writes were committed (an empty batch counts as zero writes).
    Applied { writes: usize },
    /// Preconditions not met; nothing written.
    Skipped(&'static str),
}

impl TriggerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerOutcome::Applied { .. } => "applied",
            TriggerOutcome::Skipped(_) => "skipped",
        }
    }
}

/// Result of routing one change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No trigger is bound to the event.
    Unbound,
    Completed(Trigger, TriggerOutcome),
    /// The trigger failed; the error has been logged and dropped.
    Failed(Trigger),
}

/// Run the trigger bound to `event`, logging and counting the outcome.
pub async fn dispatch(store: &dyn DocumentStore, event: &ChangeEvent) -> Dispatch {
    let Some(trigger) = Trigger::for_event(event) else {
        return Dispatch::Unbound;
    };

    let started = Instant::now();
    let result = trigger.run(store, event).await;
    let elapsed = started.elapsed();

    match result {
        Ok(outcome) => {
            metrics::record_trigger(trigger.name(), outcome.as_str(), elapsed);
            match outcome {
                TriggerOutcome::Applied { writes } => debug!(
                    trigger = trigger.name(),
                    document = %event.reference,
                    writes,
                    "trigger applied"
                ),
                TriggerOutcome::Skipped(reason) => debug!(
                    trigger = trigger.name(),
                    document = %event.reference,
                    reason,
                    "trigger skipped"
                ),
            }
            Dispatch::Completed(trigger, outcome)
        }
        Err(err) => {
            metrics::record_trigger(trigger.name(), "failed", elapsed);
            error!(
                trigger = trigger.name(),
                document = %event.reference,
                error = %err,
                "trigger failed"
            );
            Dispatch::Failed(trigger)
        }
    }
}

/// Consumes the store's change feed and runs each bound trigger on its own task.
pub struct TriggerRuntime {
    store: SharedStore,
    changes: broadcast::Receiver<ChangeEvent>,
}

impl TriggerRuntime {
    /// Subscribes immediately, so changes committed after this call are seen.
    pub fn new(store: SharedStore) -> Self {
        let changes = store.subscribe();
        Self { store, changes }
    }

    /// Process one event inline.
    pub async fn handle(&self, event: &ChangeEvent) -> Dispatch {
        dispatch(self.store.as_ref(), event).await
    }

    /// Run until the change feed closes or `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!("Trigger runtime started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Trigger runtime received shutdown");
                    break;
                }
                received = self.changes.recv() => match received {
                    Ok(event) => {
                        if Trigger::for_event(&event).is_none() {
                            continue;
                        }
                        let store = self.store.clone();
                        tokio::spawn(async move {
                            dispatch(store.as_ref(), &event).await;
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Trigger runtime lagged behind the change feed");
                        metrics::record_lagged_events(skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("Change feed closed");
                        break;
                    }
                },
            }
        }

        info!("Trigger runtime stopped");
    }
}
