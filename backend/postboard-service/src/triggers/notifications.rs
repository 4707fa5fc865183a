//! Like/comment notification fan-out and like-removal cleanup.

use super::TriggerOutcome;
use crate::models::{now_timestamp, Notification, NotificationType, NOTIFICATIONS, POSTS};
use doc_store::{to_fields, DocRef, Document, DocumentStore, StoreResult};
use serde::Deserialize;
use tracing::debug;

/// Fields shared by likes and comments that a notification needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Interaction {
    post_id: String,
    user_handle: String,
}

/// Notify the post author about a new like. The notification id mirrors the like id.
pub async fn notify_on_like(store: &dyn DocumentStore, like: &Document) -> StoreResult<TriggerOutcome> {
    notify(store, like, NotificationType::Like).await
}

/// Notify the post author about a new comment.
pub async fn notify_on_comment(
    store: &dyn DocumentStore,
    comment: &Document,
) -> StoreResult<TriggerOutcome> {
    notify(store, comment, NotificationType::Comment).await
}

async fn notify(
    store: &dyn DocumentStore,
    source: &Document,
    kind: NotificationType,
) -> StoreResult<TriggerOutcome> {
    let interaction: Interaction = source.decode()?;

    let Some(post) = store.get(&DocRef::new(POSTS, &interaction.post_id)).await? else {
        debug!(post_id = %interaction.post_id, source = %source.reference, "post missing, no notification");
        return Ok(TriggerOutcome::Skipped("post not found"));
    };

    let Some(author) = post.get_str("userHandle") else {
        return Ok(TriggerOutcome::Skipped("post has no author"));
    };

    if author == interaction.user_handle {
        return Ok(TriggerOutcome::Skipped("self interaction"));
    }

    let notification = Notification {
        recipient: author.to_string(),
        sender: interaction.user_handle,
        post_id: interaction.post_id,
        kind,
        read: false,
        created_at: now_timestamp(),
    };

    store
        .set(&DocRef::new(NOTIFICATIONS, source.id()), to_fields(&notification)?)
        .await?;
    Ok(TriggerOutcome::Applied { writes: 1 })
}

/// Remove the notification created for a like that no longer exists.
/// A notification that was never created is not an error.
pub async fn remove_like_notification(
    store: &dyn DocumentStore,
    like: &DocRef,
) -> StoreResult<TriggerOutcome> {
    let notification = DocRef::new(NOTIFICATIONS, &like.id);
    if store.get(&notification).await?.is_none() {
        return Ok(TriggerOutcome::Skipped("no notification"));
    }

    store.delete(&notification).await?;
    Ok(TriggerOutcome::Applied { writes: 1 })
}
