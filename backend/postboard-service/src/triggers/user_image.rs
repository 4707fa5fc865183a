//! Copies a user's new image URL onto every post they authored.

use super::TriggerOutcome;
use crate::models::POSTS;
use doc_store::{DocumentStore, Fields, Query, StoreResult, WriteBatch};
use serde_json::Value;
use tracing::debug;

/// Runs only when `imageUrl` differs between the snapshots. Every matching
/// post is updated in one batch.
pub async fn propagate_user_image(
    store: &dyn DocumentStore,
    before: &Fields,
    after: &Fields,
) -> StoreResult<TriggerOutcome> {
    if before.get("imageUrl") == after.get("imageUrl") {
        return Ok(TriggerOutcome::Skipped("image unchanged"));
    }

    let Some(image_url) = after.get("imageUrl").and_then(Value::as_str) else {
        return Ok(TriggerOutcome::Skipped("image removed"));
    };
    // Posts carry the handle as it was before this change.
    let Some(handle) = before
        .get("handle")
        .or_else(|| after.get("handle"))
        .and_then(Value::as_str)
    else {
        return Ok(TriggerOutcome::Skipped("user has no handle"));
    };

    let posts = store
        .query(&Query::collection(POSTS).where_eq("userHandle", handle))
        .await?;

    let mut batch = WriteBatch::new();
    for post in &posts {
        let mut patch = Fields::new();
        patch.insert("userImage".to_string(), Value::from(image_url));
        batch.update(post.reference.clone(), patch);
    }

    let writes = batch.len();
    debug!(%handle, posts = writes, "propagating user image");
    store.commit(batch).await?;
    Ok(TriggerOutcome::Applied { writes })
}
