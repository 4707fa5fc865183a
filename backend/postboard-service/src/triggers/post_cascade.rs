//! Removes comments, likes and notifications that reference a deleted post.

use super::TriggerOutcome;
use crate::models::{COMMENTS, LIKES, NOTIFICATIONS};
use doc_store::{DocRef, DocumentStore, Query, StoreResult, WriteBatch};
use tracing::debug;

/// Collections scanned, in order, for documents referencing a post.
pub const DEPENDENT_COLLECTIONS: [&str; 3] = [COMMENTS, LIKES, NOTIFICATIONS];

/// Every document whose `postId` is `post_id`, in scan order.
pub async fn collect_dependents(
    store: &dyn DocumentStore,
    post_id: &str,
) -> StoreResult<Vec<DocRef>> {
    let mut pending = Vec::new();
    for collection in DEPENDENT_COLLECTIONS {
        let docs = store
            .query(&Query::collection(collection).where_eq("postId", post_id))
            .await?;
        pending.extend(docs.into_iter().map(|doc| doc.reference));
    }
    Ok(pending)
}

/// Delete all dependents of `post_id` in one batch. Nothing is written unless
/// every query succeeds.
pub async fn cascade_post_delete(
    store: &dyn DocumentStore,
    post_id: &str,
) -> StoreResult<TriggerOutcome> {
    let pending = collect_dependents(store, post_id).await?;
    let writes = pending.len();

    let mut batch = WriteBatch::new();
    for reference in pending {
        batch.delete(reference);
    }

    debug!(%post_id, deletions = writes, "cascading post delete");
    store.commit(batch).await?;
    Ok(TriggerOutcome::Applied { writes })
}
