#![allow(dead_code)]

use async_trait::async_trait;
use crypto_core::jwt::JwtCodec;
use doc_store::{
    ChangeEvent, DocRef, Document, DocumentStore, Fields, MemoryStore, Query, StoreError,
    StoreResult, WriteBatch,
};
use postboard_service::config::MediaConfig;
use postboard_service::services::MediaStorage;
use postboard_service::triggers::{dispatch, Dispatch};
use postboard_service::{AppContext, SharedStore};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::broadcast;

// Test RSA key pair - FOR TESTING ONLY
pub const TEST_PRIVATE_KEY: &str =
    include_str!("../../../libs/crypto-core/tests/fixtures/test_private_key.pem");
pub const TEST_PUBLIC_KEY: &str =
    include_str!("../../../libs/crypto-core/tests/fixtures/test_public_key.pem");

pub const DEFAULT_IMAGE: &str = "http://media.test/no-img.png";

pub fn jwt() -> JwtCodec {
    JwtCodec::from_rsa_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).expect("test keys parse")
}

pub fn token_for(handle: &str) -> String {
    jwt()
        .issue_access_token(&format!("{handle}-id"), handle)
        .expect("issue token")
}

pub fn bearer(handle: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(handle)))
}

pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().expect("object literal")
}

/// App context over `store` with media written to a fresh temp dir.
pub fn context(store: SharedStore) -> (AppContext, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let media = MediaStorage::new(&MediaConfig {
        dir: dir.path().to_path_buf(),
        base_url: "http://media.test".to_string(),
        default_image_url: DEFAULT_IMAGE.to_string(),
    });
    (AppContext::new(store, jwt(), media), dir)
}

// ---------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------

pub async fn seed_user(store: &dyn DocumentStore, handle: &str, image_url: &str) {
    store
        .set(
            &DocRef::new("users", handle),
            fields(json!({
                "userId": format!("{handle}-id"),
                "handle": handle,
                "email": format!("{handle}@example.com"),
                "imageUrl": image_url,
                "createdAt": "2024-01-01T00:00:00.000Z",
            })),
        )
        .await
        .expect("seed user");
}

pub async fn seed_post(store: &dyn DocumentStore, id: &str, author: &str, created_at: &str) {
    store
        .set(
            &DocRef::new("posts", id),
            fields(json!({
                "userHandle": author,
                "userImage": format!("http://media.test/{author}.png"),
                "body": format!("post {id}"),
                "createdAt": created_at,
                "likeCount": 0,
                "commentCount": 0,
            })),
        )
        .await
        .expect("seed post");
}

pub async fn seed_like(store: &dyn DocumentStore, id: &str, post_id: &str, handle: &str) {
    store
        .set(
            &DocRef::new("likes", id),
            fields(json!({"postId": post_id, "userHandle": handle})),
        )
        .await
        .expect("seed like");
}

pub async fn seed_comment(store: &dyn DocumentStore, id: &str, post_id: &str, handle: &str) {
    store
        .set(
            &DocRef::new("comments", id),
            fields(json!({
                "postId": post_id,
                "userHandle": handle,
                "userImage": format!("http://media.test/{handle}.png"),
                "body": "nice",
                "createdAt": "2024-01-02T00:00:00.000Z",
            })),
        )
        .await
        .expect("seed comment");
}

pub async fn seed_notification(
    store: &dyn DocumentStore,
    id: &str,
    post_id: &str,
    recipient: &str,
    sender: &str,
) {
    store
        .set(
            &DocRef::new("notifications", id),
            fields(json!({
                "recipient": recipient,
                "sender": sender,
                "postId": post_id,
                "type": "like",
                "read": false,
                "createdAt": "2024-01-03T00:00:00.000Z",
            })),
        )
        .await
        .expect("seed notification");
}

pub async fn get_doc(store: &dyn DocumentStore, collection: &str, id: &str) -> Option<Document> {
    store
        .get(&DocRef::new(collection, id))
        .await
        .expect("store get")
}

pub async fn ids_where(
    store: &dyn DocumentStore,
    collection: &str,
    field: &str,
    value: &str,
) -> Vec<String> {
    store
        .query(&Query::collection(collection).where_eq(field, value))
        .await
        .expect("store query")
        .into_iter()
        .map(|doc| doc.reference.id)
        .collect()
}

/// Dispatch every pending change event, including those produced by the
/// triggers themselves, until the feed is empty.
pub async fn drain_triggers(
    store: &dyn DocumentStore,
    changes: &mut broadcast::Receiver<ChangeEvent>,
) -> Vec<Dispatch> {
    let mut dispatched = Vec::new();
    while let Ok(event) = changes.try_recv() {
        match dispatch(store, &event).await {
            Dispatch::Unbound => {}
            other => dispatched.push(other),
        }
    }
    dispatched
}

// ---------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------

/// In-memory store whose queries on chosen collections, or commits, fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing_queries: Mutex<HashSet<String>>,
    fail_commits: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_queries_on(&self, collection: &str) {
        self.failing_queries
            .lock()
            .expect("lock")
            .insert(collection.to_string());
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, reference: &DocRef) -> StoreResult<Option<Document>> {
        self.inner.get(reference).await
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let failing = self
            .failing_queries
            .lock()
            .expect("lock")
            .contains(&query.collection);
        if failing {
            return Err(StoreError::Unavailable(format!(
                "injected query failure on {}",
                query.collection
            )));
        }
        self.inner.query(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }
        self.inner.commit(batch).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.subscribe()
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected ping failure".into()));
        }
        self.inner.ping().await
    }
}

pub fn shared(store: impl DocumentStore + 'static) -> SharedStore {
    Arc::new(store)
}
