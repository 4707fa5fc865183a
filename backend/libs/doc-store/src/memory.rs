//! In-process document store.
//!
//! Backs the service in local development and acts as the fake store in tests.

use crate::batch::merge_fields;
use crate::{
    ChangeEvent, ChangeFeed, DocRef, Document, DocumentStore, Fields, Query, StoreError,
    StoreResult, WriteBatch, WriteOp,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(feed_capacity: usize) -> Self {
        Self {
            collections: RwLock::new(Collections::new()),
            feed: ChangeFeed::new(feed_capacity),
        }
    }

    /// Number of documents currently stored in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

fn lookup<'a>(collections: &'a Collections, reference: &DocRef) -> Option<&'a Fields> {
    collections
        .get(&reference.collection)
        .and_then(|docs| docs.get(&reference.id))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, reference: &DocRef) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(lookup(&collections, reference).map(|data| Document::new(reference.clone(), data.clone())))
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|(_, data)| query.matches(data))
            .map(|(id, data)| Document::new(DocRef::new(&query.collection, id), data.clone()))
            .collect();

        // Stable sort keeps id order among equal keys.
        matched.sort_by(|a, b| query.compare(&a.data, &b.data));

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().await;

        // Stage every op against an overlay first so a failing op leaves the
        // store untouched.
        let mut staged: HashMap<DocRef, Option<Fields>> = HashMap::new();
        let mut events = Vec::with_capacity(batch.len());

        for op in batch.ops() {
            let reference = op.reference().clone();
            let before = match staged.get(&reference) {
                Some(state) => state.clone(),
                None => lookup(&collections, &reference).cloned(),
            };

            let after = match op {
                WriteOp::Set { data, .. } => Some(data.clone()),
                WriteOp::Update { fields, .. } => {
                    let mut current = before
                        .clone()
                        .ok_or_else(|| StoreError::NotFound(reference.clone()))?;
                    merge_fields(&mut current, fields);
                    Some(current)
                }
                WriteOp::Delete { .. } => None,
            };

            if let Some(event) =
                ChangeEvent::from_snapshots(reference.clone(), before, after.clone())
            {
                events.push(event);
            }
            staged.insert(reference, after);
        }

        for (reference, state) in staged {
            match state {
                Some(data) => {
                    collections
                        .entry(reference.collection)
                        .or_default()
                        .insert(reference.id, data);
                }
                None => {
                    if let Some(docs) = collections.get_mut(&reference.collection) {
                        docs.remove(&reference.id);
                    }
                }
            }
        }
        drop(collections);

        debug!(ops = batch.len(), events = events.len(), "memory batch committed");
        self.feed.publish(events);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
