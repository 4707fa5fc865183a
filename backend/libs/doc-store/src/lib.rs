//! Document store client
//!
//! A small collection/id keyed document API shared by every Postboard component.
//! Documents are JSON objects; each collection is schemaless.
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`]: process-local maps, used by tests and local development
//! - [`PgDocumentStore`]: a single PostgreSQL `documents` table with JSONB payloads
//!
//! Every committed mutation is published on the store's change feed so that
//! reactive components can subscribe via [`DocumentStore::subscribe`].

mod batch;
mod changes;
mod error;
mod memory;
mod postgres;
mod query;

pub use batch::{WriteBatch, WriteOp};
pub use changes::{ChangeEvent, ChangeFeed, ChangeKind};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use query::{Direction, FieldFilter, OrderBy, Query};

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tokio::sync::broadcast;

/// Field map of a single document.
pub type Fields = serde_json::Map<String, Value>;

/// Length of store-generated document ids.
const GENERATED_ID_LEN: usize = 20;

/// Fully-qualified reference to a document (`collection/id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Path form used in logs and trigger bindings.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub reference: DocRef,
    pub data: Fields,
}

impl Document {
    pub fn new(reference: DocRef, data: Fields) -> Self {
        Self { reference, data }
    }

    pub fn id(&self) -> &str {
        &self.reference.id
    }

    /// String field accessor; `None` when absent or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Deserialize the document body into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| {
            StoreError::InvalidDocument(format!("{}: {}", self.reference, e))
        })
    }
}

/// Serialize a typed model into a document body.
///
/// Fails when the model does not serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Generate a random 20 character alphanumeric document id.
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

/// Document store operations.
///
/// Single-document writes are atomic. A [`WriteBatch`] is applied as one
/// all-or-nothing unit; every applied operation is published as a
/// [`ChangeEvent`] after the commit succeeds.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document. `Ok(None)` when it does not exist.
    async fn get(&self, reference: &DocRef) -> StoreResult<Option<Document>>;

    /// Run an equality query against one collection.
    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// Apply every operation in the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Subscribe to committed changes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;

    /// Connectivity probe used by health checks.
    async fn ping(&self) -> StoreResult<()>;

    /// Create a document with a generated id.
    async fn add(&self, collection: &str, data: Fields) -> StoreResult<DocRef> {
        let reference = DocRef::new(collection, generate_id());
        self.set(&reference, data).await?;
        Ok(reference)
    }

    /// Create or overwrite a document.
    async fn set(&self, reference: &DocRef, data: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(reference.clone(), data);
        self.commit(batch).await
    }

    /// Merge fields into an existing document. Fails with
    /// [`StoreError::NotFound`] when the document does not exist.
    async fn update(&self, reference: &DocRef, fields: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(reference.clone(), fields);
        self.commit(batch).await
    }

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, reference: &DocRef) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(reference.clone());
        self.commit(batch).await
    }
}
