//! PostgreSQL-backed document store.
//!
//! All collections share one `documents` table keyed by `(collection, id)` with a
//! JSONB body. Equality filters use JSONB containment so the GIN index applies.
//! Change events are published to in-process subscribers after each commit.

use crate::batch::merge_fields;
use crate::{
    ChangeEvent, ChangeFeed, DocRef, Document, DocumentStore, Fields, Query, StoreError,
    StoreResult, WriteBatch, WriteOp,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, feed_capacity: usize) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(feed_capacity),
        }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Document store migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_current(
        tx: &mut Transaction<'_, Postgres>,
        reference: &DocRef,
    ) -> StoreResult<Option<Fields>> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(&reference.collection)
        .bind(&reference.id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|row| into_fields(reference, row.try_get::<Value, _>("data")?))
            .transpose()
    }

    async fn upsert(
        tx: &mut Transaction<'_, Postgres>,
        reference: &DocRef,
        data: &Fields,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE
            SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(&reference.collection)
        .bind(&reference.id)
        .bind(Value::Object(data.clone()))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

fn into_fields(reference: &DocRef, value: Value) -> StoreResult<Fields> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "{} holds a non-object body: {}",
            reference, other
        ))),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, reference: &DocRef) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(&reference.collection)
        .bind(&reference.id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let data = into_fields(reference, row.try_get::<Value, _>("data")?)?;
                Ok(Some(Document::new(reference.clone(), data)))
            }
            None => Ok(None),
        }
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        // Only the direction keyword is interpolated; field names and values are bound.
        let mut sql = String::from(
            "SELECT id, data FROM documents WHERE collection = $1 AND data @> $2",
        );
        if let Some(order) = &query.order {
            sql.push_str(&format!(
                " ORDER BY data -> $3 {}, id ASC",
                order.direction.as_sql()
            ));
        } else {
            sql.push_str(" ORDER BY id ASC");
        }
        if query.limit.is_some() {
            sql.push_str(if query.order.is_some() {
                " LIMIT $4"
            } else {
                " LIMIT $3"
            });
        }

        let mut q = sqlx::query(&sql)
            .bind(&query.collection)
            .bind(query.containment());
        if let Some(order) = &query.order {
            q = q.bind(&order.field);
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit as i64);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| -> StoreResult<Document> {
                let id: String = row.try_get("id")?;
                let reference = DocRef::new(&query.collection, id);
                let data = into_fields(&reference, row.try_get::<Value, _>("data")?)?;
                Ok(Document::new(reference, data))
            })
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let mut events = Vec::with_capacity(batch.len());

        for op in batch.ops() {
            let reference = op.reference();
            let before = Self::lock_current(&mut tx, reference).await?;

            let after = match op {
                WriteOp::Set { data, .. } => {
                    Self::upsert(&mut tx, reference, data).await?;
                    Some(data.clone())
                }
                WriteOp::Update { fields, .. } => {
                    // Dropping the transaction on this early return rolls back.
                    let mut current = before
                        .clone()
                        .ok_or_else(|| StoreError::NotFound(reference.clone()))?;
                    merge_fields(&mut current, fields);
                    Self::upsert(&mut tx, reference, &current).await?;
                    Some(current)
                }
                WriteOp::Delete { .. } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(&reference.collection)
                        .bind(&reference.id)
                        .execute(&mut *tx)
                        .await?;
                    None
                }
            };

            if let Some(event) = ChangeEvent::from_snapshots(reference.clone(), before, after) {
                events.push(event);
            }
        }

        tx.commit().await?;
        debug!(ops = batch.len(), events = events.len(), "postgres batch committed");
        self.feed.publish(events);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
