/// Notification service
use crate::error::{AppError, Result};
use crate::middleware::{check_notification_recipient, AuthContext};
use crate::models::{Notification, NOTIFICATIONS};
use crate::SharedStore;
use doc_store::{DocRef, Fields, WriteBatch};
use serde_json::Value;
use std::collections::BTreeSet;

pub struct NotificationService {
    store: SharedStore,
}

impl NotificationService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Mark the caller's notifications read in one batch. Every id is checked
    /// before anything is written.
    pub async fn mark_read(&self, caller: &AuthContext, ids: &[String]) -> Result<usize> {
        let ids: BTreeSet<&str> = ids.iter().map(String::as_str).collect();

        let mut batch = WriteBatch::new();
        for id in ids {
            let reference = DocRef::new(NOTIFICATIONS, id);
            let notification: Notification = self
                .store
                .get(&reference)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?
                .decode()?;
            check_notification_recipient(caller, &notification)?;

            let mut patch = Fields::new();
            patch.insert("read".to_string(), Value::Bool(true));
            batch.update(reference, patch);
        }

        let marked = batch.len();
        self.store.commit(batch).await?;
        Ok(marked)
    }
}
