//! Change feed published by store backends after each successful commit.

use crate::{DocRef, Fields};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::trace;

/// What happened to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// A committed change to one document, with snapshots on either side.
///
/// `before` is `None` for creations; `after` is `None` for deletions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub reference: DocRef,
    pub kind: ChangeKind,
    pub before: Option<Fields>,
    pub after: Option<Fields>,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Classify a write given the document state on either side of it.
    ///
    /// Returns `None` when nothing existed before or after (deleting a
    /// missing document), which publishes no event.
    pub fn from_snapshots(
        reference: DocRef,
        before: Option<Fields>,
        after: Option<Fields>,
    ) -> Option<Self> {
        let kind = match (&before, &after) {
            (None, Some(_)) => ChangeKind::Created,
            (Some(_), Some(_)) => ChangeKind::Updated,
            (Some(_), None) => ChangeKind::Deleted,
            (None, None) => return None,
        };

        Some(Self {
            reference,
            kind,
            before,
            after,
            occurred_at: Utc::now(),
        })
    }
}

/// Broadcast fan-out of change events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish events in commit order. Having no subscribers is not an error.
    pub fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            trace!(doc = %event.reference, kind = event.kind.as_str(), "publishing change");
            let _ = self.sender.send(event);
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(1024)
    }
}
