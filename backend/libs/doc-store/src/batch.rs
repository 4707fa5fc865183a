//! Atomic multi-document writes.

use crate::{DocRef, Fields};

/// A single queued write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite the whole document.
    Set { reference: DocRef, data: Fields },
    /// Merge fields into an existing document; the batch fails if it is missing.
    Update { reference: DocRef, fields: Fields },
    /// Remove the document if present.
    Delete { reference: DocRef },
}

impl WriteOp {
    pub fn reference(&self) -> &DocRef {
        match self {
            WriteOp::Set { reference, .. }
            | WriteOp::Update { reference, .. }
            | WriteOp::Delete { reference } => reference,
        }
    }
}

/// Ordered list of writes applied all-or-nothing by
/// [`DocumentStore::commit`](crate::DocumentStore::commit).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, reference: DocRef, data: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set { reference, data });
        self
    }

    pub fn update(&mut self, reference: DocRef, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update { reference, fields });
        self
    }

    pub fn delete(&mut self, reference: DocRef) -> &mut Self {
        self.ops.push(WriteOp::Delete { reference });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Merge `fields` into `target` (shallow, last writer wins per key).
pub(crate) fn merge_fields(target: &mut Fields, fields: &Fields) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}
