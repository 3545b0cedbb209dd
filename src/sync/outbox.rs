use std::collections::HashMap;

use crate::io::StoreError;
use crate::model::{
    Collection, CollectionRef, Item, ItemKind, LocalId, NewRecord, RecordPatch,
};

/// Identifies one enqueued write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u64);

/// A write for the sync worker. Items are referenced by handle; the worker
/// maps handles to server ids when it sends.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Create {
        op: OpId,
        kind: ItemKind,
        local: LocalId,
        parent: Option<LocalId>,
        record: NewRecord,
    },
    Update {
        op: OpId,
        kind: ItemKind,
        local: LocalId,
        patch: RecordPatch,
    },
    Remove {
        op: OpId,
        kind: ItemKind,
        local: LocalId,
    },
    Reorder {
        op: OpId,
        kind: ItemKind,
        parent: Option<LocalId>,
        order: Vec<LocalId>,
    },
}

impl WriteRequest {
    pub fn op(&self) -> OpId {
        match self {
            WriteRequest::Create { op, .. }
            | WriteRequest::Update { op, .. }
            | WriteRequest::Remove { op, .. }
            | WriteRequest::Reorder { op, .. } => *op,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            WriteRequest::Create { kind, .. }
            | WriteRequest::Update { kind, .. }
            | WriteRequest::Remove { kind, .. }
            | WriteRequest::Reorder { kind, .. } => *kind,
        }
    }
}

/// What the worker reports back
#[derive(Debug)]
pub enum WriteOutcome {
    Created {
        op: OpId,
        local: LocalId,
        remote: String,
    },
    Completed {
        op: OpId,
    },
    Failed {
        op: OpId,
        error: StoreError,
    },
}

impl WriteOutcome {
    pub fn op(&self) -> OpId {
        match self {
            WriteOutcome::Created { op, .. }
            | WriteOutcome::Completed { op }
            | WriteOutcome::Failed { op, .. } => *op,
        }
    }
}

/// Rollback data held until a write settles
#[derive(Debug, Clone)]
pub enum PendingWrite {
    Create {
        target: CollectionRef,
        local: LocalId,
    },
    /// Updates are never rolled back
    Update { local: LocalId },
    Remove {
        target: CollectionRef,
        index: usize,
        item: Item,
        children: Option<Collection>,
    },
    /// Enough to put just the grabbed item back
    Reorder {
        target: CollectionRef,
        item: LocalId,
        previous: Vec<LocalId>,
        original_index: usize,
    },
}

/// Queue of writes waiting for the worker, plus the bookkeeping needed to
/// reconcile them. Every method is called after the matching local mutation
/// has already been applied.
#[derive(Debug, Default)]
pub struct Outbox {
    next_op: u64,
    queued: Vec<WriteRequest>,
    pending: HashMap<OpId, PendingWrite>,
}

impl Outbox {
    pub fn new() -> Self {
        Outbox::default()
    }

    fn next_op(&mut self) -> OpId {
        self.next_op += 1;
        OpId(self.next_op)
    }

    fn enqueue(&mut self, request: WriteRequest, pending: PendingWrite) -> OpId {
        let op = request.op();
        tracing::debug!(
            target: "planner::sync",
            op = op.0,
            kind = %request.kind(),
            "enqueue {}",
            request_name(&request)
        );
        self.queued.push(request);
        self.pending.insert(op, pending);
        op
    }

    /// Enqueue a create for an item already inserted into `target`
    pub fn create(&mut self, target: CollectionRef, item: &Item) -> OpId {
        let op = self.next_op();
        let request = WriteRequest::Create {
            op,
            kind: target.kind,
            local: item.local,
            parent: target.parent,
            record: NewRecord {
                parent_id: None,
                order: item.order,
                completed: item.completed,
                fields: item.fields.clone(),
            },
        };
        self.enqueue(
            request,
            PendingWrite::Create {
                target,
                local: item.local,
            },
        )
    }

    pub fn update(&mut self, item: &Item, patch: RecordPatch) -> OpId {
        let op = self.next_op();
        let request = WriteRequest::Update {
            op,
            kind: item.kind,
            local: item.local,
            patch,
        };
        self.enqueue(request, PendingWrite::Update { local: item.local })
    }

    /// Enqueue a delete. `item` and `children` are what was removed locally.
    pub fn remove(
        &mut self,
        target: CollectionRef,
        index: usize,
        item: Item,
        children: Option<Collection>,
    ) -> OpId {
        let op = self.next_op();
        let request = WriteRequest::Remove {
            op,
            kind: target.kind,
            local: item.local,
        };
        self.enqueue(
            request,
            PendingWrite::Remove {
                target,
                index,
                item,
                children,
            },
        )
    }

    pub fn reorder(
        &mut self,
        target: CollectionRef,
        item: LocalId,
        order: Vec<LocalId>,
        previous: Vec<LocalId>,
        original_index: usize,
    ) -> OpId {
        let op = self.next_op();
        let request = WriteRequest::Reorder {
            op,
            kind: target.kind,
            parent: target.parent,
            order,
        };
        self.enqueue(
            request,
            PendingWrite::Reorder {
                target,
                item,
                previous,
                original_index,
            },
        )
    }

    /// Requests not yet handed to the worker
    pub fn queued(&self) -> &[WriteRequest] {
        &self.queued
    }

    pub fn drain(&mut self) -> Vec<WriteRequest> {
        std::mem::take(&mut self.queued)
    }

    /// Writes enqueued but not settled
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn settle(&mut self, op: OpId) -> Option<PendingWrite> {
        self.pending.remove(&op)
    }
}

fn request_name(request: &WriteRequest) -> &'static str {
    match request {
        WriteRequest::Create { .. } => "create",
        WriteRequest::Update { .. } => "update",
        WriteRequest::Remove { .. } => "remove",
        WriteRequest::Reorder { .. } => "reorder",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fields;

    #[test]
    fn ops_are_sequential_and_tracked() {
        let mut outbox = Outbox::new();
        let target = CollectionRef {
            kind: ItemKind::Goal,
            parent: None,
        };
        let item = Item::new(LocalId(1), ItemKind::Goal, Fields::new());
        let a = outbox.create(target, &item);
        let b = outbox.update(&item, RecordPatch::completed(true));
        assert!(a < b);
        assert_eq!(outbox.queued().len(), 2);
        assert_eq!(outbox.in_flight(), 2);

        let drained = outbox.drain();
        assert_eq!(drained[0].op(), a);
        assert!(outbox.queued().is_empty());
        assert_eq!(outbox.in_flight(), 2);

        assert!(matches!(
            outbox.settle(b),
            Some(PendingWrite::Update { local: LocalId(1) })
        ));
        assert!(outbox.settle(b).is_none());
    }
}
