use crate::model::{CollectionRef, LocalId, Workspace};

use super::outbox::{Outbox, PendingWrite, WriteOutcome};

/// What reconciling one outcome did to local state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Write succeeded; server id recorded if it was a create
    Confirmed,
    /// Outcome for an op we no longer track
    Unknown,
    /// Failed create: the temporary item is gone
    CreateRolledBack {
        target: CollectionRef,
        local: LocalId,
    },
    /// Failed update: logged, local state kept
    UpdateKept { local: LocalId },
    /// Failed delete: the item is back at its old index
    DeleteRestored {
        target: CollectionRef,
        local: LocalId,
    },
    /// Failed delete whose parent has since disappeared
    DeleteLost { local: LocalId },
    /// Failed reorder: the grabbed item is back behind its old neighbour.
    /// `original_index` is where it now shows.
    ReorderReverted {
        target: CollectionRef,
        original_index: usize,
    },
}

/// Apply a settled write to the workspace, rolling back where the write
/// kind calls for it.
pub fn reconcile(workspace: &mut Workspace, outbox: &mut Outbox, outcome: WriteOutcome) -> Reconciled {
    let op = outcome.op();
    let pending = outbox.settle(op);

    let error = match outcome {
        WriteOutcome::Created { local, remote, .. } => {
            let recorded = match &pending {
                Some(PendingWrite::Create { target, .. }) => workspace
                    .collection_mut(*target)
                    .is_some_and(|c| c.set_remote(local, &remote)),
                _ => false,
            };
            if !recorded {
                // Deleted while in flight; the queued remove carries on with the id
                tracing::debug!(target: "planner::sync", %local, %remote, "created item already gone");
            }
            return Reconciled::Confirmed;
        }
        WriteOutcome::Completed { .. } => return Reconciled::Confirmed,
        WriteOutcome::Failed { error, .. } => error,
    };

    let Some(pending) = pending else {
        tracing::warn!(target: "planner::sync", op = op.0, %error, "failure for unknown op");
        return Reconciled::Unknown;
    };

    match pending {
        PendingWrite::Create { target, local } => {
            if let Some(collection) = workspace.collection_mut(target) {
                collection.remove(local);
            }
            workspace.take_children(local);
            tracing::warn!(target: "planner::sync", %local, kind = %target.kind, %error, "create failed; removed");
            Reconciled::CreateRolledBack { target, local }
        }
        PendingWrite::Update { local } => {
            tracing::warn!(target: "planner::sync", %local, %error, "update failed; keeping local state");
            Reconciled::UpdateKept { local }
        }
        PendingWrite::Remove {
            target,
            index,
            item,
            children,
        } => {
            let local = item.local;
            match workspace.collection_mut(target) {
                Some(collection) => {
                    collection.restore(index, item);
                    if let Some(children) = children {
                        workspace.restore_children(local, children);
                    }
                    tracing::warn!(target: "planner::sync", %local, kind = %target.kind, %error, "delete failed; restored");
                    Reconciled::DeleteRestored { target, local }
                }
                None => {
                    tracing::warn!(target: "planner::sync", %local, %error, "delete failed but parent is gone");
                    Reconciled::DeleteLost { local }
                }
            }
        }
        PendingWrite::Reorder {
            target,
            item,
            previous,
            original_index,
        } => {
            let mut original_index = original_index;
            if let Some(collection) = workspace.collection_mut(target) {
                // Items created or removed since the grab stay where they are
                let before = previous
                    .iter()
                    .position(|local| *local == item)
                    .map_or(&previous[..0], |i| &previous[..i]);
                let anchor = before
                    .iter()
                    .rev()
                    .find(|local| collection.index_of(**local).is_some())
                    .copied();
                if collection.move_after(item, anchor)
                    && let Some(index) = collection.visible_index_of(item)
                {
                    original_index = index;
                }
            }
            tracing::warn!(target: "planner::sync", %item, kind = %target.kind, %error, "reorder failed; reverted");
            Reconciled::ReorderReverted {
                target,
                original_index,
            }
        }
    }
}
