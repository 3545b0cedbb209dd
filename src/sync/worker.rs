use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::io::{RemoteStore, StoreError};
use crate::model::{ItemKind, LocalId, NewRecord, Workspace};

use super::outbox::{WriteOutcome, WriteRequest};

/// Handle → server id side table, owned by the worker.
///
/// Because requests are processed in order, a create always settles before
/// any later request that names the same handle, so lookups here see the id
/// even when the UI has not heard back yet.
#[derive(Debug, Default)]
pub struct IdTable {
    ids: HashMap<LocalId, String>,
    failed: HashSet<LocalId>,
}

impl IdTable {
    /// Seed with every item that already has a server id
    pub fn from_workspace(workspace: &Workspace) -> Self {
        let ids = workspace
            .all_items()
            .filter_map(|item| item.remote.clone().map(|id| (item.local, id)))
            .collect();
        IdTable {
            ids,
            failed: HashSet::new(),
        }
    }

    pub fn insert(&mut self, local: LocalId, remote: String) {
        self.ids.insert(local, remote);
    }

    pub fn get(&self, local: LocalId) -> Option<&str> {
        self.ids.get(&local).map(String::as_str)
    }

    pub fn resolve(&self, local: LocalId) -> Result<String, StoreError> {
        self.get(local)
            .map(str::to_string)
            .ok_or(StoreError::Unresolved(local))
    }

    /// Remember a handle whose create failed; it never reaches the server.
    pub fn mark_failed(&mut self, local: LocalId) {
        self.failed.insert(local);
    }

    pub fn is_failed(&self, local: LocalId) -> bool {
        self.failed.contains(&local)
    }
}

/// Apply one request to the store
pub fn process(
    store: &mut dyn RemoteStore,
    ids: &mut IdTable,
    request: WriteRequest,
) -> WriteOutcome {
    let op = request.op();
    let kind = request.kind();
    let created = match &request {
        WriteRequest::Create { local, .. } => Some(*local),
        _ => None,
    };

    let result = match request {
        WriteRequest::Create {
            op,
            kind,
            local,
            parent,
            record,
        } => send_create(store, ids, kind, local, parent, record)
            .map(|remote| WriteOutcome::Created { op, local, remote }),
        WriteRequest::Update {
            op,
            kind,
            local,
            patch,
        } => ids
            .resolve(local)
            .and_then(|id| store.update(kind, &id, &patch))
            .map(|()| WriteOutcome::Completed { op }),
        WriteRequest::Remove { op, kind, local } => {
            if ids.is_failed(local) {
                // Never created; nothing to delete
                Ok(WriteOutcome::Completed { op })
            } else {
                ids.resolve(local)
                    .and_then(|id| store.remove(kind, &id))
                    .map(|()| WriteOutcome::Completed { op })
            }
        }
        WriteRequest::Reorder {
            op,
            kind,
            parent,
            order,
        } => send_reorder(store, ids, kind, parent, &order)
            .map(|()| WriteOutcome::Completed { op }),
    };

    match result {
        Ok(outcome) => {
            tracing::debug!(target: "planner::sync", op = op.0, %kind, "write settled");
            outcome
        }
        Err(error) => {
            if let Some(local) = created {
                ids.mark_failed(local);
            }
            tracing::warn!(target: "planner::sync", op = op.0, %kind, %error, "write failed");
            WriteOutcome::Failed { op, error }
        }
    }
}

fn send_create(
    store: &mut dyn RemoteStore,
    ids: &mut IdTable,
    kind: ItemKind,
    local: LocalId,
    parent: Option<LocalId>,
    mut record: NewRecord,
) -> Result<String, StoreError> {
    record.parent_id = parent.map(|p| ids.resolve(p)).transpose()?;
    let remote = store.create(kind, &record)?;
    ids.insert(local, remote.clone());
    Ok(remote)
}

/// Handles without a server id (failed creates) are left out of the order.
fn send_reorder(
    store: &mut dyn RemoteStore,
    ids: &IdTable,
    kind: ItemKind,
    parent: Option<LocalId>,
    order: &[LocalId],
) -> Result<(), StoreError> {
    let parent_id = parent.map(|p| ids.resolve(p)).transpose()?;
    let remote_ids: Vec<String> = order
        .iter()
        .filter_map(|local| ids.get(*local).map(str::to_string))
        .collect();
    store.reorder(kind, parent_id.as_deref(), &remote_ids)
}

/// Background thread that owns the store and runs writes in FIFO order.
/// The event loop submits requests and polls outcomes each tick.
pub struct SyncWorker {
    tx: Option<Sender<WriteRequest>>,
    rx: Receiver<WriteOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn spawn(mut store: Box<dyn RemoteStore>, mut ids: IdTable) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<WriteRequest>();
        let (outcome_tx, outcome_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            for request in request_rx {
                let outcome = process(store.as_mut(), &mut ids, request);
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
            tracing::debug!(target: "planner::sync", "worker stopped");
        });

        SyncWorker {
            tx: Some(request_tx),
            rx: outcome_rx,
            handle: Some(handle),
        }
    }

    /// Hand requests to the worker. Never blocks.
    pub fn submit(&self, requests: Vec<WriteRequest>) {
        let Some(tx) = &self.tx else {
            return;
        };
        for request in requests {
            if tx.send(request).is_err() {
                tracing::error!(target: "planner::sync", "worker is gone; dropping write");
                return;
            }
        }
    }

    /// Non-blocking poll for settled writes.
    /// Returns all queued outcomes (may be empty).
    pub fn poll(&self) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Stop accepting work, let queued writes finish, and return whatever
    /// settled since the last poll.
    pub fn finish(mut self) -> Vec<WriteOutcome> {
        self.tx = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!(target: "planner::sync", "worker panicked");
        }
        self.poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Fields, RecordPatch, Snapshot, Value};
    use crate::sync::outbox::OpId;

    /// Records calls; fails creates whose name is "fail".
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        next: u32,
    }

    impl RemoteStore for Recorder {
        fn load(&mut self) -> Result<Snapshot, StoreError> {
            Ok(Snapshot::default())
        }
        fn create(&mut self, kind: ItemKind, record: &NewRecord) -> Result<String, StoreError> {
            if record.fields.get(&Field::Name) == Some(&Value::Text("fail".into())) {
                return Err(StoreError::Status {
                    status: 500,
                    method: "POST",
                    url: kind.endpoint().into(),
                });
            }
            self.next += 1;
            let id = format!("r{}", self.next);
            self.calls
                .push(format!("create {} {:?} -> {}", kind, record.parent_id, id));
            Ok(id)
        }
        fn update(&mut self, kind: ItemKind, id: &str, _: &RecordPatch) -> Result<(), StoreError> {
            self.calls.push(format!("update {} {}", kind, id));
            Ok(())
        }
        fn remove(&mut self, kind: ItemKind, id: &str) -> Result<(), StoreError> {
            self.calls.push(format!("remove {} {}", kind, id));
            Ok(())
        }
        fn reorder(
            &mut self,
            kind: ItemKind,
            _: Option<&str>,
            ids: &[String],
        ) -> Result<(), StoreError> {
            self.calls.push(format!("reorder {} {}", kind, ids.join(",")));
            Ok(())
        }
    }

    fn create(op: u64, kind: ItemKind, local: u64, parent: Option<u64>, name: &str) -> WriteRequest {
        let mut fields = Fields::new();
        fields.insert(Field::Name, Value::Text(name.into()));
        WriteRequest::Create {
            op: OpId(op),
            kind,
            local: LocalId(local),
            parent: parent.map(LocalId),
            record: NewRecord {
                parent_id: None,
                order: 0,
                completed: false,
                fields,
            },
        }
    }

    #[test]
    fn later_requests_see_ids_from_earlier_creates() {
        let mut store = Recorder::default();
        let mut ids = IdTable::default();
        let out = process(&mut store, &mut ids, create(1, ItemKind::Project, 1, None, "P"));
        assert!(matches!(out, WriteOutcome::Created { ref remote, .. } if remote == "r1"));
        process(
            &mut store,
            &mut ids,
            create(2, ItemKind::ProjectTask, 2, Some(1), "T"),
        );
        process(
            &mut store,
            &mut ids,
            WriteRequest::Update {
                op: OpId(3),
                kind: ItemKind::Project,
                local: LocalId(1),
                patch: RecordPatch::completed(true),
            },
        );
        assert_eq!(
            store.calls,
            vec![
                "create projects None -> r1",
                "create project_tasks Some(\"r1\") -> r2",
                "update projects r1",
            ]
        );
    }

    #[test]
    fn remove_after_failed_create_is_a_no_op() {
        let mut store = Recorder::default();
        let mut ids = IdTable::default();
        let out = process(&mut store, &mut ids, create(1, ItemKind::Goal, 5, None, "fail"));
        assert!(matches!(out, WriteOutcome::Failed { .. }));
        let out = process(
            &mut store,
            &mut ids,
            WriteRequest::Remove {
                op: OpId(2),
                kind: ItemKind::Goal,
                local: LocalId(5),
            },
        );
        assert!(matches!(out, WriteOutcome::Completed { op: OpId(2) }));
        assert!(store.calls.is_empty());
    }

    #[test]
    fn update_of_unknown_handle_fails() {
        let mut store = Recorder::default();
        let mut ids = IdTable::default();
        let out = process(
            &mut store,
            &mut ids,
            WriteRequest::Update {
                op: OpId(1),
                kind: ItemKind::Goal,
                local: LocalId(9),
                patch: RecordPatch::default(),
            },
        );
        assert!(matches!(
            out,
            WriteOutcome::Failed {
                error: StoreError::Unresolved(LocalId(9)),
                ..
            }
        ));
    }

    #[test]
    fn worker_thread_round_trip() {
        let worker = SyncWorker::spawn(Box::new(Recorder::default()), IdTable::default());
        worker.submit(vec![
            create(1, ItemKind::Goal, 1, None, "A"),
            WriteRequest::Reorder {
                op: OpId(2),
                kind: ItemKind::Goal,
                parent: None,
                order: vec![LocalId(1)],
            },
        ]);
        let outcomes = worker.finish();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], WriteOutcome::Created { op: OpId(1), .. }));
        assert!(matches!(outcomes[1], WriteOutcome::Completed { op: OpId(2) }));
    }
}
