pub mod outbox;
pub mod reconcile;
pub mod worker;

pub use outbox::{OpId, Outbox, PendingWrite, WriteOutcome, WriteRequest};
pub use reconcile::{Reconciled, reconcile};
pub use worker::{IdTable, SyncWorker};
