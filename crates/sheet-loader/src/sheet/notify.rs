//! Update notifications for sheet records.
//!
//! Every mutation of a record emits exactly one [`SheetUpdate`]. Updates go
//! through unbounded channels, so a slow consumer never causes an update to
//! be dropped or merged with another.

use sheet_core::{SheetId, Status};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Record created by `register_sheet`.
    Registered,
    /// Status transition (`Loading`, `Loaded` or `Error`).
    Status,
    /// Loaded model re-evaluated after a data-source update.
    Recomputed,
    /// Record replaced by a snapshot restore.
    Restored,
}

/// One observable mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetUpdate {
    pub sheet_id: SheetId,
    /// Status of the record right after the mutation.
    pub status: Status,
    pub kind: UpdateKind,
}

/// Fan-out of [`SheetUpdate`]s to every live subscriber.
#[derive(Debug, Default)]
pub struct UpdateNotifier {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SheetUpdate>>>,
}

impl UpdateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SheetUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    pub fn emit(&self, sheet_id: SheetId, status: Status, kind: UpdateKind) {
        let update = SheetUpdate {
            sheet_id,
            status,
            kind,
        };
        tracing::trace!("sheet {} update: {:?} ({})", sheet_id, kind, status);
        // Closed receivers are pruned here.
        self.lock().retain(|tx| tx.send(update.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<SheetUpdate>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
