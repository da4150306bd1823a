//! Fetch pipeline run by the task `get_or_load` spawns.
//!
//! fetch → size check → materialize → first-sheet activation → listener
//! subscription → `Loaded`. The first failing step stores its error in the
//! record instead.

use super::loader::Inner;
use super::notify::UpdateKind;
use super::state::{ListenerGuard, SheetState};
use sheet_core::{LiveDocument, Result, SheetError, SheetId, Status, activate_first_sheet};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

impl Inner {
    pub(super) async fn fetch_and_store(self: Arc<Self>, id: SheetId, generation: u64) {
        match self.build_document(id).await {
            Ok((document, updates)) => self.store_loaded(id, generation, document, updates),
            Err(error) => {
                tracing::warn!("failed to load sheet {}: {}", id, error);
                self.store_failed(id, generation, error);
            }
        }
    }

    async fn build_document(
        &self,
        id: SheetId,
    ) -> Result<(Arc<dyn LiveDocument>, mpsc::UnboundedReceiver<u64>)> {
        let data = self.gateway.fetch(id).await?;

        let size = u64::try_from(data.raw.len()).unwrap_or(u64::MAX);
        self.config.fetch.check_size(size, &format!("sheet {id}"))?;

        let document = self
            .materializer
            .materialize(&data.raw, &data.revisions)
            .await?;

        if activate_first_sheet(document.as_ref())? {
            tracing::debug!("activated first sheet of {}", id);
        }

        // Subscribed before the transition: data arriving from here on
        // triggers a recomputation once the listener runs.
        let updates = document.data_source_updates();
        Ok((document, updates))
    }

    fn store_loaded(
        self: &Arc<Self>,
        id: SheetId,
        generation: u64,
        document: Arc<dyn LiveDocument>,
        updates: mpsc::UnboundedReceiver<u64>,
    ) {
        let Some(mut entry) = self.pending_entry(id, generation) else {
            return;
        };

        let listener = tokio::spawn(listen(
            Arc::downgrade(self),
            id,
            generation,
            Arc::clone(&document),
            updates,
        ));

        entry.sheet.state = SheetState::Loaded(document);
        entry.listener = Some(ListenerGuard::new(listener));
        self.notifier.emit(id, Status::Loaded, UpdateKind::Status);

        tracing::info!("loaded sheet {} ({})", id, entry.sheet.display_name);
    }

    fn store_failed(&self, id: SheetId, generation: u64, error: SheetError) {
        let Some(mut entry) = self.pending_entry(id, generation) else {
            return;
        };
        entry.sheet.state = SheetState::Error(Arc::new(error));
        self.notifier.emit(id, Status::Error, UpdateKind::Status);
    }
}

/// Standing data-source listener of a loaded sheet.
///
/// Re-evaluates the document once per update, in arrival order, and reports
/// each evaluation. Ends when the document's data sources go away, the loader
/// is dropped, or the record no longer holds this load (the owning
/// [`ListenerGuard`] also aborts it).
async fn listen(
    loader: Weak<Inner>,
    id: SheetId,
    generation: u64,
    document: Arc<dyn LiveDocument>,
    mut updates: mpsc::UnboundedReceiver<u64>,
) {
    while let Some(version) = updates.recv().await {
        tracing::debug!("data source update {} for sheet {}", version, id);

        document.evaluate();

        let Some(inner) = loader.upgrade() else {
            break;
        };
        let Some(entry) = inner.sheets.get(&id) else {
            break;
        };
        if inner.generation() != generation || entry.sheet.status() != Status::Loaded {
            break;
        }
        inner
            .notifier
            .emit(id, Status::Loaded, UpdateKind::Recomputed);
    }
    tracing::trace!("listener for sheet {} stopped", id);
}
