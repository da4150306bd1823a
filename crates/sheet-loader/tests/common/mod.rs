//! Common test utilities for integration tests.
//!
//! Provides an in-memory gateway that counts fetches per sheet and can hold
//! them until the test releases them, plus a static listing provider.

#![allow(dead_code)] // Each test binary uses a different subset

use async_trait::async_trait;
use dashmap::DashMap;
use sheet_core::{
    FetchGateway, ListingProvider, Result, Revision, SheetData, SheetError, SheetGroupData,
    SheetId,
};
use sheet_loader::sheet::{SheetLoader, SheetUpdate};
use sheet_workbook::WorkbookMaterializer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

/// How long a test waits for an update before failing.
pub(crate) const WAIT: Duration = Duration::from_secs(5);

/// In-memory gateway with per-sheet responses.
pub(crate) struct MockGateway {
    responses: DashMap<SheetId, std::result::Result<SheetData, String>>,
    calls: DashMap<SheetId, usize>,
    gate: Semaphore,
}

impl MockGateway {
    /// Gateway that answers immediately.
    pub(crate) fn new() -> Self {
        Self {
            responses: DashMap::new(),
            calls: DashMap::new(),
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
        }
    }

    /// Gateway whose fetches wait until [`release`](Self::release) is called.
    pub(crate) fn gated() -> Self {
        Self {
            gate: Semaphore::new(0),
            ..Self::new()
        }
    }

    pub(crate) fn with_workbook(self, id: u64, sheet_names: &[&str]) -> Self {
        self.with_raw(id, workbook_json(sheet_names), Vec::new())
    }

    pub(crate) fn with_raw(
        self,
        id: u64,
        raw: impl Into<String>,
        revisions: Vec<Revision>,
    ) -> Self {
        self.responses.insert(
            SheetId::new(id),
            Ok(SheetData {
                raw: raw.into(),
                revisions,
            }),
        );
        self
    }

    pub(crate) fn with_failure(self, id: u64, reason: &str) -> Self {
        self.responses
            .insert(SheetId::new(id), Err(reason.to_string()));
        self
    }

    /// Lets `n` pending or future fetches complete.
    pub(crate) fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub(crate) fn calls(&self, id: u64) -> usize {
        self.calls.get(&SheetId::new(id)).map_or(0, |c| *c)
    }
}

#[async_trait]
impl FetchGateway for MockGateway {
    async fn fetch(&self, id: SheetId) -> Result<SheetData> {
        *self.calls.entry(id).or_insert(0) += 1;

        let permit = self
            .gate
            .acquire()
            .await
            .expect("gate semaphore closed");
        permit.forget();

        match self.responses.get(&id).map(|r| r.value().clone()) {
            Some(Ok(data)) => Ok(data),
            Some(Err(reason)) => Err(SheetError::Gateway {
                sheet_id: id,
                reason,
            }),
            None => Err(SheetError::Gateway {
                sheet_id: id,
                reason: "unknown sheet".into(),
            }),
        }
    }
}

/// Listing provider backed by fixed data.
pub(crate) struct StaticListing {
    pub(crate) groups: Vec<SheetGroupData>,
    pub(crate) names: Vec<(SheetId, String)>,
}

impl StaticListing {
    pub(crate) fn new(groups: Vec<SheetGroupData>, names: &[(u64, &str)]) -> Self {
        Self {
            groups,
            names: names
                .iter()
                .map(|(id, name)| (SheetId::new(*id), (*name).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ListingProvider for StaticListing {
    async fn fetch_groups(&self) -> Result<Vec<SheetGroupData>> {
        Ok(self.groups.clone())
    }

    async fn fetch_sheet_names(&self, ids: &[SheetId]) -> Result<Vec<(SheetId, String)>> {
        Ok(self
            .names
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .cloned()
            .collect())
    }
}

pub(crate) fn group(id: u64, name: &str, ids: &[u64]) -> SheetGroupData {
    SheetGroupData {
        id,
        name: name.into(),
        sheet_ids: ids.iter().copied().map(SheetId::new).collect(),
    }
}

/// Workbook JSON with one worksheet per name, ids `s1`, `s2`, ...
pub(crate) fn workbook_json(sheet_names: &[&str]) -> String {
    let sheets: Vec<serde_json::Value> = sheet_names
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({ "id": format!("s{}", i + 1), "name": name }))
        .collect();
    serde_json::json!({ "version": 1, "sheets": sheets }).to_string()
}

/// Loader over `gateway` with the workbook materializer.
pub(crate) fn loader(gateway: Arc<MockGateway>) -> SheetLoader {
    SheetLoader::new(gateway, Arc::new(WorkbookMaterializer::new()))
}

/// Next update for `id`, skipping updates of other sheets.
pub(crate) async fn next_update(
    updates: &mut mpsc::UnboundedReceiver<SheetUpdate>,
    id: u64,
) -> SheetUpdate {
    tokio::time::timeout(WAIT, async {
        loop {
            let update = updates.recv().await.expect("notifier dropped");
            if update.sheet_id == SheetId::new(id) {
                return update;
            }
        }
    })
    .await
    .expect("timed out waiting for update")
}
