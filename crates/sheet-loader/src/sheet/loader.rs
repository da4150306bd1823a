use super::notify::{SheetUpdate, UpdateKind, UpdateNotifier};
use super::snapshot::{LoaderSnapshot, SheetSnapshot};
use super::state::{Sheet, SheetEntry, SheetGroup, SheetState, SheetSummary};
use crate::config::LoaderConfig;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use sheet_core::{
    ContentMaterializer, FetchGateway, ListingProvider, Result, SheetError, SheetGroupData,
    SheetId, Status,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Lazily loads sheets and tracks their status.
///
/// Holds the group index (sections in listing order) and the registry of
/// sheet records. Cloning is cheap and every clone shares the same state.
///
/// Records are created `NotLoaded` and fetched on first access through
/// [`get_or_load`](Self::get_or_load). The status guard guarantees a single
/// fetch per record no matter how many callers race for it.
///
/// # Examples
///
/// ```no_run
/// use sheet_core::SheetId;
/// use sheet_loader::gateway::DiskGateway;
/// use sheet_loader::sheet::SheetLoader;
/// use sheet_workbook::WorkbookMaterializer;
/// use std::sync::Arc;
///
/// # async fn example() -> sheet_core::Result<()> {
/// let disk = Arc::new(DiskGateway::new("./dashboards"));
/// let loader = SheetLoader::new(disk.clone(), Arc::new(WorkbookMaterializer::new()));
///
/// loader.load_listing(disk.as_ref()).await?;
/// let sheet = loader.load_and_wait(SheetId::new(10)).await?;
/// println!("{} is {}", sheet.display_name, sheet.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SheetLoader {
    inner: Arc<Inner>,
}

pub(super) struct Inner {
    groups: RwLock<Vec<SheetGroupData>>,
    pub(super) sheets: DashMap<SheetId, SheetEntry>,
    pub(super) gateway: Arc<dyn FetchGateway>,
    pub(super) materializer: Arc<dyn ContentMaterializer>,
    pub(super) notifier: UpdateNotifier,
    pub(super) config: LoaderConfig,
    /// Bumped by every restore. Fetches started under an older generation
    /// discard their result.
    generation: AtomicU64,
}

impl std::fmt::Debug for SheetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetLoader")
            .field("sheets", &self.inner.sheets.len())
            .field("generation", &self.inner.generation())
            .finish_non_exhaustive()
    }
}

impl SheetLoader {
    pub fn new(
        gateway: Arc<dyn FetchGateway>,
        materializer: Arc<dyn ContentMaterializer>,
    ) -> Self {
        Self::with_config(gateway, materializer, LoaderConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn FetchGateway>,
        materializer: Arc<dyn ContentMaterializer>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                groups: RwLock::new(Vec::new()),
                sheets: DashMap::new(),
                gateway,
                materializer,
                notifier: UpdateNotifier::new(),
                config,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// Receives one [`SheetUpdate`] per record mutation from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SheetUpdate> {
        self.inner.notifier.subscribe()
    }

    /// Creates a `NotLoaded` record unless one exists.
    ///
    /// Returns `true` if the record was created. Existing records keep their
    /// name and status.
    pub fn register_sheet(&self, id: SheetId, display_name: impl Into<String>) -> bool {
        match self.inner.sheets.entry(id) {
            Entry::Occupied(_) => {
                tracing::debug!("sheet {} already registered", id);
                false
            }
            Entry::Vacant(vacant) => {
                let entry = vacant.insert(SheetEntry::new(Sheet::new(id, display_name)));
                tracing::debug!("registered sheet {} ({})", id, entry.sheet.display_name);
                self.inner
                    .notifier
                    .emit(id, Status::NotLoaded, UpdateKind::Registered);
                true
            }
        }
    }

    /// Replaces the group index.
    ///
    /// Ids not yet registered get a record named `"Sheet <id>"`.
    pub fn set_groups(&self, groups: Vec<SheetGroupData>) {
        for id in groups.iter().flat_map(|g| &g.sheet_ids) {
            if !self.inner.sheets.contains_key(id) {
                self.register_sheet(*id, fallback_name(*id));
            }
        }
        *self
            .inner
            .groups
            .write()
            .unwrap_or_else(PoisonError::into_inner) = groups;
    }

    pub fn groups(&self) -> Vec<SheetGroupData> {
        self.inner
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current record without triggering a fetch.
    pub fn get(&self, id: SheetId) -> Option<Sheet> {
        self.inner.sheets.get(&id).map(|entry| entry.sheet.clone())
    }

    /// Returns the record, starting its fetch if it was never loaded.
    ///
    /// A `NotLoaded` record flips to `Loading` before this returns, so a
    /// second call sees `Loading` and starts nothing. Any other status is
    /// returned as is: failed sheets are not retried.
    ///
    /// The fetch runs on the current tokio runtime and completes even if the
    /// caller drops the returned record. Called outside a runtime, the record
    /// goes straight to `Error`.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the id was never registered.
    pub fn get_or_load(&self, id: SheetId) -> Result<Sheet> {
        let runtime = Handle::try_current();

        let mut entry = self.inner.sheets.get_mut(&id).ok_or_else(|| {
            tracing::debug!("sheet {} requested but not registered", id);
            SheetError::NotFound(id)
        })?;

        if entry.sheet.status() != Status::NotLoaded {
            tracing::trace!("sheet {} already {}", id, entry.sheet.status());
            return Ok(entry.sheet.clone());
        }

        entry.sheet.state = SheetState::Loading;
        self.inner
            .notifier
            .emit(id, Status::Loading, UpdateKind::Status);

        let handle = match runtime {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("cannot fetch sheet {}: {}", id, e);
                entry.sheet.state = SheetState::Error(Arc::new(SheetError::Gateway {
                    sheet_id: id,
                    reason: format!("no async runtime: {e}"),
                }));
                self.inner
                    .notifier
                    .emit(id, Status::Error, UpdateKind::Status);
                return Ok(entry.sheet.clone());
            }
        };

        let generation = self.inner.generation();
        let sheet = entry.sheet.clone();
        drop(entry);

        tracing::debug!("fetching sheet {}", id);
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            inner.fetch_and_store(id, generation).await;
        });

        Ok(sheet)
    }

    /// Resolves once the record is `Loaded` or `Error`.
    ///
    /// Does not start a fetch; see [`load_and_wait`](Self::load_and_wait).
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the id is not registered.
    pub async fn wait_for(&self, id: SheetId) -> Result<Sheet> {
        // Subscribe before reading so no transition slips in between.
        let mut updates = self.inner.notifier.subscribe();
        loop {
            let sheet = self.get(id).ok_or(SheetError::NotFound(id))?;
            if sheet.status().is_terminal() {
                return Ok(sheet);
            }
            loop {
                match updates.recv().await {
                    Some(update) if update.sheet_id == id => break,
                    Some(_) => {}
                    None => return self.get(id).ok_or(SheetError::NotFound(id)),
                }
            }
        }
    }

    /// [`get_or_load`](Self::get_or_load) followed by
    /// [`wait_for`](Self::wait_for).
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the id is not registered. A failed
    /// fetch is not an error here; it is the returned record's `error()`.
    pub async fn load_and_wait(&self, id: SheetId) -> Result<Sheet> {
        self.get_or_load(id)?;
        self.wait_for(id).await
    }

    /// Sections in listing order with the current status of every sheet.
    ///
    /// Never starts a fetch.
    pub fn list_sections(&self) -> Vec<SheetGroup> {
        let groups = self
            .inner
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        groups
            .iter()
            .map(|group| SheetGroup {
                id: group.id,
                name: group.name.clone(),
                sheets: group
                    .sheet_ids
                    .iter()
                    .filter_map(|id| {
                        let Some(entry) = self.inner.sheets.get(id) else {
                            tracing::warn!("group {} lists unregistered sheet {}", group.id, id);
                            return None;
                        };
                        Some(SheetSummary {
                            id: *id,
                            display_name: entry.sheet.display_name.clone(),
                            status: entry.sheet.status(),
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    /// Fetches the listing and registers every sheet it names.
    ///
    /// Replaces the group index. Returns the number of distinct sheets in the
    /// listing.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the loader is left untouched.
    pub async fn load_listing(&self, provider: &dyn ListingProvider) -> Result<usize> {
        let mut groups = provider.fetch_groups().await?;
        if self.inner.config.listing.skip_empty_groups {
            groups.retain(|group| !group.sheet_ids.is_empty());
        }

        let mut seen = HashSet::new();
        let ids: Vec<SheetId> = groups
            .iter()
            .flat_map(|group| group.sheet_ids.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect();

        let names: HashMap<SheetId, String> = if ids.is_empty() {
            HashMap::new()
        } else {
            provider.fetch_sheet_names(&ids).await?.into_iter().collect()
        };

        for id in &ids {
            let name = names.get(id).cloned().unwrap_or_else(|| {
                tracing::debug!("no name for sheet {}, using fallback", id);
                fallback_name(*id)
            });
            self.register_sheet(*id, name);
        }

        tracing::info!("loaded listing: {} groups, {} sheets", groups.len(), ids.len());
        self.set_groups(groups);
        Ok(ids.len())
    }

    /// Registers a single sheet by asking the provider for its name.
    ///
    /// Already registered sheets are returned without a provider call.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the provider does not know the id,
    /// or the provider's own error.
    pub async fn load(&self, provider: &dyn ListingProvider, id: SheetId) -> Result<Sheet> {
        if let Some(sheet) = self.get(id) {
            tracing::debug!("sheet {} already registered", id);
            return Ok(sheet);
        }

        let name = provider
            .fetch_sheet_names(&[id])
            .await?
            .into_iter()
            .find_map(|(sheet_id, name)| (sheet_id == id).then_some(name))
            .ok_or(SheetError::NotFound(id))?;

        self.register_sheet(id, name);
        self.get(id).ok_or(SheetError::NotFound(id))
    }

    /// Serializable state: groups plus every record, ordered by id.
    ///
    /// Live documents are not part of the snapshot.
    pub fn snapshot(&self) -> LoaderSnapshot {
        // Held across the record scan so a concurrent restore is not mixed in.
        let groups = self
            .inner
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut sheets: Vec<SheetSnapshot> = self
            .inner
            .sheets
            .iter()
            .map(|entry| SheetSnapshot::capture(&entry.sheet))
            .collect();
        sheets.sort_by_key(|sheet| sheet.id);

        LoaderSnapshot {
            groups: groups.clone(),
            sheets,
        }
    }

    /// Replaces groups and records with the snapshot's.
    ///
    /// Live documents and their listeners are dropped. Fetches still in
    /// flight finish but their results are discarded. See
    /// [`RestoreConfig`](crate::config::RestoreConfig) for how each status
    /// comes back.
    ///
    /// Records are replaced in place, so an id present both before and after
    /// the restore is never reported missing. The group index stays
    /// write-locked until every record is in; [`list_sections`] and
    /// [`snapshot`] see either the old state or the new one.
    ///
    /// [`list_sections`]: Self::list_sections
    /// [`snapshot`]: Self::snapshot
    pub fn restore(&self, snapshot: LoaderSnapshot) {
        let mut groups = self
            .inner
            .groups
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);

        let policy = &self.inner.config.restore;
        let count = snapshot.sheets.len();
        let mut restored = HashSet::with_capacity(count);
        for saved in snapshot.sheets {
            let sheet = saved.into_sheet(policy);
            let (id, status) = (sheet.id, sheet.status());
            restored.insert(id);
            self.inner.sheets.insert(id, SheetEntry::new(sheet));
            self.inner.notifier.emit(id, status, UpdateKind::Restored);
        }
        self.inner.sheets.retain(|id, _| restored.contains(id));

        *groups = snapshot.groups;
        drop(groups);

        tracing::info!("restored {} sheets from snapshot", count);
    }

    pub fn len(&self) -> usize {
        self.inner.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sheets.is_empty()
    }
}

impl Inner {
    pub(super) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Entry of a fetch still waiting for its result.
    ///
    /// `None` when a restore happened since the fetch started, or the record
    /// is no longer `Loading`.
    pub(super) fn pending_entry(
        &self,
        id: SheetId,
        generation: u64,
    ) -> Option<RefMut<'_, SheetId, SheetEntry>> {
        let entry = self.sheets.get_mut(&id)?;
        if self.generation() != generation || entry.sheet.status() != Status::Loading {
            tracing::debug!("discarding stale fetch result for sheet {}", id);
            return None;
        }
        Some(entry)
    }
}

fn fallback_name(id: SheetId) -> String {
    format!("Sheet {id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sheet_core::{LiveDocument, Revision, SheetData};

    struct Unreachable;

    #[async_trait]
    impl FetchGateway for Unreachable {
        async fn fetch(&self, id: SheetId) -> Result<SheetData> {
            Err(SheetError::Gateway {
                sheet_id: id,
                reason: "unreachable".into(),
            })
        }
    }

    #[async_trait]
    impl ContentMaterializer for Unreachable {
        async fn materialize(
            &self,
            _raw: &str,
            _revisions: &[Revision],
        ) -> Result<Arc<dyn LiveDocument>> {
            Err(SheetError::Materialize("unreachable".into()))
        }
    }

    fn loader() -> SheetLoader {
        SheetLoader::new(Arc::new(Unreachable), Arc::new(Unreachable))
    }

    fn group(id: u64, name: &str, ids: &[u64]) -> SheetGroupData {
        SheetGroupData {
            id,
            name: name.into(),
            sheet_ids: ids.iter().copied().map(SheetId::new).collect(),
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let loader = loader();
        assert!(loader.register_sheet(SheetId::new(1), "First"));
        assert!(!loader.register_sheet(SheetId::new(1), "Renamed"));

        let sheet = loader.get(SheetId::new(1)).unwrap();
        assert_eq!(sheet.display_name, "First");
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn test_get_or_load_unregistered() {
        let loader = loader();
        let err = loader.get_or_load(SheetId::new(99)).unwrap_err();
        assert!(matches!(err, SheetError::NotFound(id) if id == SheetId::new(99)));
    }

    #[test]
    fn test_get_or_load_without_runtime_fails_record() {
        let loader = loader();
        loader.register_sheet(SheetId::new(1), "One");

        let sheet = loader.get_or_load(SheetId::new(1)).unwrap();

        assert_eq!(sheet.status(), Status::Error);
        assert!(sheet.error().unwrap().to_string().contains("no async runtime"));
    }

    #[test]
    fn test_set_groups_registers_missing_ids() {
        let loader = loader();
        loader.register_sheet(SheetId::new(1), "One");
        loader.set_groups(vec![group(1, "A", &[1, 2])]);

        assert_eq!(loader.get(SheetId::new(2)).unwrap().display_name, "Sheet 2");
        let sections = loader.list_sections();
        assert_eq!(sections[0].sheets.len(), 2);
        assert_eq!(sections[0].sheets[0].display_name, "One");
    }

    #[test]
    fn test_snapshot_sorted_by_id() {
        let loader = loader();
        loader.register_sheet(SheetId::new(30), "C");
        loader.register_sheet(SheetId::new(10), "A");
        loader.register_sheet(SheetId::new(20), "B");

        let ids: Vec<u64> = loader
            .snapshot()
            .sheets
            .iter()
            .map(|s| s.id.get())
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_register_emits_update() {
        let loader = loader();
        let mut updates = loader.subscribe();

        loader.register_sheet(SheetId::new(5), "Five");
        loader.register_sheet(SheetId::new(5), "Five again");

        let update = updates.try_recv().unwrap();
        assert_eq!(update.kind, UpdateKind::Registered);
        assert_eq!(update.status, Status::NotLoaded);
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_restore_bumps_generation() {
        let loader = loader();
        let before = loader.inner.generation();
        loader.restore(LoaderSnapshot::default());
        assert_eq!(loader.inner.generation(), before + 1);
        assert!(loader.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_unregistered() {
        let loader = loader();
        let err = loader.wait_for(SheetId::new(1)).await.unwrap_err();
        assert!(matches!(err, SheetError::NotFound(_)));
    }
}
