use serde::Serialize;
use sheet_core::{LiveDocument, SheetError, SheetId, Status};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Load state of a sheet, carrying whatever the status implies.
///
/// Content exists only in `Loaded` and the error only in `Error`, so the
/// record can never claim `Loaded` without a model.
#[derive(Clone)]
pub enum SheetState {
    NotLoaded,
    Loading,
    Loaded(Arc<dyn LiveDocument>),
    Error(Arc<SheetError>),
}

impl SheetState {
    pub const fn status(&self) -> Status {
        match self {
            Self::NotLoaded => Status::NotLoaded,
            Self::Loading => Status::Loading,
            Self::Loaded(_) => Status::Loaded,
            Self::Error(_) => Status::Error,
        }
    }
}

impl std::fmt::Debug for SheetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoaded => f.write_str("NotLoaded"),
            Self::Loading => f.write_str("Loading"),
            Self::Loaded(_) => f.write_str("Loaded(..)"),
            Self::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
        }
    }
}

/// A sheet record as seen by callers.
///
/// Returned by value: cloning shares the live model (`Arc`), so a caller
/// holding a `Loaded` sheet reads the same document the loader keeps
/// evaluating. Re-read through the loader to observe later transitions.
///
/// # Examples
///
/// ```
/// use sheet_core::{SheetId, Status};
/// use sheet_loader::sheet::Sheet;
///
/// let sheet = Sheet::new(SheetId::new(10), "Revenue");
/// assert_eq!(sheet.status(), Status::NotLoaded);
/// assert!(sheet.model().is_none());
/// assert!(sheet.error().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Sheet {
    pub id: SheetId,
    pub display_name: String,
    pub state: SheetState,
}

impl Sheet {
    pub fn new(id: SheetId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            state: SheetState::NotLoaded,
        }
    }

    pub const fn status(&self) -> Status {
        self.state.status()
    }

    /// Live document, present iff the status is `Loaded`.
    pub fn model(&self) -> Option<&Arc<dyn LiveDocument>> {
        match &self.state {
            SheetState::Loaded(model) => Some(model),
            _ => None,
        }
    }

    /// Fetch failure, present iff the status is `Error`.
    pub fn error(&self) -> Option<&Arc<SheetError>> {
        match &self.state {
            SheetState::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Aborts the data-source listener task when dropped.
///
/// Owned by the registry entry, so the listener lives exactly as long as the
/// record's loaded state.
#[derive(Debug)]
pub(crate) struct ListenerGuard(JoinHandle<()>);

impl ListenerGuard {
    pub(crate) const fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Registry slot: the public record plus what only the loader may own.
#[derive(Debug)]
pub(crate) struct SheetEntry {
    pub(crate) sheet: Sheet,
    pub(crate) listener: Option<ListenerGuard>,
}

impl SheetEntry {
    pub(crate) const fn new(sheet: Sheet) -> Self {
        Self {
            sheet,
            listener: None,
        }
    }
}

/// Read-only projection of one sheet inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub id: SheetId,
    pub display_name: String,
    pub status: Status,
}

/// Read-only projection of a section with its sheets in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetGroup {
    pub id: u64,
    pub name: String,
    pub sheets: Vec<SheetSummary>,
}
