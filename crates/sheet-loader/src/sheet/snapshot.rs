//! Serializable form of the loader state.
//!
//! Live documents are never serialized. A snapshot records what the loader
//! knows about each sheet (name, status, failure message); restoring it
//! rebuilds records according to [`RestoreConfig`].

use super::state::{Sheet, SheetState};
use crate::config::RestoreConfig;
use serde::{Deserialize, Serialize};
use sheet_core::{SheetError, SheetGroupData, SheetId, Status};
use std::sync::Arc;

/// Groups plus one entry per registered sheet, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderSnapshot {
    #[serde(default)]
    pub groups: Vec<SheetGroupData>,
    #[serde(default)]
    pub sheets: Vec<SheetSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub id: SheetId,
    pub display_name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SheetSnapshot {
    pub(crate) fn capture(sheet: &Sheet) -> Self {
        Self {
            id: sheet.id,
            display_name: sheet.display_name.clone(),
            status: sheet.status(),
            error: sheet.error().map(ToString::to_string),
        }
    }

    /// Rebuilds a record without live content.
    ///
    /// `Loaded` and `Loading` come back as `NotLoaded`, so the next access
    /// fetches again. `Error` is kept when `policy.keep_errors` is set.
    pub(crate) fn into_sheet(self, policy: &RestoreConfig) -> Sheet {
        let state = match self.status {
            Status::Error if policy.keep_errors => {
                let message = self
                    .error
                    .unwrap_or_else(|| "failed before snapshot".to_string());
                SheetState::Error(Arc::new(SheetError::Restored(message)))
            }
            _ => SheetState::NotLoaded,
        };
        Sheet {
            id: self.id,
            display_name: self.display_name,
            state,
        }
    }
}
