//! Identifiers and plain data exchanged between the loader and its gateways.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a sheet record.
///
/// # Examples
///
/// ```
/// use sheet_core::SheetId;
///
/// let id: SheetId = 10.into();
/// assert_eq!(id.get(), 10);
/// assert_eq!(id.to_string(), "10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(u64);

impl SheetId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SheetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load status of a sheet record.
///
/// Statuses only move forward: `NotLoaded → Loading → {Loaded | Error}`.
/// The only way back is restoring a whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Error,
}

impl Status {
    /// Returns `true` for `Loaded` and `Error`, the statuses a fetch ends in.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotLoaded => "NotLoaded",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// One entry of a sheet's change history.
///
/// Opaque to the loader; only the materializer interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(serde_json::Value);

impl Revision {
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// Raw content of a sheet plus its ordered change history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetData {
    pub raw: String,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

/// A named section of the dashboard listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetGroupData {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub sheet_ids: Vec<SheetId>,
}
