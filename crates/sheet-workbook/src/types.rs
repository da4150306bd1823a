use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current workbook data version.
pub const CURRENT_VERSION: u64 = 1;

/// Serialized workbook as stored by the backend.
///
/// # Examples
///
/// ```
/// use sheet_workbook::WorkbookData;
///
/// let data: WorkbookData = serde_json::from_str(
///     r#"{"version": 1, "sheets": [{"id": "sheet1", "name": "Sheet1"}]}"#,
/// ).unwrap();
///
/// assert_eq!(data.sheets.len(), 1);
/// assert!(data.sheets[0].cells.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookData {
    pub version: u64,
    pub sheets: Vec<WorksheetData>,
    #[serde(default, rename = "activeSheet", skip_serializing_if = "Option::is_none")]
    pub active_sheet: Option<String>,
}

impl WorkbookData {
    /// Workbook with a single empty `Sheet1`, the backend's default content.
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            sheets: vec![WorksheetData::new("sheet1", "Sheet1")],
            active_sheet: None,
        }
    }
}

/// One tab of a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetData {
    pub id: String,
    pub name: String,
    /// Cell content keyed by reference (`"A1"`).
    #[serde(default)]
    pub cells: BTreeMap<String, CellData>,
}

impl WorksheetData {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellData {
    pub content: String,
}

/// Evaluated value of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    /// The cell reads external data that has not arrived yet.
    Pending,
}
