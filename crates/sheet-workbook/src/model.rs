//! Live workbook model.

use crate::data_sources::DataSources;
use crate::types::{CellValue, WorkbookData};
use sheet_core::{LiveDocument, Result, SheetError};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc;

/// Queryable workbook built from migrated data plus replayed revisions.
///
/// Values are computed by [`evaluate`](LiveDocument::evaluate); until the
/// first evaluation every cell reads as [`CellValue::Empty`].
///
/// # Examples
///
/// ```
/// use sheet_core::LiveDocument;
/// use sheet_workbook::{CellValue, WorkbookData, WorkbookModel};
///
/// let model = WorkbookModel::new(WorkbookData::empty());
/// model.evaluate();
///
/// assert_eq!(model.sheet_ids(), vec!["sheet1".to_string()]);
/// assert_eq!(model.cell_value("sheet1", "A1"), CellValue::Empty);
/// ```
#[derive(Debug)]
pub struct WorkbookModel {
    state: RwLock<WorkbookState>,
    data_sources: DataSources,
}

#[derive(Debug)]
struct WorkbookState {
    data: WorkbookData,
    values: HashMap<(String, String), CellValue>,
    evaluations: u64,
}

impl WorkbookModel {
    pub fn new(data: WorkbookData) -> Self {
        Self {
            state: RwLock::new(WorkbookState {
                data,
                values: HashMap::new(),
                evaluations: 0,
            }),
            data_sources: DataSources::new(),
        }
    }

    /// External data this workbook's formulas read from.
    pub const fn data_sources(&self) -> &DataSources {
        &self.data_sources
    }

    pub fn sheet_name(&self, sheet_id: &str) -> Option<String> {
        self.read(|state| {
            state
                .data
                .sheets
                .iter()
                .find(|s| s.id == sheet_id)
                .map(|s| s.name.clone())
        })
    }

    /// Raw content of a cell as typed by the user.
    pub fn cell_content(&self, sheet_id: &str, cell: &str) -> Option<String> {
        self.read(|state| {
            state
                .data
                .sheets
                .iter()
                .find(|s| s.id == sheet_id)
                .and_then(|s| s.cells.get(cell))
                .map(|c| c.content.clone())
        })
    }

    /// Value of a cell as of the last evaluation.
    pub fn cell_value(&self, sheet_id: &str, cell: &str) -> CellValue {
        self.read(|state| {
            state
                .values
                .get(&(sheet_id.to_string(), cell.to_string()))
                .cloned()
                .unwrap_or(CellValue::Empty)
        })
    }

    /// Number of evaluation passes run so far.
    pub fn evaluation_count(&self) -> u64 {
        self.read(|state| state.evaluations)
    }

    /// Copy of the current workbook data, e.g. for saving.
    pub fn export(&self) -> WorkbookData {
        self.read(|state| state.data.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&WorkbookState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn evaluate_content(&self, content: &str) -> CellValue {
        if let Some(key) = data_key(content) {
            return match self.data_sources.get(key) {
                Some(serde_json::Value::Number(n)) => {
                    n.as_f64().map_or(CellValue::Pending, CellValue::Number)
                }
                Some(serde_json::Value::String(s)) => CellValue::Text(s),
                Some(serde_json::Value::Null) | None => CellValue::Pending,
                Some(other) => CellValue::Text(other.to_string()),
            };
        }
        match content.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(content.to_string()),
        }
    }
}

/// Extracts `key` from `=DATA("key")`.
fn data_key(content: &str) -> Option<&str> {
    content
        .trim()
        .strip_prefix("=DATA(\"")?
        .strip_suffix("\")")
}

impl LiveDocument for WorkbookModel {
    fn sheet_ids(&self) -> Vec<String> {
        self.read(|state| state.data.sheets.iter().map(|s| s.id.clone()).collect())
    }

    fn active_sheet_id(&self) -> Option<String> {
        self.read(|state| {
            state
                .data
                .active_sheet
                .clone()
                .or_else(|| state.data.sheets.first().map(|s| s.id.clone()))
        })
    }

    fn activate_sheet(&self, from: &str, to: &str) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.data.sheets.iter().any(|s| s.id == to) {
            return Err(SheetError::Materialize(format!(
                "cannot activate unknown sheet {to}"
            )));
        }
        tracing::trace!("activating sheet {} (was {})", to, from);
        state.data.active_sheet = Some(to.to_string());
        Ok(())
    }

    fn data_source_updates(&self) -> mpsc::UnboundedReceiver<u64> {
        self.data_sources.subscribe()
    }

    fn evaluate(&self) {
        let cells: Vec<(String, String, String)> = self.read(|state| {
            state
                .data
                .sheets
                .iter()
                .flat_map(|sheet| {
                    sheet
                        .cells
                        .iter()
                        .map(|(cell, data)| (sheet.id.clone(), cell.clone(), data.content.clone()))
                })
                .collect()
        });

        let values: HashMap<(String, String), CellValue> = cells
            .into_iter()
            .map(|(sheet, cell, content)| {
                let value = self.evaluate_content(&content);
                ((sheet, cell), value)
            })
            .collect();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.values = values;
        state.evaluations += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
