//! Replay of the change history on top of migrated workbook data.

use crate::types::{CellData, WorkbookData, WorksheetData};
use serde::Deserialize;
use sheet_core::{Result, Revision, SheetError};

/// Revision type carrying user commands. Other types (snapshot markers,
/// selection changes) carry nothing to replay.
const REMOTE_REVISION: &str = "REMOTE_REVISION";

#[derive(Debug, Deserialize)]
struct RevisionRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    commands: Vec<Command>,
}

/// A single workbook mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    AddSheet {
        #[serde(rename = "sheetId")]
        sheet_id: String,
        name: String,
        #[serde(default)]
        position: Option<usize>,
    },
    RenameSheet {
        #[serde(rename = "sheetId")]
        sheet_id: String,
        name: String,
    },
    DeleteSheet {
        #[serde(rename = "sheetId")]
        sheet_id: String,
    },
    UpdateCell {
        #[serde(rename = "sheetId")]
        sheet_id: String,
        cell: String,
        #[serde(default)]
        content: String,
    },
    ActivateSheet {
        #[serde(rename = "sheetIdFrom")]
        sheet_id_from: String,
        #[serde(rename = "sheetIdTo")]
        sheet_id_to: String,
    },
}

/// Replays `revisions` in order. Returns the number of commands applied.
///
/// # Errors
///
/// Returns [`SheetError::InvalidRevision`] for undecodable revisions and for
/// commands that reference unknown sheets.
pub fn replay(data: &mut WorkbookData, revisions: &[Revision]) -> Result<usize> {
    let mut applied = 0;

    for (index, revision) in revisions.iter().enumerate() {
        let record: RevisionRecord =
            serde_json::from_value(revision.as_value().clone()).map_err(|e| {
                SheetError::InvalidRevision {
                    revision: format!("#{index}"),
                    reason: e.to_string(),
                }
            })?;

        let label = record.id.clone().unwrap_or_else(|| format!("#{index}"));

        if record.kind != REMOTE_REVISION {
            tracing::trace!("skipping revision {} of type {}", label, record.kind);
            continue;
        }

        for command in &record.commands {
            apply(data, command).map_err(|reason| SheetError::InvalidRevision {
                revision: label.clone(),
                reason,
            })?;
            applied += 1;
        }
    }

    Ok(applied)
}

fn apply(data: &mut WorkbookData, command: &Command) -> std::result::Result<(), String> {
    match command {
        Command::AddSheet {
            sheet_id,
            name,
            position,
        } => {
            if find(data, sheet_id).is_some() {
                return Err(format!("sheet {sheet_id} already exists"));
            }
            let at = position.unwrap_or(data.sheets.len()).min(data.sheets.len());
            data.sheets
                .insert(at, WorksheetData::new(sheet_id.clone(), name.clone()));
        }
        Command::RenameSheet { sheet_id, name } => {
            let index = find(data, sheet_id).ok_or_else(|| unknown(sheet_id))?;
            data.sheets[index].name.clone_from(name);
        }
        Command::DeleteSheet { sheet_id } => {
            let index = find(data, sheet_id).ok_or_else(|| unknown(sheet_id))?;
            if data.sheets.len() == 1 {
                return Err(format!("cannot delete {sheet_id}, the last sheet"));
            }
            data.sheets.remove(index);
            if data.active_sheet.as_deref() == Some(sheet_id.as_str()) {
                data.active_sheet = data.sheets.first().map(|s| s.id.clone());
            }
        }
        Command::UpdateCell {
            sheet_id,
            cell,
            content,
        } => {
            let index = find(data, sheet_id).ok_or_else(|| unknown(sheet_id))?;
            let cells = &mut data.sheets[index].cells;
            if content.is_empty() {
                cells.remove(cell);
            } else {
                cells.insert(
                    cell.clone(),
                    CellData {
                        content: content.clone(),
                    },
                );
            }
        }
        Command::ActivateSheet { sheet_id_to, .. } => {
            find(data, sheet_id_to).ok_or_else(|| unknown(sheet_id_to))?;
            data.active_sheet = Some(sheet_id_to.clone());
        }
    }
    Ok(())
}

fn find(data: &WorkbookData, sheet_id: &str) -> Option<usize> {
    data.sheets.iter().position(|s| s.id == sheet_id)
}

fn unknown(sheet_id: &str) -> String {
    format!("unknown sheet {sheet_id}")
}
