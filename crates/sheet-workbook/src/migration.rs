//! Upgrades stored workbook JSON to the current data version.
//!
//! Version 0 is anything written before the `version` key existed: the
//! `sheets` array may be missing and sheets may lack an `id`.

use crate::types::{CURRENT_VERSION, WorkbookData};
use serde_json::{Map, Value, json};
use sheet_core::{Result, SheetError};

/// Parses raw workbook content and migrates it to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns error if the content is not a JSON object, was written by a newer
/// version, or does not match the workbook shape after migration.
///
/// # Examples
///
/// ```
/// use sheet_workbook::migrate;
///
/// let data = migrate("{}").unwrap();
/// assert_eq!(data.version, 1);
/// assert_eq!(data.sheets[0].name, "Sheet1");
/// ```
pub fn migrate(raw: &str) -> Result<WorkbookData> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(mut object) = value else {
        return Err(SheetError::Materialize(
            "workbook content must be a JSON object".into(),
        ));
    };

    let version = object.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > CURRENT_VERSION {
        return Err(SheetError::Materialize(format!(
            "unsupported workbook version {version} (latest: {CURRENT_VERSION})"
        )));
    }

    if version == 0 {
        tracing::debug!("migrating workbook from version 0");
        migrate_v0(&mut object);
    }

    Ok(serde_json::from_value(Value::Object(object))?)
}

fn migrate_v0(object: &mut Map<String, Value>) {
    let sheets = object
        .entry("sheets")
        .or_insert_with(|| Value::Array(Vec::new()));

    if let Value::Array(sheets) = sheets {
        if sheets.is_empty() {
            sheets.push(json!({ "id": "sheet1", "name": "Sheet1" }));
        }
        for (index, sheet) in sheets.iter_mut().enumerate() {
            if let Value::Object(sheet) = sheet {
                let position = index + 1;
                sheet
                    .entry("id")
                    .or_insert_with(|| Value::String(format!("sheet{position}")));
                sheet
                    .entry("name")
                    .or_insert_with(|| Value::String(format!("Sheet{position}")));
            }
        }
    }

    object.insert("version".into(), Value::from(CURRENT_VERSION));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_passes_through() {
        let data = migrate(r#"{"version": 1, "sheets": [{"id": "a", "name": "A"}]}"#).unwrap();
        assert_eq!(data.sheets.len(), 1);
        assert_eq!(data.sheets[0].id, "a");
    }

    #[test]
    fn test_v0_without_sheets_gets_default() {
        let data = migrate("{}").unwrap();
        assert_eq!(data, WorkbookData::empty());
    }

    #[test]
    fn test_v0_assigns_missing_ids_and_names() {
        let data = migrate(r#"{"sheets": [{"name": "Budget"}, {}]}"#).unwrap();
        assert_eq!(data.sheets[0].id, "sheet1");
        assert_eq!(data.sheets[0].name, "Budget");
        assert_eq!(data.sheets[1].id, "sheet2");
        assert_eq!(data.sheets[1].name, "Sheet2");
    }

    #[test]
    fn test_future_version_rejected() {
        let err = migrate(r#"{"version": 99, "sheets": []}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported workbook version 99"));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = migrate("[1, 2]").unwrap_err();
        assert!(matches!(err, SheetError::Materialize(_)));
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let err = migrate("{not json").unwrap_err();
        assert!(matches!(err, SheetError::Json(_)));
    }
}
