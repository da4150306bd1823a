//! Spreadsheet workbook support for sheet-loader.
//!
//! Turns the workbook JSON stored by the backend plus its revision log into
//! a live [`WorkbookModel`]:
//!
//! 1. [`migrate`] upgrades old data versions
//! 2. revisions are replayed in order (`ADD_SHEET`, `UPDATE_CELL`, ...)
//! 3. a first evaluation pass computes cell values
//!
//! Formulas of the form `=DATA("key")` read from the model's
//! [`DataSources`]; updating a data source bumps the channel exposed through
//! [`LiveDocument::data_source_updates`](sheet_core::LiveDocument::data_source_updates).

pub mod data_sources;
pub mod materializer;
pub mod migration;
pub mod model;
pub mod revision;
pub mod types;

pub use data_sources::DataSources;
pub use materializer::WorkbookMaterializer;
pub use migration::migrate;
pub use model::WorkbookModel;
pub use revision::{Command, replay};
pub use types::{CURRENT_VERSION, CellData, CellValue, WorkbookData, WorksheetData};
