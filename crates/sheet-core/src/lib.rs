//! Core abstractions for sheet-loader.
//!
//! This crate provides the contracts shared by the loader and the concrete
//! content backends.
//!
//! # Architecture
//!
//! sheet-core defines:
//! - **Traits**: `FetchGateway`, `ListingProvider`, `ContentMaterializer`, `LiveDocument`
//! - **Data**: `SheetId`, `Status`, `SheetData`, `Revision`, `SheetGroupData`
//! - **Error Types**: `SheetError`, shared by every crate of the workspace
//!
//! # Examples
//!
//! Implementing a listing provider:
//!
//! ```no_run
//! use async_trait::async_trait;
//! use sheet_core::{ListingProvider, SheetGroupData, SheetId};
//!
//! struct OneGroup;
//!
//! #[async_trait]
//! impl ListingProvider for OneGroup {
//!     async fn fetch_groups(&self) -> sheet_core::Result<Vec<SheetGroupData>> {
//!         Ok(vec![SheetGroupData {
//!             id: 1,
//!             name: "Sales".into(),
//!             sheet_ids: vec![SheetId::new(10)],
//!         }])
//!     }
//!
//!     async fn fetch_sheet_names(
//!         &self,
//!         ids: &[SheetId],
//!     ) -> sheet_core::Result<Vec<(SheetId, String)>> {
//!         Ok(ids.iter().map(|id| (*id, format!("Sheet {id}"))).collect())
//!     }
//! }
//! ```

pub mod document;
pub mod error;
pub mod gateway;
pub mod sheet;

pub use document::{ContentMaterializer, LiveDocument, activate_first_sheet};
pub use error::{Result, SheetError};
pub use gateway::{FetchGateway, ListingProvider};
pub use sheet::{Revision, SheetData, SheetGroupData, SheetId, Status};
