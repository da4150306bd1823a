pub mod config;
pub mod gateway;
pub mod sheet;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use gateway::{DiskGateway, HttpGateway};
pub use sheet::{LoaderSnapshot, Sheet, SheetGroup, SheetLoader, SheetUpdate, UpdateKind};
pub use sheet_core::{Result, SheetError, SheetId, Status};
