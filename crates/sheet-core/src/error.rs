use crate::sheet::SheetId;
use thiserror::Error;

/// Core error types for sheet-loader.
///
/// `NotFound` is a caller error surfaced directly by the loader. Every other
/// variant describes a failed fetch: the loader captures it into the sheet
/// record (status `Error`) instead of returning it, so transport failures and
/// materialization failures look the same to the presentation layer.
///
/// # Examples
///
/// ```
/// use sheet_core::error::{Result, SheetError};
/// use sheet_core::SheetId;
///
/// fn lookup(id: SheetId, known: &[SheetId]) -> Result<SheetId> {
///     if !known.contains(&id) {
///         return Err(SheetError::NotFound(id));
///     }
///     Ok(id)
/// }
///
/// assert!(lookup(SheetId::new(1), &[]).is_err());
/// ```
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("sheet {0} does not exist")]
    NotFound(SheetId),

    #[error("failed to fetch sheet {sheet_id}: {reason}")]
    Gateway { sheet_id: SheetId, reason: String },

    #[error("request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("content too large: {size} bytes (max: {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("failed to materialize document: {0}")]
    Materialize(String),

    #[error("invalid revision {revision}: {reason}")]
    InvalidRevision { revision: String, reason: String },

    #[error("listing unavailable: {0}")]
    Listing(String),

    #[error("{0}")]
    Restored(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for `Result<T, SheetError>`.
pub type Result<T> = std::result::Result<T, SheetError>;
