use crate::error::Result;
use crate::sheet::{SheetData, SheetGroupData, SheetId};
use async_trait::async_trait;

/// Source of sheet content.
///
/// Implementors retrieve the raw serialized content of one sheet together
/// with its change history. Any error returned here is stored verbatim in
/// the sheet record; the loader never retries.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use sheet_core::{FetchGateway, SheetData, SheetId};
///
/// struct Static;
///
/// #[async_trait]
/// impl FetchGateway for Static {
///     async fn fetch(&self, _id: SheetId) -> sheet_core::Result<SheetData> {
///         Ok(SheetData {
///             raw: r#"{"version": 1, "sheets": []}"#.into(),
///             revisions: vec![],
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Fetches raw content and revisions for one sheet.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The sheet is unknown to the backend
    /// - The transport fails or access is denied
    /// - The response cannot be decoded
    async fn fetch(&self, id: SheetId) -> Result<SheetData>;
}

/// Source of the dashboard listing: groups and sheet display names.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Fetches every group, in presentation order.
    async fn fetch_groups(&self) -> Result<Vec<SheetGroupData>>;

    /// Fetches display names for the given sheets.
    ///
    /// Ids unknown to the backend may be omitted from the result.
    async fn fetch_sheet_names(&self, ids: &[SheetId]) -> Result<Vec<(SheetId, String)>>;
}
