use crate::error::Result;
use crate::sheet::Revision;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A live, queryable document produced by a [`ContentMaterializer`].
///
/// Methods take `&self`: the document is shared between the loader, its
/// standing data-source listener and any number of readers, so implementors
/// use interior mutability.
pub trait LiveDocument: Send + Sync {
    /// Logical sub-sheets in document order.
    fn sheet_ids(&self) -> Vec<String>;

    /// Currently active sub-sheet, if the document has any.
    fn active_sheet_id(&self) -> Option<String>;

    /// Switches the active sub-sheet.
    ///
    /// # Errors
    ///
    /// Returns error if `to` is not a sheet of this document.
    fn activate_sheet(&self, from: &str, to: &str) -> Result<()>;

    /// Receives one message per arrival or change of external data the
    /// document depends on. No update is dropped or merged.
    fn data_source_updates(&self) -> mpsc::UnboundedReceiver<u64>;

    /// Recomputes every derived value of the document.
    fn evaluate(&self);

    /// Downcast to the concrete document type.
    fn as_any(&self) -> &dyn Any;
}

/// Builds live documents from serialized content and a replay log.
#[async_trait]
pub trait ContentMaterializer: Send + Sync {
    /// Parses `raw` and replays `revisions` on top of it, in order.
    ///
    /// # Errors
    ///
    /// Returns error if the content is malformed or a revision cannot be
    /// applied.
    async fn materialize(&self, raw: &str, revisions: &[Revision])
    -> Result<Arc<dyn LiveDocument>>;
}

/// Activates the first sub-sheet of `document` if another one is active.
///
/// Returns `true` when the active sheet changed.
///
/// # Errors
///
/// Propagates the document's refusal to activate the sheet.
pub fn activate_first_sheet(document: &dyn LiveDocument) -> Result<bool> {
    let Some(first) = document.sheet_ids().into_iter().next() else {
        return Ok(false);
    };
    match document.active_sheet_id() {
        Some(active) if active == first => Ok(false),
        Some(active) => {
            document.activate_sheet(&active, &first)?;
            Ok(true)
        }
        None => {
            document.activate_sheet("", &first)?;
            Ok(true)
        }
    }
}
