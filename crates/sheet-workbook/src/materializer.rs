use crate::migration::migrate;
use crate::model::WorkbookModel;
use crate::revision::replay;
use async_trait::async_trait;
use sheet_core::{ContentMaterializer, LiveDocument, Result, Revision};
use std::sync::Arc;

/// Materializes stored workbook JSON into a [`WorkbookModel`].
///
/// Pipeline: migrate the raw content to the current version, replay the
/// revisions in order, then run a first evaluation pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkbookMaterializer;

impl WorkbookMaterializer {
    pub const fn new() -> Self {
        Self
    }

    /// Builds the concrete model, for callers that want the typed value.
    ///
    /// # Errors
    ///
    /// Returns error if migration or revision replay fails.
    pub fn build(raw: &str, revisions: &[Revision]) -> Result<WorkbookModel> {
        let mut data = migrate(raw)?;
        let applied = replay(&mut data, revisions)?;
        tracing::debug!(
            "materialized workbook: {} sheets, {} commands replayed",
            data.sheets.len(),
            applied
        );

        let model = WorkbookModel::new(data);
        model.evaluate();
        Ok(model)
    }
}

#[async_trait]
impl ContentMaterializer for WorkbookMaterializer {
    async fn materialize(
        &self,
        raw: &str,
        revisions: &[Revision],
    ) -> Result<Arc<dyn LiveDocument>> {
        let model = Self::build(raw, revisions)?;
        Ok(Arc::new(model))
    }
}
