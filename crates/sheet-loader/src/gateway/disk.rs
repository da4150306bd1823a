//! Filesystem gateway.
//!
//! Reads a dashboard directory laid out as:
//!
//! ```text
//! <root>/listing.json          groups and display names
//! <root>/<id>.json             raw workbook content
//! <root>/<id>.revisions.json   optional revision log (JSON array)
//! ```
//!
//! `listing.json`:
//!
//! ```json
//! {
//!   "groups": [{ "id": 1, "name": "Sales", "sheet_ids": [10, 20] }],
//!   "sheets": [{ "id": 10, "name": "Revenue" }, { "id": 20, "name": "Costs" }]
//! }
//! ```

use crate::config::FetchConfig;
use async_trait::async_trait;
use serde::Deserialize;
use sheet_core::{
    FetchGateway, ListingProvider, Result, Revision, SheetData, SheetError, SheetGroupData,
    SheetId,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const LISTING_FILE: &str = "listing.json";

#[derive(Debug, Default, Deserialize)]
struct Listing {
    #[serde(default)]
    groups: Vec<SheetGroupData>,
    #[serde(default)]
    sheets: Vec<SheetName>,
}

#[derive(Debug, Deserialize)]
struct SheetName {
    id: SheetId,
    name: String,
}

/// Serves sheets and the listing from a local directory.
#[derive(Debug, Clone)]
pub struct DiskGateway {
    root: PathBuf,
    limits: FetchConfig,
}

impl DiskGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_limits(root, FetchConfig::default())
    }

    pub fn with_limits(root: impl Into<PathBuf>, limits: FetchConfig) -> Self {
        Self {
            root: root.into(),
            limits,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sheet_path(&self, id: SheetId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    fn revisions_path(&self, id: SheetId) -> PathBuf {
        self.root.join(format!("{id}.revisions.json"))
    }

    async fn read_listing(&self) -> Result<Listing> {
        let path = self.root.join(LISTING_FILE);
        let Some(content) = self.read_file(&path).await? else {
            tracing::debug!("no listing at {:?}, treating as empty", path);
            return Ok(Listing::default());
        };
        serde_json::from_str(&content)
            .map_err(|e| SheetError::Listing(format!("invalid {}: {}", path.display(), e)))
    }

    /// Reads a file after checking its size. `Ok(None)` if it does not exist.
    async fn read_file(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => {
                let what = path.display().to_string();
                self.limits.check_size(metadata.len(), &what)?;
                tracing::trace!("file size: {} bytes", metadata.len());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("file not found: {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(log_io_error(path, e)),
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                tracing::debug!("read {:?} ({} bytes)", path, content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("file not found during read: {:?}", path);
                Ok(None)
            }
            Err(e) => Err(log_io_error(path, e)),
        }
    }
}

fn log_io_error(path: &Path, e: std::io::Error) -> SheetError {
    match e.kind() {
        ErrorKind::PermissionDenied => {
            tracing::warn!("permission denied: {:?}", path);
        }
        _ => {
            tracing::error!("IO error reading {:?}: {}", path, e);
        }
    }
    SheetError::Io(e)
}

#[async_trait]
impl FetchGateway for DiskGateway {
    async fn fetch(&self, id: SheetId) -> Result<SheetData> {
        let path = self.sheet_path(id);
        let raw = self
            .read_file(&path)
            .await?
            .ok_or_else(|| SheetError::Gateway {
                sheet_id: id,
                reason: format!("no content at {}", path.display()),
            })?;

        let revisions: Vec<Revision> = match self.read_file(&self.revisions_path(id)).await? {
            Some(content) => serde_json::from_str(&content).map_err(|e| SheetError::Gateway {
                sheet_id: id,
                reason: format!("invalid revision log: {e}"),
            })?,
            None => Vec::new(),
        };

        Ok(SheetData { raw, revisions })
    }
}

#[async_trait]
impl ListingProvider for DiskGateway {
    async fn fetch_groups(&self) -> Result<Vec<SheetGroupData>> {
        Ok(self.read_listing().await?.groups)
    }

    async fn fetch_sheet_names(&self, ids: &[SheetId]) -> Result<Vec<(SheetId, String)>> {
        let listing = self.read_listing().await?;
        Ok(listing
            .sheets
            .into_iter()
            .filter(|sheet| ids.contains(&sheet.id))
            .map(|sheet| (sheet.id, sheet.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_without_revisions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "10.json", r#"{"version": 1, "sheets": []}"#);

        let gateway = DiskGateway::new(dir.path());
        let data = gateway.fetch(SheetId::new(10)).await.unwrap();

        assert_eq!(data.raw, r#"{"version": 1, "sheets": []}"#);
        assert!(data.revisions.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_with_revisions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "10.json", "{}");
        write(
            &dir,
            "10.revisions.json",
            r#"[{"id": "r1", "type": "REMOTE_REVISION", "commands": []}]"#,
        );

        let data = DiskGateway::new(dir.path())
            .fetch(SheetId::new(10))
            .await
            .unwrap();

        assert_eq!(data.revisions.len(), 1);
        assert_eq!(data.revisions[0].as_value()["id"], "r1");
    }

    #[tokio::test]
    async fn test_fetch_missing_sheet() {
        let dir = TempDir::new().unwrap();
        let err = DiskGateway::new(dir.path())
            .fetch(SheetId::new(404))
            .await
            .unwrap_err();

        assert!(matches!(err, SheetError::Gateway { sheet_id, .. } if sheet_id == SheetId::new(404)));
    }

    #[tokio::test]
    async fn test_fetch_invalid_revision_log() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.json", "{}");
        write(&dir, "1.revisions.json", "{ not an array");

        let err = DiskGateway::new(dir.path())
            .fetch(SheetId::new(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid revision log"));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.json", &"x".repeat(64));

        let limits = FetchConfig {
            max_content_bytes: 32,
            large_content_threshold: 16,
        };
        let err = DiskGateway::with_limits(dir.path(), limits)
            .fetch(SheetId::new(1))
            .await
            .unwrap_err();

        assert!(matches!(err, SheetError::TooLarge { size: 64, limit: 32 }));
    }

    #[tokio::test]
    async fn test_listing() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "listing.json",
            r#"{
                "groups": [{ "id": 1, "name": "Sales", "sheet_ids": [10, 20] }],
                "sheets": [{ "id": 10, "name": "Revenue" }, { "id": 20, "name": "Costs" }]
            }"#,
        );

        let gateway = DiskGateway::new(dir.path());
        let groups = gateway.fetch_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sheet_ids, vec![SheetId::new(10), SheetId::new(20)]);

        let names = gateway
            .fetch_sheet_names(&[SheetId::new(20), SheetId::new(99)])
            .await
            .unwrap();
        assert_eq!(names, vec![(SheetId::new(20), "Costs".to_string())]);
    }

    #[test]
    fn test_missing_listing_is_empty() {
        let dir = TempDir::new().unwrap();
        let gateway = DiskGateway::new(dir.path());

        let groups = tokio_test::block_on(gateway.fetch_groups()).unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_listing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "listing.json", "[1, 2");

        let err = DiskGateway::new(dir.path())
            .fetch_groups()
            .await
            .unwrap_err();
        assert!(matches!(err, SheetError::Listing(_)));
    }
}
