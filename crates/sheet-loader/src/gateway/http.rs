//! HTTP gateway for a dashboard backend.
//!
//! Endpoints, relative to the base URL:
//!
//! - `GET /sheets/{id}` → `{"name": "...", "data": "<raw json>", "revisions": [...]}`
//! - `GET /groups` → `[{"id": 1, "name": "...", "sheet_ids": [10, 20]}]`
//! - `GET /sheets?ids=10,20` → `[{"id": 10, "name": "..."}]`

use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sheet_core::{
    FetchGateway, ListingProvider, Result, Revision, SheetData, SheetError, SheetGroupData,
    SheetId,
};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SheetResponse {
    data: String,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct SheetNameResponse {
    id: SheetId,
    name: String,
}

/// Fetches sheets and the listing from a dashboard HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Creates a gateway for `base_url` (without trailing slash).
    ///
    /// # Errors
    ///
    /// Returns `SheetError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SheetError::Http {
                url: base_url.clone(),
                source: e,
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// Non-2xx statuses are turned into an error by `on_status`.
    async fn get(
        &self,
        url: &str,
        on_status: impl FnOnce(String) -> SheetError + Send,
    ) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SheetError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP {} for {}", status, url);
            return Err(on_status(format!("HTTP {status} for {url}")));
        }

        let body = response.bytes().await.map_err(|e| SheetError::Http {
            url: url.to_string(),
            source: e,
        })?;
        Ok(body.to_vec())
    }

    async fn get_listing<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url, SheetError::Listing).await?;
        serde_json::from_slice(&body)
            .map_err(|e| SheetError::Listing(format!("invalid response from {url}: {e}")))
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    async fn fetch(&self, id: SheetId) -> Result<SheetData> {
        let url = format!("{}/sheets/{}", self.base_url, id);
        let gateway_error = |reason: String| SheetError::Gateway {
            sheet_id: id,
            reason,
        };

        let body = self.get(&url, gateway_error).await?;
        let response: SheetResponse = serde_json::from_slice(&body)
            .map_err(|e| gateway_error(format!("invalid response: {e}")))?;

        Ok(SheetData {
            raw: response.data,
            revisions: response.revisions,
        })
    }
}

#[async_trait]
impl ListingProvider for HttpGateway {
    async fn fetch_groups(&self) -> Result<Vec<SheetGroupData>> {
        let url = format!("{}/groups", self.base_url);
        self.get_listing(&url).await
    }

    async fn fetch_sheet_names(&self, ids: &[SheetId]) -> Result<Vec<(SheetId, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids_param = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/sheets?ids={}", self.base_url, ids_param);

        let names: Vec<SheetNameResponse> = self.get_listing(&url).await?;
        Ok(names.into_iter().map(|n| (n.id, n.name)).collect())
    }
}
