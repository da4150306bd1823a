use serde::Deserialize;
use sheet_core::Result;
use std::path::Path;

/// Root configuration for the sheet loader.
///
/// Every section and field falls back to a default, so an empty JSON object
/// is a valid configuration.
///
/// # Examples
///
/// ```
/// use sheet_loader::config::LoaderConfig;
///
/// let json = r#"{
///     "restore": { "keep_errors": false },
///     "fetch": { "max_content_bytes": 4096 }
/// }"#;
///
/// let config: LoaderConfig = serde_json::from_str(json).unwrap();
/// assert!(!config.restore.keep_errors);
/// assert_eq!(config.fetch.max_content_bytes, 4096);
/// assert!(config.listing.skip_empty_groups);
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoaderConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl LoaderConfig {
    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Size limits applied to fetched sheet content.
///
/// # Defaults
///
/// - `max_content_bytes`: `10_000_000` (10MB, hard limit)
/// - `large_content_threshold`: `1_000_000` (1MB, logs a warning)
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: u64,
    #[serde(default = "default_large_content_threshold")]
    pub large_content_threshold: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_content_bytes: default_max_content_bytes(),
            large_content_threshold: default_large_content_threshold(),
        }
    }
}

impl FetchConfig {
    /// Rejects content over the hard limit and warns about large content.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::TooLarge` if `size` exceeds `max_content_bytes`.
    pub fn check_size(&self, size: u64, what: &str) -> Result<()> {
        if size > self.max_content_bytes {
            tracing::error!(
                "{} exceeds maximum size: {} bytes (limit: {} bytes)",
                what,
                size,
                self.max_content_bytes
            );
            return Err(sheet_core::SheetError::TooLarge {
                size,
                limit: self.max_content_bytes,
            });
        }
        if size > self.large_content_threshold {
            tracing::warn!(
                "{} is large: {} bytes. Typical sheets are <100KB.",
                what,
                size
            );
        }
        Ok(())
    }
}

/// Listing behavior.
///
/// # Defaults
///
/// - `skip_empty_groups`: `true`
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_true")]
    pub skip_empty_groups: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            skip_empty_groups: true,
        }
    }
}

/// Snapshot restore policy.
///
/// Live content is never part of a snapshot, so `Loaded` and `Loading`
/// records always come back as `NotLoaded` and reload on next access.
/// `keep_errors` decides whether failed records stay failed.
///
/// # Defaults
///
/// - `keep_errors`: `true`
#[derive(Debug, Clone, Deserialize)]
pub struct RestoreConfig {
    #[serde(default = "default_true")]
    pub keep_errors: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self { keep_errors: true }
    }
}

/// HTTP gateway settings.
///
/// # Defaults
///
/// - `timeout_secs`: `30`
/// - `user_agent`: `"sheet-loader/<version>"`
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(
        default = "default_user_agent",
        deserialize_with = "deserialize_user_agent"
    )]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions
const fn default_true() -> bool {
    true
}

const fn default_max_content_bytes() -> u64 {
    10_000_000 // 10MB
}

const fn default_large_content_threshold() -> u64 {
    1_000_000 // 1MB
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("sheet-loader/{}", env!("CARGO_PKG_VERSION"))
}

/// Maximum length for user_agent
const MAX_USER_AGENT_LENGTH: usize = 100;

fn validate_user_agent(text: String) -> String {
    if text.len() > MAX_USER_AGENT_LENGTH {
        tracing::warn!(
            "user_agent exceeded max length of {} chars, truncating from {} to {}",
            MAX_USER_AGENT_LENGTH,
            text.len(),
            MAX_USER_AGENT_LENGTH
        );
        text.chars().take(MAX_USER_AGENT_LENGTH).collect()
    } else {
        text
    }
}

fn deserialize_user_agent<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Ok(validate_user_agent(text))
}
