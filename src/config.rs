use crate::storage::DEFAULT_OVERLAY_KEY;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api/character";

/// Sync engine configuration
///
/// Built with setters or read from `CATALOG_*` environment variables.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Endpoint of the remote catalog's entity collection
    pub base_url: String,

    /// Directory holding the overlay files
    pub data_dir: PathBuf,

    /// Key the overlay list is stored under
    pub storage_key: String,

    /// Timeout applied to every remote request
    pub request_timeout: Duration,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(".catalog-overlay"),
            storage_key: DEFAULT_OVERLAY_KEY.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Set the remote catalog endpoint
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the overlay directory
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the overlay storage key
    pub fn storage_key(mut self, key: &str) -> Self {
        self.storage_key = key.to_string();
        self
    }

    /// Set the remote request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read overrides from the process environment
    ///
    /// Recognised: `CATALOG_BASE_URL`, `CATALOG_DATA_DIR`,
    /// `CATALOG_STORAGE_KEY`, `CATALOG_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(url) = lookup("CATALOG_BASE_URL") {
            config = config.base_url(&url);
        }
        if let Some(dir) = lookup("CATALOG_DATA_DIR") {
            config = config.data_dir(dir);
        }
        if let Some(key) = lookup("CATALOG_STORAGE_KEY") {
            config = config.storage_key(&key);
        }
        if let Some(secs) = lookup("CATALOG_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| format!("CATALOG_TIMEOUT_SECS must be an integer, got '{}'", secs))?;
            config = config.request_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url must be http(s), got '{}'", self.base_url));
        }

        if self.storage_key.trim().is_empty() {
            return Err("storage_key cannot be empty".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
