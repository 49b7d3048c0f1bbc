//! Settings structures for MultiSearch-RS configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub search: SearchSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (MULTISEARCH_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("MULTISEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("MULTISEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("MULTISEARCH_BACKEND_URL") {
            self.backend.url = val;
        }
        if let Ok(val) = std::env::var("MULTISEARCH_BACKEND_API_KEY") {
            self.backend.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("MULTISEARCH_MAX_CONCURRENCY") {
            // "unbounded" restores one unit per query with no ceiling
            match val.trim() {
                "unbounded" => self.search.max_concurrency = None,
                other => {
                    if let Ok(n) = other.parse() {
                        self.search.max_concurrency = Some(n);
                    }
                }
            }
        }
        if let Ok(val) = std::env::var("MULTISEARCH_QUERY_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.search.query_timeout = secs;
            }
        }
    }

    /// Check settings for values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.default_limit == 0 {
            bail!("search.default_limit must be at least 1");
        }
        if search.max_limit < search.default_limit {
            bail!(
                "search.max_limit ({}) must not be below search.default_limit ({})",
                search.max_limit,
                search.default_limit
            );
        }
        if search.max_concurrency == Some(0) {
            bail!("search.max_concurrency must be at least 1 (omit it for unbounded)");
        }
        check_timeout("search.query_timeout", search.query_timeout)?;
        check_timeout("backend.request_timeout", self.backend.request_timeout)?;
        url::Url::parse(&self.backend.url)
            .map_err(|e| anyhow::anyhow!("invalid backend.url '{}': {}", self.backend.url, e))?;
        if self.backend.class_name.trim().is_empty() {
            bail!("backend.class_name must not be empty");
        }
        Ok(())
    }
}

/// A timeout must be positive and fit in a `Duration`
fn check_timeout(name: &str, secs: f64) -> Result<()> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(()),
        Ok(_) => bail!("{} must be positive", name),
        Err(e) => bail!("{} = {} is not a usable duration: {}", name, secs, e),
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Allow cross-origin requests
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
            cors: true,
        }
    }
}

/// Vector database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the vector database
    pub url: String,
    /// Collection (class) holding the searchable items
    pub class_name: String,
    /// Property holding the item label
    pub label_field: String,
    /// Property holding the base64 image blob
    pub image_field: String,
    /// Bearer token sent with every request
    pub api_key: Option<String>,
    /// Transport-level request timeout in seconds
    pub request_timeout: f64,
    /// Idle connections kept per host
    pub pool_maxsize: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            class_name: "Image".to_string(),
            label_field: "text".to_string(),
            image_field: "image".to_string(),
            api_key: None,
            request_timeout: 10.0,
            pool_maxsize: 32,
        }
    }
}

/// Fan-out behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Results per query when the request does not name a limit
    pub default_limit: usize,
    /// Upper bound applied to requested limits
    pub max_limit: usize,
    /// Maximum backend calls in flight per request (None = one per query)
    pub max_concurrency: Option<usize>,
    /// Deadline for a single query in seconds
    pub query_timeout: f64,
}

impl SearchSettings {
    /// Per-query deadline; out-of-range values saturate instead of panicking
    pub fn query_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.query_timeout).unwrap_or(Duration::MAX)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 3,
            max_limit: 100,
            max_concurrency: Some(16),
            query_timeout: 5.0,
        }
    }
}
