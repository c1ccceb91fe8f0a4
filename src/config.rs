//! Configuration for the registry lister
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file)
//! targets gitlab.com with credentials taken from the environment.
//!
//! ```yaml
//! base_url: https://gitlab.example.com
//! registry_host: registry.example.com
//! page_size: 50
//! timeout_secs: 10
//! provider: gitlab-example
//! credentials_file: ~/.config/gitlab-registry-lister/credentials.yaml
//! ```

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::registry::{DEFAULT_PAGE_SIZE, GITLAB_REGISTRY_HOST};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default GitLab instance
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com";

/// Default credential provider key
pub const DEFAULT_PROVIDER: &str = "gitlab";

/// Default prefix of credential environment variables
pub const DEFAULT_ENV_PREFIX: &str = "GITLAB_REGISTRY";

/// Lister configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListerConfig {
    /// GitLab instance root
    pub base_url: String,

    /// Registry host used to build image paths
    pub registry_host: String,

    /// Repositories requested per page
    pub page_size: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent override
    pub user_agent: Option<String>,

    /// Credential provider key
    pub provider: String,

    /// YAML credentials file; when unset, credentials come from the environment
    pub credentials_file: Option<PathBuf>,

    /// Prefix of credential environment variables
    pub env_prefix: String,
}

impl Default for ListerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            registry_host: GITLAB_REGISTRY_HOST.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 30,
            user_agent: None,
            provider: DEFAULT_PROVIDER.to_string(),
            credentials_file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl ListerConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML config
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field values
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidPageSize(self.page_size));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than zero"));
        }
        if self.registry_host.trim().is_empty() {
            return Err(Error::config("registry_host must not be empty"));
        }
        if self.provider.trim().is_empty() {
            return Err(Error::config("provider must not be empty"));
        }
        Ok(())
    }

    /// HTTP client settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder =
            HttpClientConfig::builder().timeout(Duration::from_secs(self.timeout_secs));
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }
}
