//! Credential stores
//!
//! A store maps an opaque provider key (e.g. `gitlab`) to credentials.
//! Lookups are read-only and may be issued concurrently.

use super::types::Credentials;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Source of registry credentials keyed by provider
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up credentials for a provider
    ///
    /// Returns `Ok(None)` when the store has nothing for this key; errors are
    /// reserved for a store that cannot be read at all.
    async fn get(&self, provider: &str) -> Result<Option<Credentials>>;
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, Credentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single entry
    pub fn with_entry(provider: impl Into<String>, credentials: Credentials) -> Self {
        let mut entries = HashMap::new();
        entries.insert(provider.into(), credentials);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Insert or replace credentials for a provider
    pub async fn insert(&self, provider: impl Into<String>, credentials: Credentials) {
        self.entries.write().await.insert(provider.into(), credentials);
    }

    /// Remove credentials for a provider
    pub async fn remove(&self, provider: &str) -> Option<Credentials> {
        self.entries.write().await.remove(provider)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, provider: &str) -> Result<Option<Credentials>> {
        Ok(self.entries.read().await.get(provider).cloned())
    }
}

// ============================================================================
// Environment Store
// ============================================================================

/// Credential store backed by environment variables
///
/// For prefix `GITLAB_REGISTRY` and provider `gitlab.com`, it reads
/// `GITLAB_REGISTRY_GITLAB_COM_TOKEN`, or `GITLAB_REGISTRY_GITLAB_COM_USERNAME`
/// together with `GITLAB_REGISTRY_GITLAB_COM_PASSWORD`. A token wins over a
/// username/password pair.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl EnvCredentialStore {
    /// Create a store reading variables under the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Name of the variable holding `suffix` for a provider
    pub fn var_name(&self, provider: &str, suffix: &str) -> String {
        let key: String = provider
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_{key}_{suffix}", self.prefix)
    }

    fn read(&self, provider: &str, suffix: &str) -> Option<String> {
        std::env::var(self.var_name(provider, suffix))
            .ok()
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, provider: &str) -> Result<Option<Credentials>> {
        if let Some(token) = self.read(provider, "TOKEN") {
            return Ok(Some(Credentials::Token(token)));
        }
        match (
            self.read(provider, "USERNAME"),
            self.read(provider, "PASSWORD"),
        ) {
            (Some(username), Some(password)) => Ok(Some(Credentials::Basic { username, password })),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// File Store
// ============================================================================

/// Credential store backed by a YAML file
///
/// ```yaml
/// gitlab:
///   token: glpat-xxxx
/// self-hosted:
///   username: deployer
///   password: s3cret
/// ```
///
/// The file is read on every lookup; a missing file behaves as an empty
/// store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, Credentials>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidCredentials {
            message: format!("{}: {e}", self.path.display()),
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, provider: &str) -> Result<Option<Credentials>> {
        let mut entries = self.load().await?;
        Ok(entries.remove(provider))
    }
}
