//! Authenticator implementations
//!
//! Handles attaching credentials to requests and caching store lookups.

use super::store::CredentialStore;
use super::types::{CachedCredentials, Credentials};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Request;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Attaches credentials to outgoing registry requests
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Return the request with credentials attached
    async fn attach(&self, request: Request) -> Result<Request>;
}

/// No authentication (public registries)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn attach(&self, request: Request) -> Result<Request> {
        Ok(request)
    }
}

/// Fixed credentials for every request
#[derive(Debug, Clone)]
pub struct StaticAuth {
    credentials: Credentials,
}

impl StaticAuth {
    /// Create an authenticator with fixed credentials
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl Authenticator for StaticAuth {
    async fn attach(&self, mut request: Request) -> Result<Request> {
        self.credentials.apply(&mut request)?;
        Ok(request)
    }
}

/// Authenticator that resolves credentials lazily from a store
///
/// The first successful lookup is cached; concurrent callers for the same
/// provider observe the same value. A missing entry is not cached, so
/// credentials added to the store later are picked up.
pub struct StoreAuthenticator {
    store: Arc<dyn CredentialStore>,
    provider: String,
    cache_ttl_seconds: Option<i64>,
    cached: Arc<RwLock<Option<CachedCredentials>>>,
}

impl StoreAuthenticator {
    /// Create an authenticator for a provider key
    pub fn new(store: Arc<dyn CredentialStore>, provider: impl Into<String>) -> Self {
        Self {
            store,
            provider: provider.into(),
            cache_ttl_seconds: None,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Re-read the store after the cached value is this many seconds old
    #[must_use]
    pub fn with_cache_ttl(mut self, seconds: i64) -> Self {
        self.cache_ttl_seconds = Some(seconds);
        self
    }

    /// Provider key used for lookups
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Get credentials, consulting the store if nothing valid is cached
    pub async fn credentials(&self) -> Result<Credentials> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if !entry.is_expired() {
                    return Ok(entry.credentials.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;

        // Another task may have filled the cache while we waited
        if let Some(entry) = cached.as_ref() {
            if !entry.is_expired() {
                return Ok(entry.credentials.clone());
            }
        }

        debug!(provider = %self.provider, "Looking up registry credentials");
        let credentials = self
            .store
            .get(&self.provider)
            .await?
            .ok_or_else(|| Error::credential_missing(&self.provider))?;

        *cached = Some(match self.cache_ttl_seconds {
            Some(ttl) => CachedCredentials::expires_in(credentials.clone(), ttl),
            None => CachedCredentials::new(credentials.clone()),
        });

        Ok(credentials)
    }

    /// Forget the cached credentials
    pub async fn clear_cache(&self) {
        let mut cached = self.cached.write().await;
        *cached = None;
    }
}

#[async_trait]
impl Authenticator for StoreAuthenticator {
    async fn attach(&self, mut request: Request) -> Result<Request> {
        let credentials = self.credentials().await?;
        credentials.apply(&mut request)?;
        Ok(request)
    }
}

impl std::fmt::Debug for StoreAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAuthenticator")
            .field("provider", &self.provider)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .finish_non_exhaustive()
    }
}
