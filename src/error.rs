//! Error types for the registry lister
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the registry lister
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("No credentials found for provider '{provider}'")]
    CredentialMissing { provider: String },

    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    // ============================================================================
    // Registry Errors
    // ============================================================================
    #[error("Registry request to {url} failed{}: {message}", status_suffix(*.status))]
    RegistryRequest {
        status: Option<u16>,
        url: String,
        message: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Page size must be a positive integer, got {0}")]
    InvalidPageSize(u32),

    #[error("Invalid repository name '{name}': {message}")]
    InvalidRepositoryName { name: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Next-page link {url} leaves {origin}; refusing to send credentials there")]
    ForeignLink { url: String, origin: String },

    #[error("Request cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: Option<u16>) -> String {
    status.map(|s| format!(" with HTTP {s}")).unwrap_or_default()
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing credential error
    pub fn credential_missing(provider: impl Into<String>) -> Self {
        Self::CredentialMissing {
            provider: provider.into(),
        }
    }

    /// Create a registry error for a non-success HTTP status
    pub fn registry_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::RegistryRequest {
            status: Some(status),
            url: url.into(),
            message: body.into(),
        }
    }

    /// Create a registry error for a transport failure (no response)
    pub fn registry_transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RegistryRequest {
            status: None,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid repository name error
    pub fn invalid_repository(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRepositoryName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by a registry error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RegistryRequest { status, .. } => *status,
            _ => None,
        }
    }

    /// URL that triggered a registry or decode error
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::RegistryRequest { url, .. }
            | Error::Decode { url, .. }
            | Error::ForeignLink { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Result type alias for the registry lister
pub type Result<T> = std::result::Result<T, Error>;
