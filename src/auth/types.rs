//! Credential types
//!
//! Credentials are resolved from a store at request time and placed on the
//! outgoing request as an `Authorization` header.

use crate::error::{Error, Result};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCredentials", into = "StoredCredentials")]
pub enum Credentials {
    /// Personal access / deploy token, sent as a bearer token
    Token(String),
    /// Username and password, sent as HTTP Basic
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
}

impl Credentials {
    /// Create token credentials
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Create basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of the `Authorization` header for these credentials
    pub fn authorization_value(&self) -> String {
        match self {
            Self::Token(token) => format!("Bearer {token}"),
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                format!("Basic {encoded}")
            }
        }
    }

    /// Set the `Authorization` header on a request
    ///
    /// The header value is marked sensitive so it is omitted from `Debug`
    /// output of the request.
    pub fn apply(&self, request: &mut Request) -> Result<()> {
        let mut value =
            HeaderValue::from_str(&self.authorization_value()).map_err(|_| {
                Error::InvalidCredentials {
                    message: "credentials contain characters not allowed in a header".to_string(),
                }
            })?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// The secret part of the credentials (token or password)
    pub fn secret(&self) -> &str {
        match self {
            Self::Token(token) => token,
            Self::Basic { password, .. } => password,
        }
    }

    /// Username, if these are basic credentials
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Token(_) => None,
            Self::Basic { username, .. } => Some(username),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// On-disk shape of credentials: `{token}` or `{username, password}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredCredentials {
    Token { token: String },
    Basic { username: String, password: String },
}

impl From<StoredCredentials> for Credentials {
    fn from(stored: StoredCredentials) -> Self {
        match stored {
            StoredCredentials::Token { token } => Self::Token(token),
            StoredCredentials::Basic { username, password } => Self::Basic { username, password },
        }
    }
}

impl From<Credentials> for StoredCredentials {
    fn from(credentials: Credentials) -> Self {
        match credentials {
            Credentials::Token(token) => Self::Token { token },
            Credentials::Basic { username, password } => Self::Basic { username, password },
        }
    }
}

/// Credentials cached by an authenticator
#[derive(Debug, Clone)]
pub struct CachedCredentials {
    /// The credentials
    pub credentials: Credentials,
    /// When the cached value stops being used
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedCredentials {
    /// Cache credentials without expiration
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            expires_at: None,
        }
    }

    /// Cache credentials for N seconds from now
    pub fn expires_in(credentials: Credentials, seconds: i64) -> Self {
        Self {
            credentials,
            expires_at: Some(Utc::now() + chrono::Duration::seconds(seconds)),
        }
    }

    /// Check if the cached value is stale
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}
