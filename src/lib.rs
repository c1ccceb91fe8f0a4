//! # GitLab Registry Lister
//!
//! Lists the container registry repositories of GitLab projects, one
//! authenticated page at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gitlab_registry_lister::auth::{EnvCredentialStore, StoreAuthenticator};
//! use gitlab_registry_lister::http::HttpClient;
//! use gitlab_registry_lister::registry::RegistryLister;
//! use gitlab_registry_lister::{PageCursor, Result};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let store = Arc::new(EnvCredentialStore::new("GITLAB_REGISTRY"));
//! let auth = Arc::new(StoreAuthenticator::new(store, "gitlab"));
//! let lister = RegistryLister::new("https://gitlab.com", Arc::new(HttpClient::new()?), auth)?;
//!
//! let mut cursor = PageCursor::Start;
//! while cursor.has_more() {
//!     let page = lister.fetch_page("42", &cursor, 100).await?;
//!     for repo in &page.items {
//!         println!("{} {}", repo.id, repo.name);
//!     }
//!     cursor = page.next;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller ──cursor──▶ RegistryLister::fetch_page
//!                        │ build URL (Start) or follow link (Next)
//!                        ▼
//!                   Authenticator::attach ──▶ CredentialStore
//!                        │
//!                        ▼
//!                   Fetch::execute (HttpClient)
//!                        │ status check, JSON decode, Link header
//!                        ▼
//! caller ◀── Page { items, next } ──┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types
pub mod types;

/// Credentials, credential stores and authenticators
pub mod auth;

/// HTTP fetch capability
pub mod http;

/// Link header pagination
pub mod pagination;

/// Response decoding
pub mod decode;

/// Repository listing and project nodes
pub mod registry;

/// Configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use registry::{ProjectNode, RegistryLister};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
