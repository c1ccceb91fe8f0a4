//! Common types used throughout the registry lister
//!
//! Projects, repositories and the page/cursor values threaded between
//! successive listing calls.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Project
// ============================================================================

/// A GitLab project that owns container registry repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Provider identifier (numeric id or URL path such as `group/app`)
    pub id: String,
    /// Human-readable namespace path (e.g. `group/app`)
    pub path_with_namespace: String,
}

impl Project {
    /// Create a new project
    pub fn new(id: impl Into<String>, path_with_namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path_with_namespace: path_with_namespace.into(),
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

/// A single container registry repository as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name, relative to the project path (may be empty)
    pub name: String,
    /// Numeric repository id
    pub id: u64,
}

impl Repository {
    /// Create a new repository record
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Forward pagination cursor
///
/// Held by the caller and passed back on the next call. `Start` and
/// `Exhausted` are kept distinct so that "first call" and "no more pages"
/// never share a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "url", rename_all = "snake_case")]
pub enum PageCursor {
    /// Begin from the first page
    #[default]
    Start,
    /// Resume from this literal URL (taken from a `rel="next"` link)
    Next(String),
    /// The previous response carried no next link
    Exhausted,
}

impl PageCursor {
    /// Cursor for a next link, or `Exhausted` when there is none
    pub fn from_next_link(link: Option<String>) -> Self {
        match link {
            Some(url) if !url.is_empty() => Self::Next(url),
            _ => Self::Exhausted,
        }
    }

    /// Check if more pages can be requested
    pub fn has_more(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }

    /// Check if this cursor is exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// The resumption URL, if any
    pub fn next_url(&self) -> Option<&str> {
        match self {
            Self::Next(url) => Some(url),
            _ => None,
        }
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Next(url) => f.write_str(url),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

// ============================================================================
// Page
// ============================================================================

/// One page of listing results plus the cursor for the following page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the order the server returned them
    pub items: Vec<T>,
    /// Cursor to pass to the next call
    pub next: PageCursor,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, next: PageCursor) -> Self {
        Self { items, next }
    }

    /// An empty, final page
    pub fn exhausted() -> Self {
        Self {
            items: Vec::new(),
            next: PageCursor::Exhausted,
        }
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
