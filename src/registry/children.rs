//! Child node construction
//!
//! Listed items are turned into nodes one at a time. An item whose node
//! cannot be built becomes an `Invalid` placeholder and the rest of the page
//! is kept.

use crate::error::{Error, Result};
use crate::types::{PageCursor, Repository};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::warn;

/// Context recorded on placeholders for repositories that failed to load
pub const INVALID_REPOSITORY_CONTEXT: &str = "invalidRepository";

/// A node produced from one listed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildNode<N> {
    /// Successfully built node
    Item(N),
    /// Placeholder for an item that could not be turned into a node
    Invalid {
        /// Label of the offending item
        label: String,
        /// What kind of item failed (e.g. `invalidRepository`)
        context: String,
        /// Why it failed
        message: String,
    },
}

impl<N> ChildNode<N> {
    /// The built node, if any
    pub fn item(&self) -> Option<&N> {
        match self {
            Self::Item(node) => Some(node),
            Self::Invalid { .. } => None,
        }
    }

    /// Check if this is a placeholder
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// One batch of children plus the cursor for the next batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Children<N> {
    /// Nodes in listing order
    pub nodes: Vec<ChildNode<N>>,
    /// Cursor to pass to the next `load_more_children` call
    pub next: PageCursor,
}

/// Something that can list its children page by page
#[async_trait]
pub trait ChildLister: Send + Sync {
    /// Node type produced for each child
    type Node: Send;

    /// Load the batch of children at `cursor`
    ///
    /// With `clear_cache` the cursor is ignored and listing restarts from the
    /// first page.
    async fn load_more_children(
        &self,
        cursor: &PageCursor,
        clear_cache: bool,
    ) -> Result<Children<Self::Node>>;

    /// Whether another call to `load_more_children` can produce children
    fn has_more_children(&self, cursor: &PageCursor) -> bool {
        cursor.has_more()
    }
}

/// Build a node for each item, replacing failures with placeholders
pub fn build_children_with_error_handling<T, N, F, L>(
    items: &[T],
    context: &str,
    mut make: F,
    label: L,
) -> Vec<ChildNode<N>>
where
    F: FnMut(&T) -> Result<N>,
    L: Fn(&T) -> String,
{
    items
        .iter()
        .map(|item| match make(item) {
            Ok(node) => ChildNode::Item(node),
            Err(e) => {
                let label = label(item);
                warn!(context, label = %label, error = %e, "Skipping invalid item");
                ChildNode::Invalid {
                    label,
                    context: context.to_string(),
                    message: e.to_string(),
                }
            }
        })
        .collect()
}

// ============================================================================
// Repository Node
// ============================================================================

/// A repository of a project's container registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryNode {
    /// Repository id as a string
    pub id: String,
    /// Repository name relative to the project (empty for the root repository)
    pub name: String,
    /// Full image path, e.g. `registry.gitlab.com/group/app/api`
    pub image_path: String,
}

impl RepositoryNode {
    /// Build a node for a repository under a project's base image path
    pub fn new(base_image_path: &str, repository: &Repository) -> Result<Self> {
        validate_repository_name(&repository.name)?;

        let image_path = if repository.name.is_empty() {
            base_image_path.to_string()
        } else {
            format!("{base_image_path}/{}", repository.name)
        };

        Ok(Self {
            id: repository.id.to_string(),
            name: repository.name.clone(),
            image_path,
        })
    }

    /// Label shown for this repository
    pub fn label(&self) -> &str {
        &self.name
    }
}

/// One path component: lowercase alphanumerics joined by `.`, `_`, `__` or runs of `-`
static COMPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("component pattern is valid")
});

/// Check a repository name against registry path rules
///
/// Components are separated by `/`. The empty name denotes the project's root
/// repository.
pub fn validate_repository_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(Error::invalid_repository(name, "empty path component"));
        }
        if !COMPONENT_REGEX.is_match(component) {
            return Err(Error::invalid_repository(
                name,
                format!(
                    "component '{component}' must be lowercase letters or digits joined by '.', '_', '__' or '-'"
                ),
            ));
        }
    }

    Ok(())
}
