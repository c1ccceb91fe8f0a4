//! Registry module
//!
//! Lists a GitLab project's container registry repositories.
//!
//! # Overview
//!
//! - [`RegistryLister`] fetches one page per call through injected
//!   [`Authenticator`](crate::auth::Authenticator) and
//!   [`Fetch`](crate::http::Fetch) capabilities, returning the items and the
//!   cursor for the next page.
//! - [`ProjectNode`] wraps a project and lists its repositories as
//!   [`ChildNode`]s, turning repositories that cannot be represented into
//!   placeholders instead of failing the page.

mod children;
mod lister;
mod project;

pub use children::{
    build_children_with_error_handling, validate_repository_name, ChildLister, ChildNode,
    Children, RepositoryNode, INVALID_REPOSITORY_CONTEXT,
};
pub use lister::{RegistryLister, DEFAULT_PAGE_SIZE};
pub use project::{DockerCliCredentials, ProjectNode, GITLAB_REGISTRY_HOST};

#[cfg(test)]
mod tests;
