//! Project node
//!
//! Holds a project's identity and a shared lister, and exposes the project's
//! repositories as children.

use super::children::{
    build_children_with_error_handling, ChildLister, Children, RepositoryNode,
    INVALID_REPOSITORY_CONTEXT,
};
use super::lister::{RegistryLister, DEFAULT_PAGE_SIZE};
use crate::auth::{CredentialStore, Credentials};
use crate::error::{Error, Result};
use crate::types::{PageCursor, Project};
use async_trait::async_trait;
use std::sync::Arc;

/// Registry host of gitlab.com
pub const GITLAB_REGISTRY_HOST: &str = "registry.gitlab.com";

/// Credentials for `docker login` against a project's registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCliCredentials {
    /// Registry host to log in to
    pub registry_path: String,
    /// Credentials to log in with
    pub auth: Credentials,
}

impl DockerCliCredentials {
    /// Look up the credentials for logging in to `registry_host`
    ///
    /// GitLab registries accept a token as password; username/password pairs
    /// are passed through unchanged. No request is made.
    pub async fn lookup(
        registry_host: &str,
        store: &dyn CredentialStore,
        provider: &str,
    ) -> Result<Self> {
        let auth = store
            .get(provider)
            .await?
            .ok_or_else(|| Error::credential_missing(provider))?;

        Ok(Self {
            registry_path: registry_host.to_string(),
            auth,
        })
    }
}

/// A GitLab project whose children are its registry repositories
#[derive(Debug, Clone)]
pub struct ProjectNode {
    project: Project,
    registry_host: String,
    page_size: u32,
    lister: Arc<RegistryLister>,
}

impl ProjectNode {
    /// Create a node for a project on gitlab.com's registry
    pub fn new(project: Project, lister: Arc<RegistryLister>) -> Self {
        Self {
            project,
            registry_host: GITLAB_REGISTRY_HOST.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            lister,
        }
    }

    /// Use a different registry host (self-managed instances)
    #[must_use]
    pub fn with_registry_host(mut self, host: impl Into<String>) -> Self {
        self.registry_host = host.into();
        self
    }

    /// Use a different page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Provider identifier of the project
    pub fn id(&self) -> &str {
        &self.project.id
    }

    /// Display label (the namespace path)
    pub fn label(&self) -> &str {
        &self.project.path_with_namespace
    }

    /// The project
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Registry host images are pushed to
    pub fn registry_host(&self) -> &str {
        &self.registry_host
    }

    /// Image path prefix for the project's repositories
    pub fn base_image_path(&self) -> String {
        format!("{}/{}", self.registry_host, self.project.path_with_namespace)
    }

    /// Credentials for logging the docker CLI in to this project's registry
    pub async fn docker_cli_credentials(
        &self,
        store: &dyn CredentialStore,
        provider: &str,
    ) -> Result<DockerCliCredentials> {
        DockerCliCredentials::lookup(&self.registry_host, store, provider).await
    }
}

#[async_trait]
impl ChildLister for ProjectNode {
    type Node = RepositoryNode;

    async fn load_more_children(
        &self,
        cursor: &PageCursor,
        clear_cache: bool,
    ) -> Result<Children<RepositoryNode>> {
        let start = PageCursor::Start;
        let cursor = if clear_cache { &start } else { cursor };

        let page = self
            .lister
            .fetch_page(&self.project.id, cursor, self.page_size)
            .await?;

        let base = self.base_image_path();
        let nodes = build_children_with_error_handling(
            &page.items,
            INVALID_REPOSITORY_CONTEXT,
            |repo| RepositoryNode::new(&base, repo),
            |repo| repo.name.clone(),
        );

        Ok(Children {
            nodes,
            next: page.next,
        })
    }
}
