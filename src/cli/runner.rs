//! CLI runner - executes commands

use crate::auth::{
    Authenticator, CredentialStore, Credentials, EnvCredentialStore, FileCredentialStore, NoAuth,
    StoreAuthenticator,
};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ListerConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::registry::{ChildLister, ChildNode, DockerCliCredentials, ProjectNode, RegistryLister};
use crate::types::{Page, PageCursor, Project, Repository};
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let output = self.execute().await?;
        print!("{output}");
        Ok(())
    }

    /// Run the CLI command and return what it would print
    pub async fn execute(&self) -> Result<String> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Repos {
                project,
                page_size,
                cursor,
                all,
            } => {
                let page_size = page_size.unwrap_or(config.page_size);
                self.repos(&config, project, page_size, cursor.as_deref(), *all)
                    .await
            }
            Commands::ImagePath {
                project,
                path,
                list,
            } => self.image_path(&config, project, path, *list).await,
            Commands::Credentials { path } => self.credentials(&config, path).await,
        }
    }

    /// Load configuration, applying command-line overrides
    pub fn load_config(&self) -> Result<ListerConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ListerConfig::from_file(path)?,
            None => ListerConfig::default(),
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
            config.validate()?;
        }

        Ok(config)
    }

    /// Credential store selected by the config
    fn credential_store(config: &ListerConfig) -> Arc<dyn CredentialStore> {
        match &config.credentials_file {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(EnvCredentialStore::new(&config.env_prefix)),
        }
    }

    /// Build a lister wired to the real HTTP client
    pub fn build_lister(&self, config: &ListerConfig) -> Result<RegistryLister> {
        let client = HttpClient::with_config(config.http_client_config())?;

        let authenticator: Arc<dyn Authenticator> = if self.cli.anonymous {
            Arc::new(NoAuth)
        } else {
            Arc::new(StoreAuthenticator::new(
                Self::credential_store(config),
                &config.provider,
            ))
        };

        RegistryLister::new(&config.base_url, Arc::new(client), authenticator)
    }

    /// List repositories
    async fn repos(
        &self,
        config: &ListerConfig,
        project: &str,
        page_size: u32,
        cursor: Option<&str>,
        all: bool,
    ) -> Result<String> {
        let lister = self.build_lister(config)?;

        if all {
            let repos = lister.fetch_all(project, page_size).await?;
            info!("Listed {} repositories for project {}", repos.len(), project);
            return self.render_repositories(&repos);
        }

        let cursor = cursor.map_or(PageCursor::Start, |url| PageCursor::Next(url.to_string()));
        let page = lister.fetch_page(project, &cursor, page_size).await?;
        self.render_page(&page)
    }

    /// Show image paths
    async fn image_path(
        &self,
        config: &ListerConfig,
        project: &str,
        path: &str,
        list: bool,
    ) -> Result<String> {
        let node = self.project_node(config, project, path)?;

        if !list {
            return Ok(match self.cli.format {
                OutputFormat::Json => {
                    format!("{}\n", json!({ "base_image_path": node.base_image_path() }))
                }
                OutputFormat::Pretty => format!("{}\n", node.base_image_path()),
            });
        }

        let mut nodes = Vec::new();
        let mut cursor = PageCursor::Start;
        while node.has_more_children(&cursor) {
            let children = node.load_more_children(&cursor, false).await?;
            nodes.extend(children.nodes);
            cursor = children.next;
        }

        match self.cli.format {
            OutputFormat::Json => Ok(format!(
                "{}\n",
                serde_json::to_string_pretty(&json!({
                    "base_image_path": node.base_image_path(),
                    "repositories": nodes,
                }))?
            )),
            OutputFormat::Pretty => {
                let mut out = String::new();
                let _ = writeln!(out, "{}", node.base_image_path());
                for child in &nodes {
                    match child {
                        ChildNode::Item(repo) => {
                            let _ = writeln!(out, "  {}", repo.image_path);
                        }
                        ChildNode::Invalid { label, message, .. } => {
                            let _ = writeln!(out, "  ! {label}: {message}");
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    /// Show docker CLI credentials with the secret masked
    ///
    /// Only the credential store is consulted; no registry request is made.
    async fn credentials(&self, config: &ListerConfig, path: &str) -> Result<String> {
        let path = validate_project_path(path)?;
        let store = Self::credential_store(config);
        let creds =
            DockerCliCredentials::lookup(&config.registry_host, store.as_ref(), &config.provider)
                .await?;
        let image_path = format!("{}/{path}", creds.registry_path);

        let (kind, username) = match &creds.auth {
            Credentials::Token(_) => ("token", None),
            Credentials::Basic { username, .. } => ("basic", Some(username.as_str())),
        };
        let masked = mask(creds.auth.secret());

        match self.cli.format {
            OutputFormat::Json => Ok(format!(
                "{}\n",
                json!({
                    "registry_path": creds.registry_path,
                    "image_path": image_path,
                    "kind": kind,
                    "username": username,
                    "secret": masked,
                })
            )),
            OutputFormat::Pretty => {
                let mut out = String::new();
                let _ = writeln!(out, "registry: {}", creds.registry_path);
                let _ = writeln!(out, "image: {image_path}");
                if let Some(username) = username {
                    let _ = writeln!(out, "username: {username}");
                }
                let _ = writeln!(out, "{kind}: {masked}");
                Ok(out)
            }
        }
    }

    fn project_node(&self, config: &ListerConfig, project: &str, path: &str) -> Result<ProjectNode> {
        let path = validate_project_path(path)?;
        let lister = Arc::new(self.build_lister(config)?);
        Ok(ProjectNode::new(Project::new(project, path), lister)
            .with_registry_host(&config.registry_host)
            .with_page_size(config.page_size))
    }

    fn render_page(&self, page: &Page<Repository>) -> Result<String> {
        match self.cli.format {
            OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(page)?)),
            OutputFormat::Pretty => {
                let mut out = render_table(&page.items);
                match &page.next {
                    PageCursor::Next(url) => {
                        let _ = writeln!(out, "\nMore repositories available. Resume with:");
                        let _ = writeln!(out, "  --cursor '{url}'");
                    }
                    PageCursor::Start | PageCursor::Exhausted => {}
                }
                Ok(out)
            }
        }
    }

    fn render_repositories(&self, repos: &[Repository]) -> Result<String> {
        match self.cli.format {
            OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(repos)?)),
            OutputFormat::Pretty => Ok(render_table(repos)),
        }
    }
}

fn validate_project_path(path: &str) -> Result<&str> {
    let path = path.trim().trim_matches('/');
    if path.is_empty() {
        return Err(Error::config("Project path must not be empty"));
    }
    Ok(path)
}

fn render_table(repos: &[Repository]) -> String {
    if repos.is_empty() {
        return "No repositories found\n".to_string();
    }

    let width = repos
        .iter()
        .map(|r| r.id.to_string().len())
        .max()
        .unwrap_or(0)
        .max(2);

    let mut out = String::new();
    let _ = writeln!(out, "{:>width$}  NAME", "ID");
    for repo in repos {
        let name = if repo.name.is_empty() {
            "(root)"
        } else {
            repo.name.as_str()
        };
        let _ = writeln!(out, "{:>width$}  {name}", repo.id);
    }
    out
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{visible}********")
    }
}
