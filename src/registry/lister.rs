//! Paginated registry repository listing
//!
//! One call to [`RegistryLister::fetch_page`] performs one authenticated GET
//! and returns the decoded repositories together with the cursor for the
//! following page. The lister keeps no pagination state of its own.

use crate::auth::Authenticator;
use crate::decode::decode_array;
use crate::error::{Error, Result};
use crate::http::Fetch;
use crate::pagination::next_cursor;
use crate::types::{Page, PageCursor, Repository};
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of repositories requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Longest error body kept in a registry error message
const MAX_ERROR_BODY: usize = 512;

/// Lists the registry repositories of GitLab projects
#[derive(Clone)]
pub struct RegistryLister {
    base_url: Url,
    fetcher: Arc<dyn Fetch>,
    authenticator: Arc<dyn Authenticator>,
}

impl RegistryLister {
    /// Create a lister for a GitLab instance
    ///
    /// `base_url` is the instance root, e.g. `https://gitlab.com` or
    /// `https://git.example.com/gitlab`.
    pub fn new(
        base_url: &str,
        fetcher: Arc<dyn Fetch>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "Base URL '{base_url}' cannot carry a path"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok(Self {
            base_url,
            fetcher,
            authenticator,
        })
    }

    /// Instance root all first-page URLs are built from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the first page of repositories for a project
    pub fn first_page_url(&self, project_id: &str, page_size: u32) -> Result<Url> {
        validate_page_size(page_size)?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["api", "v4", "projects", project_id, "registry", "repositories"]);
        url.query_pairs_mut()
            .append_pair("per_page", &page_size.to_string());
        Ok(url)
    }

    /// URL requested for a cursor, or `None` once the listing is exhausted
    pub fn page_url(
        &self,
        project_id: &str,
        cursor: &PageCursor,
        page_size: u32,
    ) -> Result<Option<Url>> {
        validate_page_size(page_size)?;

        match cursor {
            PageCursor::Start => self.first_page_url(project_id, page_size).map(Some),
            PageCursor::Next(next) => self.resolve_next(next).map(Some),
            PageCursor::Exhausted => Ok(None),
        }
    }

    /// Resolve a next-page link against the base URL
    ///
    /// Absolute links are taken as-is and relative ones resolve against the
    /// base. Links to another origin are refused so credentials never leave
    /// the configured instance.
    fn resolve_next(&self, next: &str) -> Result<Url> {
        let url = self.base_url.join(next)?;
        if url.origin() != self.base_url.origin() {
            return Err(Error::ForeignLink {
                url: url.to_string(),
                origin: self.base_url.origin().ascii_serialization(),
            });
        }
        Ok(url)
    }

    /// Fetch one page of repositories
    ///
    /// `PageCursor::Start` requests the first page; `PageCursor::Next`
    /// requests the server-supplied link; `PageCursor::Exhausted` returns an
    /// empty final page without contacting the server.
    pub async fn fetch_page(
        &self,
        project_id: &str,
        cursor: &PageCursor,
        page_size: u32,
    ) -> Result<Page<Repository>> {
        let Some(url) = self.page_url(project_id, cursor, page_size)? else {
            debug!(project = project_id, "Listing already exhausted");
            return Ok(Page::exhausted());
        };
        self.fetch_json_page(url).await
    }

    /// Fetch one page, giving up as soon as `cancel` completes
    ///
    /// When cancelled, the in-flight request is dropped and
    /// `Error::Cancelled` is returned; no partial page is produced.
    pub async fn fetch_page_cancellable<C>(
        &self,
        project_id: &str,
        cursor: &PageCursor,
        page_size: u32,
        cancel: C,
    ) -> Result<Page<Repository>>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                debug!(project = project_id, "Repository listing cancelled");
                Err(Error::Cancelled)
            }
            result = self.fetch_page(project_id, cursor, page_size) => result,
        }
    }

    /// Stream every page of a project's repositories, starting from page one
    pub fn pages<'a>(
        &'a self,
        project_id: &'a str,
        page_size: u32,
    ) -> impl Stream<Item = Result<Page<Repository>>> + 'a {
        futures::stream::try_unfold(PageCursor::Start, move |cursor| async move {
            if cursor.is_exhausted() {
                return Ok(None);
            }
            let requested = self.page_url(project_id, &cursor, page_size)?;
            let mut page = self.fetch_page(project_id, &cursor, page_size).await?;

            // A next link back to the page just fetched would never end
            if let PageCursor::Next(next) = &page.next {
                if self.resolve_next(next).ok() == requested {
                    warn!(
                        project = project_id,
                        url = %next,
                        "Next link repeats the current page, stopping"
                    );
                    page.next = PageCursor::Exhausted;
                }
            }

            let next = page.next.clone();
            Ok(Some((page, next)))
        })
    }

    /// Fetch every repository of a project across all pages
    pub async fn fetch_all(&self, project_id: &str, page_size: u32) -> Result<Vec<Repository>> {
        self.pages(project_id, page_size)
            .try_fold(Vec::new(), |mut all, page| async move {
                all.extend(page.items);
                Ok(all)
            })
            .await
    }

    /// Authenticated GET of a JSON array page
    async fn fetch_json_page<T: DeserializeOwned>(&self, url: Url) -> Result<Page<T>> {
        let mut request = Request::new(Method::GET, url);
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let request = self.authenticator.attach(request).await?;
        let response = self.fetcher.execute(request).await?;

        if !response.is_success() {
            return Err(Error::registry_status(
                response.status.as_u16(),
                response.url.as_str(),
                truncate(response.text(), MAX_ERROR_BODY),
            ));
        }

        let items = decode_array(&response.body, &response.url)?;
        let next = next_cursor(&response.headers);
        debug!(url = %response.url, items = items.len(), next = %next, "Fetched registry page");

        Ok(Page::new(items, next))
    }
}

impl std::fmt::Debug for RegistryLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLister")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 {
        return Err(Error::InvalidPageSize(page_size));
    }
    Ok(())
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push_str("...");
    }
    text
}
