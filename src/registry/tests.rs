//! Tests for the registry module

use super::*;
use crate::auth::{Credentials, MemoryCredentialStore, NoAuth, StaticAuth, StoreAuthenticator};
use crate::error::{Error, Result};
use crate::http::{Fetch, FetchResponse};
use crate::types::{PageCursor, Project, Repository};
use async_trait::async_trait;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use reqwest::{Request, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use test_case::test_case;

const BASE: &str = "https://gitlab.example.com";

// ============================================================================
// Fake fetcher
// ============================================================================

#[derive(Clone)]
struct Scripted {
    status: u16,
    body: String,
    next: Option<String>,
}

/// Fetcher that answers from a URL-keyed script and records every request
#[derive(Default)]
struct FakeFetch {
    script: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeFetch {
    fn respond(self, url: &str, status: u16, body: &str, next: Option<&str>) -> Self {
        self.script.lock().unwrap().insert(
            url.to_string(),
            Scripted {
                status,
                body: body.to_string(),
                next: next.map(String::from),
            },
        );
        self
    }

    fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn authorization_headers(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, auth)| auth.clone())
            .collect()
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn execute(&self, request: Request) -> Result<FetchResponse> {
        let url = request.url().to_string();
        let auth = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.requests.lock().unwrap().push((url.clone(), auth));

        // Yield so concurrent callers interleave
        tokio::task::yield_now().await;

        let scripted = self
            .script
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or(Scripted {
                status: 404,
                body: r#"{"message":"404 Not Found"}"#.to_string(),
                next: None,
            });

        let mut headers = HeaderMap::new();
        if let Some(next) = scripted.next {
            headers.insert(
                LINK,
                HeaderValue::from_str(&format!("<{next}>; rel=\"next\"")).unwrap(),
            );
        }

        Ok(FetchResponse::new(
            url,
            StatusCode::from_u16(scripted.status).unwrap(),
            headers,
            Bytes::from(scripted.body),
        ))
    }
}

/// Fetcher that never answers
struct HangingFetch;

#[async_trait]
impl Fetch for HangingFetch {
    async fn execute(&self, _request: Request) -> Result<FetchResponse> {
        futures::future::pending().await
    }
}

fn first_url(project: &str, per_page: u32) -> String {
    format!("{BASE}/api/v4/projects/{project}/registry/repositories?per_page={per_page}")
}

fn lister(fetch: Arc<FakeFetch>) -> RegistryLister {
    RegistryLister::new(BASE, fetch, Arc::new(StaticAuth::new(Credentials::token("secret-token"))))
        .unwrap()
}

// ============================================================================
// URL construction
// ============================================================================

#[test_case(1 ; "single")]
#[test_case(20 ; "twenty")]
#[test_case(100 ; "default")]
#[test_case(u32::MAX ; "max")]
fn test_first_page_url_has_per_page(page_size: u32) {
    let lister = lister(Arc::new(FakeFetch::default()));
    let url = lister.first_page_url("42", page_size).unwrap();
    assert_eq!(url.as_str(), first_url("42", page_size));
}

#[test]
fn test_first_page_url_encodes_path_ids() {
    let lister = lister(Arc::new(FakeFetch::default()));
    let url = lister.first_page_url("group/app", 10).unwrap();
    assert_eq!(
        url.as_str(),
        format!("{BASE}/api/v4/projects/group%2Fapp/registry/repositories?per_page=10")
    );
}

#[test]
fn test_first_page_url_keeps_base_path() {
    let fetch: Arc<dyn Fetch> = Arc::new(FakeFetch::default());
    let lister = RegistryLister::new("https://git.example.com/gitlab", fetch, Arc::new(NoAuth))
        .unwrap();
    let url = lister.first_page_url("7", 5).unwrap();
    assert_eq!(
        url.as_str(),
        "https://git.example.com/gitlab/api/v4/projects/7/registry/repositories?per_page=5"
    );
}

#[test]
fn test_invalid_base_url() {
    let fetch: Arc<dyn Fetch> = Arc::new(FakeFetch::default());
    assert!(matches!(
        RegistryLister::new("not a url", fetch.clone(), Arc::new(NoAuth)),
        Err(Error::InvalidUrl(_))
    ));
    assert!(matches!(
        RegistryLister::new("mailto:ops@example.com", fetch, Arc::new(NoAuth)),
        Err(Error::Config { .. })
    ));
}

#[tokio::test]
async fn test_zero_page_size_rejected_without_request() {
    let fetch = Arc::new(FakeFetch::default());
    let lister = lister(fetch.clone());

    let err = lister
        .fetch_page("42", &PageCursor::Start, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidPageSize(0)));
    assert!(fetch.requested_urls().is_empty());
}

// ============================================================================
// fetch_page
// ============================================================================

#[tokio::test]
async fn test_fetch_first_page_decodes_in_order() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &first_url("42", 2),
        200,
        r#"[{"name":"repoA","id":1},{"name":"repoB","id":2}]"#,
        None,
    ));
    let lister = lister(fetch.clone());

    let page = lister.fetch_page("42", &PageCursor::Start, 2).await.unwrap();

    assert_eq!(
        page.items,
        vec![Repository::new("repoA", 1), Repository::new("repoB", 2)]
    );
    assert_eq!(page.next, PageCursor::Exhausted);
    assert_eq!(fetch.requested_urls(), vec![first_url("42", 2)]);
}

#[tokio::test]
async fn test_fetch_page_attaches_credentials() {
    let fetch = Arc::new(FakeFetch::default().respond(&first_url("42", 2), 200, "[]", None));
    let lister = lister(fetch.clone());

    lister.fetch_page("42", &PageCursor::Start, 2).await.unwrap();

    assert_eq!(
        fetch.authorization_headers(),
        vec![Some("Bearer secret-token".to_string())]
    );
}

#[tokio::test]
async fn test_next_cursor_requested_verbatim() {
    let next = "https://gitlab.example.com/api/v4/projects/42/registry/repositories?id=42&page=2&per_page=2";
    let fetch = Arc::new(
        FakeFetch::default()
            .respond(&first_url("42", 2), 200, r#"[{"name":"a","id":1}]"#, Some(next))
            .respond(next, 200, r#"[{"name":"b","id":2}]"#, None),
    );
    let lister = lister(fetch.clone());

    let first = lister.fetch_page("42", &PageCursor::Start, 2).await.unwrap();
    assert_eq!(first.next, PageCursor::Next(next.to_string()));

    let second = lister.fetch_page("42", &first.next, 2).await.unwrap();
    assert_eq!(second.items, vec![Repository::new("b", 2)]);
    assert_eq!(second.next, PageCursor::Exhausted);

    assert_eq!(fetch.requested_urls(), vec![first_url("42", 2), next.to_string()]);
}

#[tokio::test]
async fn test_relative_next_link_resolved_against_base() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &format!("{BASE}/api/v4/projects/42/registry/repositories?page=2"),
        200,
        "[]",
        None,
    ));
    let lister = lister(fetch.clone());

    let cursor = PageCursor::Next("api/v4/projects/42/registry/repositories?page=2".to_string());
    let page = lister.fetch_page("42", &cursor, 2).await.unwrap();

    assert!(page.is_empty());
    assert_eq!(
        fetch.requested_urls(),
        vec![format!("{BASE}/api/v4/projects/42/registry/repositories?page=2")]
    );
}

#[test_case("https://attacker.example.net/api/v4/projects/42/registry/repositories?page=2" ; "other host")]
#[test_case("http://gitlab.example.com/api/v4/projects/42/registry/repositories?page=2" ; "downgraded scheme")]
#[test_case("https://gitlab.example.com:8443/api/v4/projects/42/registry/repositories?page=2" ; "other port")]
#[test_case("//attacker.example.net/page2" ; "scheme relative")]
#[tokio::test]
async fn test_next_link_to_other_origin_refused(next: &str) {
    let fetch = Arc::new(FakeFetch::default());
    let lister = lister(fetch.clone());

    let err = lister
        .fetch_page("42", &PageCursor::Next(next.to_string()), 2)
        .await
        .unwrap_err();

    match err {
        Error::ForeignLink { origin, .. } => assert_eq!(origin, BASE),
        other => panic!("Expected ForeignLink, got {other:?}"),
    }
    assert!(fetch.requested_urls().is_empty());
}

#[tokio::test]
async fn test_fetch_all_stops_when_next_link_repeats_page() {
    let page2 = format!("{BASE}/api/v4/projects/42/registry/repositories?page=2&per_page=1");
    let fetch = Arc::new(
        FakeFetch::default()
            .respond(&first_url("42", 1), 200, r#"[{"name":"a","id":1}]"#, Some(&page2))
            .respond(&page2, 200, r#"[{"name":"b","id":2}]"#, Some(&page2)),
    );
    let lister = lister(fetch.clone());

    let all = lister.fetch_all("42", 1).await.unwrap();

    assert_eq!(all, vec![Repository::new("a", 1), Repository::new("b", 2)]);
    assert_eq!(fetch.requested_urls(), vec![first_url("42", 1), page2]);
}

#[tokio::test]
async fn test_exhausted_cursor_makes_no_request() {
    let fetch = Arc::new(FakeFetch::default());
    let lister = lister(fetch.clone());

    let page = lister
        .fetch_page("42", &PageCursor::Exhausted, 10)
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.next, PageCursor::Exhausted);
    assert!(fetch.requested_urls().is_empty());
}

#[tokio::test]
async fn test_empty_project_is_exhausted() {
    let fetch = Arc::new(FakeFetch::default().respond(&first_url("42", 10), 200, "[]", None));
    let lister = lister(fetch);

    let page = lister.fetch_page("42", &PageCursor::Start, 10).await.unwrap();
    assert!(page.is_empty());
    assert!(page.next.is_exhausted());
}

#[tokio::test]
async fn test_unauthorized_is_registry_error() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &first_url("42", 10),
        401,
        r#"{"message":"401 Unauthorized"}"#,
        None,
    ));
    let lister = lister(fetch);

    let err = lister
        .fetch_page("42", &PageCursor::Start, 10)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.url(), Some(first_url("42", 10).as_str()));
    assert!(!err.to_string().contains("secret-token"));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &first_url("42", 10),
        200,
        r#"{"unexpected":"object"}"#,
        None,
    ));
    let lister = lister(fetch);

    let err = lister
        .fetch_page("42", &PageCursor::Start, 10)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(err.url(), Some(first_url("42", 10).as_str()));
}

#[tokio::test]
async fn test_long_error_body_truncated() {
    let body = "x".repeat(5000);
    let fetch = Arc::new(FakeFetch::default().respond(&first_url("42", 10), 500, &body, None));
    let lister = lister(fetch);

    let err = lister
        .fetch_page("42", &PageCursor::Start, 10)
        .await
        .unwrap_err();

    match err {
        Error::RegistryRequest { message, .. } => {
            assert!(message.len() < 600);
            assert!(message.ends_with("..."));
        }
        other => panic!("Expected RegistryRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_credentials_propagate_without_request() {
    let fetch = Arc::new(FakeFetch::default());
    let auth = StoreAuthenticator::new(Arc::new(MemoryCredentialStore::new()), "gitlab");
    let lister = RegistryLister::new(BASE, fetch.clone(), Arc::new(auth)).unwrap();

    let err = lister
        .fetch_page("42", &PageCursor::Start, 10)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::CredentialMissing { ref provider } if provider == "gitlab"));
    assert!(fetch.requested_urls().is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_aborts_pending_request() {
    let lister = RegistryLister::new(BASE, Arc::new(HangingFetch), Arc::new(NoAuth)).unwrap();

    let err = lister
        .fetch_page_cancellable("42", &PageCursor::Start, 10, async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_uncancelled_fetch_completes() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &first_url("42", 10),
        200,
        r#"[{"name":"a","id":1}]"#,
        None,
    ));
    let lister = lister(fetch);

    let page = lister
        .fetch_page_cancellable("42", &PageCursor::Start, 10, futures::future::pending())
        .await
        .unwrap();

    assert_eq!(page.items, vec![Repository::new("a", 1)]);
}

// ============================================================================
// Multi-page helpers
// ============================================================================

fn three_page_fetch() -> FakeFetch {
    let p2 = format!("{BASE}/api/v4/projects/9/registry/repositories?page=2&per_page=1");
    let p3 = format!("{BASE}/api/v4/projects/9/registry/repositories?page=3&per_page=1");
    FakeFetch::default()
        .respond(&first_url("9", 1), 200, r#"[{"name":"one","id":1}]"#, Some(&p2))
        .respond(&p2, 200, r#"[{"name":"two","id":2}]"#, Some(&p3))
        .respond(&p3, 200, r#"[{"name":"three","id":3}]"#, None)
}

#[tokio::test]
async fn test_fetch_all_walks_every_page() {
    let fetch = Arc::new(three_page_fetch());
    let lister = lister(fetch.clone());

    let all = lister.fetch_all("9", 1).await.unwrap();

    assert_eq!(
        all,
        vec![
            Repository::new("one", 1),
            Repository::new("two", 2),
            Repository::new("three", 3)
        ]
    );
    assert_eq!(fetch.requested_urls().len(), 3);
}

#[tokio::test]
async fn test_pages_stream_stops_on_error() {
    use futures::StreamExt;

    let p2 = format!("{BASE}/api/v4/projects/9/registry/repositories?page=2&per_page=1");
    let fetch = Arc::new(
        FakeFetch::default()
            .respond(&first_url("9", 1), 200, r#"[{"name":"one","id":1}]"#, Some(&p2))
            .respond(&p2, 403, "forbidden", None),
    );
    let lister = lister(fetch);

    let results: Vec<_> = lister.pages("9", 1).collect().await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().status(), Some(403));
}

#[tokio::test]
async fn test_concurrent_projects_do_not_interfere() {
    let fetch = Arc::new(
        FakeFetch::default()
            .respond(&first_url("1", 10), 200, r#"[{"name":"alpha","id":11}]"#, None)
            .respond(&first_url("2", 10), 200, r#"[{"name":"beta","id":22}]"#, None),
    );
    let lister = Arc::new(lister(fetch));

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let lister = lister.clone();
            let project = if i % 2 == 0 { "1" } else { "2" };
            tokio::spawn(async move {
                let page = lister
                    .fetch_page(project, &PageCursor::Start, 10)
                    .await
                    .unwrap();
                (project, page.items)
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        let (project, items) = task.unwrap();
        let expected = if project == "1" {
            Repository::new("alpha", 11)
        } else {
            Repository::new("beta", 22)
        };
        assert_eq!(items, vec![expected]);
    }
}

// ============================================================================
// Project node
// ============================================================================

fn project_node(fetch: Arc<FakeFetch>) -> ProjectNode {
    ProjectNode::new(Project::new("42", "group/app"), Arc::new(lister(fetch))).with_page_size(2)
}

#[test]
fn test_project_node_identity() {
    let node = project_node(Arc::new(FakeFetch::default()));
    assert_eq!(node.id(), "42");
    assert_eq!(node.label(), "group/app");
    assert_eq!(node.registry_host(), GITLAB_REGISTRY_HOST);
    assert_eq!(node.base_image_path(), "registry.gitlab.com/group/app");

    let node = node.with_registry_host("registry.example.com");
    assert_eq!(node.base_image_path(), "registry.example.com/group/app");
}

#[tokio::test]
async fn test_load_children_wraps_invalid_items() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &first_url("42", 2),
        200,
        r#"[{"name":"api","id":1},{"name":"Bad Name","id":2},{"name":"","id":3}]"#,
        Some("https://gitlab.example.com/next"),
    ));
    let node = project_node(fetch);

    let children = node
        .load_more_children(&PageCursor::Start, false)
        .await
        .unwrap();

    assert_eq!(children.nodes.len(), 3);
    assert_eq!(
        children.nodes[0].item(),
        Some(&RepositoryNode {
            id: "1".to_string(),
            name: "api".to_string(),
            image_path: "registry.gitlab.com/group/app/api".to_string(),
        })
    );
    match &children.nodes[1] {
        ChildNode::Invalid { label, context, .. } => {
            assert_eq!(label, "Bad Name");
            assert_eq!(context, INVALID_REPOSITORY_CONTEXT);
        }
        other => panic!("Expected Invalid, got {other:?}"),
    }
    assert_eq!(
        children.nodes[2].item().map(|n| n.image_path.as_str()),
        Some("registry.gitlab.com/group/app")
    );
    assert!(node.has_more_children(&children.next));
}

#[tokio::test]
async fn test_load_children_clear_cache_restarts() {
    let fetch = Arc::new(FakeFetch::default().respond(
        &first_url("42", 2),
        200,
        r#"[{"name":"api","id":1}]"#,
        None,
    ));
    let node = project_node(fetch.clone());

    let stale = PageCursor::Next("https://gitlab.example.com/stale".to_string());
    let children = node.load_more_children(&stale, true).await.unwrap();

    assert_eq!(children.nodes.len(), 1);
    assert!(!node.has_more_children(&children.next));
    assert_eq!(fetch.requested_urls(), vec![first_url("42", 2)]);
}

#[tokio::test]
async fn test_load_children_propagates_request_errors() {
    let fetch = Arc::new(FakeFetch::default().respond(&first_url("42", 2), 401, "", None));
    let node = project_node(fetch);

    let err = node
        .load_more_children(&PageCursor::Start, false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_docker_cli_credentials() {
    let node = project_node(Arc::new(FakeFetch::default()));
    let store = MemoryCredentialStore::with_entry("gitlab", Credentials::token("glpat-1"));

    let creds = node.docker_cli_credentials(&store, "gitlab").await.unwrap();
    assert_eq!(creds.registry_path, "registry.gitlab.com");
    assert_eq!(creds.auth, Credentials::token("glpat-1"));

    let err = node
        .docker_cli_credentials(&store, "other")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CredentialMissing { .. }));
}

// ============================================================================
// Child construction
// ============================================================================

#[test_case("" ; "root repository")]
#[test_case("api" ; "single component")]
#[test_case("backend/api" ; "nested")]
#[test_case("my-app.v2" ; "dash and dot")]
#[test_case("a__b" ; "double underscore")]
#[test_case("a---b" ; "dash run")]
#[test_case("v1_2/x.y" ; "underscore and nested dot")]
fn test_valid_repository_names(name: &str) {
    assert!(validate_repository_name(name).is_ok());
}

#[test_case("Api" ; "uppercase")]
#[test_case("with space" ; "space")]
#[test_case("-api" ; "leading dash")]
#[test_case("api." ; "trailing dot")]
#[test_case("a..b" ; "double dot")]
#[test_case("a___b" ; "triple underscore")]
#[test_case("a//b" ; "empty component")]
#[test_case("a/" ; "trailing slash")]
#[test_case("a-_b" ; "mixed separator")]
#[test_case("a/B" ; "uppercase nested component")]
fn test_invalid_repository_names(name: &str) {
    assert!(matches!(
        validate_repository_name(name),
        Err(Error::InvalidRepositoryName { .. })
    ));
}

#[test]
fn test_build_children_keeps_order_and_isolates_failures() {
    let items = vec![1, 2, 3, 4];
    let nodes = build_children_with_error_handling(
        &items,
        "invalidNumber",
        |n| {
            if n % 2 == 0 {
                Err(Error::config("even"))
            } else {
                Ok(n * 10)
            }
        },
        ToString::to_string,
    );

    assert_eq!(
        nodes,
        vec![
            ChildNode::Item(10),
            ChildNode::Invalid {
                label: "2".to_string(),
                context: "invalidNumber".to_string(),
                message: "Configuration error: even".to_string(),
            },
            ChildNode::Item(30),
            ChildNode::Invalid {
                label: "4".to_string(),
                context: "invalidNumber".to_string(),
                message: "Configuration error: even".to_string(),
            },
        ]
    );
}
