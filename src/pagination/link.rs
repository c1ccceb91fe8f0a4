//! Link header pagination (RFC 5988)
//!
//! Extracts the next page URL from the `Link` response header.
//! Format: `Link: <https://gitlab.com/api/v4/...&page=2>; rel="next", <...>; rel="last"`

use crate::types::PageCursor;
use reqwest::header::{HeaderMap, LINK};

/// Relation followed for forward pagination
pub const NEXT_REL: &str = "next";

/// Parse a Link header and extract the URL for the given rel
///
/// Relation names compare case-insensitively, and a `rel` parameter may list
/// several space-separated relation types.
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    for part in split_links(header) {
        // The target may itself contain `;`, so params start after the `>`
        let Some(rest) = part.strip_prefix('<') else {
            continue;
        };
        let Some((url, params)) = rest.split_once('>') else {
            continue;
        };

        for param in params.split(';') {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            if !name.trim().eq_ignore_ascii_case("rel") {
                continue;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if value
                .split_ascii_whitespace()
                .any(|rel| rel.eq_ignore_ascii_case(target_rel))
            {
                return Some(url.trim().to_string());
            }
        }
    }

    None
}

/// Extract the `rel="next"` URL from all `Link` headers of a response
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| parse_link_header(v, NEXT_REL))
}

/// Cursor for the page following a response with these headers
pub fn next_cursor(headers: &HeaderMap) -> PageCursor {
    PageCursor::from_next_link(next_link(headers))
}

/// Split a Link header into link-values, ignoring commas inside `<...>`
fn split_links(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quotes => depth += 1,
            '>' if !in_quotes => depth = depth.saturating_sub(1),
            '"' => in_quotes = !in_quotes,
            ',' if depth == 0 && !in_quotes => {
                parts.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(header[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}
