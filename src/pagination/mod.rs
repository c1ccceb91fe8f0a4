//! Pagination module
//!
//! Forward pagination through RFC 5988 `Link` headers. The cursor type
//! itself lives in [`crate::types::PageCursor`].

mod link;

pub use link::{next_cursor, next_link, parse_link_header, NEXT_REL};
