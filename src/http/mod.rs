//! HTTP client module
//!
//! Provides the `Fetch` capability used by the registry lister and a
//! reqwest-backed implementation of it.
//!
//! # Features
//!
//! - **Single request per call**: no retries, no backoff
//! - **Full body read**: responses are returned with headers and bytes
//! - **Substitutable**: tests can supply their own `Fetch` implementation

mod client;

pub use client::{Fetch, FetchResponse, HttpClient, HttpClientConfig, HttpClientConfigBuilder};
