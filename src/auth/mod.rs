//! Authentication module
//!
//! Supports: no auth, fixed credentials, store-backed lookup
//!
//! The `Authenticator` trait attaches credentials to a request. The
//! store-backed implementation resolves credentials lazily by provider key
//! and caches them for later requests.

mod authenticator;
mod store;
mod types;

pub use authenticator::{Authenticator, NoAuth, StaticAuth, StoreAuthenticator};
pub use store::{CredentialStore, EnvCredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use types::{CachedCredentials, Credentials};
