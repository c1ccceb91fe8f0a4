//! CLI module
//!
//! Command-line interface for listing registry repositories.
//!
//! # Commands
//!
//! - `repos` - List one page (or all pages) of a project's repositories
//! - `image-path` - Show a project's image path and its repositories' paths
//! - `credentials` - Show which credentials `docker login` would use

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
