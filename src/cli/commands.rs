//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GitLab container registry lister
#[derive(Parser, Debug)]
#[command(name = "gitlab-registry-lister")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// GitLab instance URL (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Send requests without credentials
    #[arg(long, global = true)]
    pub anonymous: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a project's registry repositories
    Repos {
        /// Project id or URL path (e.g. 42 or group/app)
        #[arg(short, long)]
        project: String,

        /// Repositories per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<u32>,

        /// Resume from a next-page URL printed by a previous run
        #[arg(long, conflicts_with = "all")]
        cursor: Option<String>,

        /// Fetch every page
        #[arg(long)]
        all: bool,
    },

    /// Show image paths for a project
    ImagePath {
        /// Project id or URL path
        #[arg(short, long)]
        project: String,

        /// Namespace path used in image names (e.g. group/app)
        #[arg(long)]
        path: String,

        /// Also list the image path of every repository
        #[arg(long)]
        list: bool,
    },

    /// Show the credentials used to log the docker CLI in to the registry
    Credentials {
        /// Namespace path of the project
        #[arg(long)]
        path: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Pretty,
}
