//! CLI argument definitions using clap's derive API.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "fubber",
    version,
    about = "Local code search across registered projects"
)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a project root (creates the store if absent)
    Init {
        /// Project directory, absolute or relative
        path: PathBuf,
    },
    /// Rebuild the index for the project containing the working directory
    Index,
    /// Detect and apply changes for the current project
    Update,
    /// Search the current project's index
    Search {
        /// Query: terms, "phrases", col:term, ^anchor, prefix*, NEAR(...)
        query: String,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Emit one JSON object per hit
        #[arg(long)]
        json: bool,
    },
    /// List registered projects
    Projects {
        /// Emit the list as JSON
        #[arg(long)]
        json: bool,
    },
}
