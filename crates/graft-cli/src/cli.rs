//! CLI argument definitions for Graft.
//!
//! Each command corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "graft",
    version,
    about = "Resolve and inspect module dependency graphs",
    long_about = "Graft resolves the dependencies declared in Graft.toml against the \
                  repositories listed there, reconciles version conflicts and reports cycles."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the project manifest
    #[arg(long, global = true, default_value = "Graft.toml")]
    pub manifest: PathBuf,

    /// Resolution config file
    #[arg(long, global = true, env = "GRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and list the selected versions
    Resolve,

    /// Display the dependency tree
    Tree {
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Explain why a dependency is included
        #[arg(long)]
        why: Option<String>,
        /// Show version conflicts
        #[arg(long)]
        conflicts: bool,
        /// Show the modules depending on MODULE
        #[arg(long, value_name = "MODULE")]
        inverted: Option<String>,
    },

    /// Report dependency cycles
    Cycles,
}

pub fn parse() -> Cli {
    Cli::parse()
}
