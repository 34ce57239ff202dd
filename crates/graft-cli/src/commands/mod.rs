//! Command dispatch and handler modules.

mod cycles;
mod resolve;
mod tree;

use std::path::{Path, PathBuf};

use miette::Result;

use graft_util::errors::GraftError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let manifest = find_manifest(&cli.manifest)?;
    let config = cli.config.as_deref();
    tracing::debug!("Using manifest {}", manifest.display());

    match cli.command {
        Command::Resolve => resolve::exec(&manifest, config),
        Command::Tree {
            depth,
            why,
            conflicts,
            inverted,
        } => tree::exec(&manifest, config, depth, why, conflicts, inverted),
        Command::Cycles => cycles::exec(&manifest, config),
    }
}

fn find_manifest(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    Err(GraftError::Manifest {
        message: format!("Could not find {}", path.display()),
    }
    .into())
}
