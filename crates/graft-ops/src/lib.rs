pub mod ops_cycles;
pub mod ops_resolve;
pub mod ops_tree;

use std::path::Path;

use graft_core::config::GraftConfig;
use graft_core::manifest::Manifest;
use graft_resolver::repository::{InMemoryRepository, ModuleRepository};
use graft_resolver::{ResolutionResult, Resolver};
use graft_util::errors::GraftError;

/// Load the manifest and optional config, then resolve the project's dependencies.
pub fn load_and_resolve(
    manifest_path: &Path,
    config_path: Option<&Path>,
) -> miette::Result<ResolutionResult> {
    let manifest = Manifest::from_path(manifest_path)?;
    let config = GraftConfig::load(config_path)?;
    resolve_manifest(&manifest, &config)
}

/// Resolve an already parsed manifest.
pub fn resolve_manifest(manifest: &Manifest, config: &GraftConfig) -> miette::Result<ResolutionResult> {
    let scheme = &config.resolution.status_scheme;
    let mut repositories: Vec<Box<dyn ModuleRepository>> =
        Vec::with_capacity(manifest.repository.len());
    for entry in &manifest.repository {
        let repository = InMemoryRepository::from_entry(entry, scheme)?;
        tracing::debug!("Loaded repository '{}' with {} versions", entry.name, repository.len());
        repositories.push(Box::new(repository));
    }

    let root = manifest.root_id();
    let declarations = manifest.dependency_declarations()?;
    let resolver = Resolver::from_config(&config.resolution, repositories)?;
    let result = resolver.resolve(&root, &declarations)?;
    tracing::debug!(
        "Resolved {} in {} rounds ({} modules)",
        root,
        result.rounds,
        result.selected.len()
    );
    Ok(result)
}

/// Fail when any declaration could not be resolved.
pub fn ensure_complete(result: &ResolutionResult) -> miette::Result<()> {
    if result.is_complete() {
        return Ok(());
    }
    let lines: Vec<String> = result.unresolved.iter().map(ToString::to_string).collect();
    Err(GraftError::Resolution {
        message: format!(
            "{} dependencies could not be resolved:\n  {}",
            lines.len(),
            lines.join("\n  ")
        ),
    }
    .into())
}
