use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use graft_util::errors::GraftError;

use crate::dependency::{Dependency, DependencyMetadata, ModuleVersionIdentifier};
use crate::metadata::ModuleVersionMetadata;

/// The parsed representation of a `Graft.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectMetadata,

    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,

    #[serde(default)]
    pub repository: Vec<RepositoryEntry>,
}

/// Project identity from the `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub group: Option<String>,
    pub name: String,
    pub version: String,
}

/// A named module repository from `[[repository]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    #[serde(default)]
    pub module: Vec<ModuleEntry>,
}

/// One published module version from `[[repository.module]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// `group:name:version`
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "status-scheme")]
    pub status_scheme: Option<Vec<String>>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,
}

impl Manifest {
    /// Read and parse a `Graft.toml` from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    /// Parse a `Graft.toml` from a string.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            GraftError::Manifest {
                message: format!("Failed to parse Graft.toml: {e}"),
            }
            .into()
        })
    }

    /// The project's own identity, used as the graph root.
    pub fn root_id(&self) -> ModuleVersionIdentifier {
        ModuleVersionIdentifier::new(
            self.project.group.clone().unwrap_or_default(),
            self.project.name.clone(),
            self.project.version.clone(),
        )
    }

    /// Direct dependency declarations, in manifest key order.
    pub fn dependency_declarations(&self) -> miette::Result<Vec<DependencyMetadata>> {
        let mut deps = Vec::with_capacity(self.dependencies.len());
        for (key, dep) in &self.dependencies {
            deps.push(dep.to_metadata(key)?);
        }
        Ok(deps)
    }
}

impl ModuleEntry {
    /// Convert to metadata, filling in the status scheme when the entry has none.
    pub fn to_metadata(&self, default_scheme: &[String]) -> miette::Result<ModuleVersionMetadata> {
        let id = ModuleVersionIdentifier::parse(&self.id).ok_or_else(|| GraftError::Manifest {
            message: format!(
                "Invalid module id '{}', expected 'group:name:version'",
                self.id
            ),
        })?;
        let scheme = self
            .status_scheme
            .clone()
            .unwrap_or_else(|| default_scheme.to_vec());
        let mut meta = ModuleVersionMetadata::new(id).with_status_scheme(scheme);
        if let Some(ref status) = self.status {
            meta = meta.with_status(status.clone());
        }
        for (key, dep) in &self.dependencies {
            meta = meta.with_dependency(dep.to_metadata(key)?);
        }
        Ok(meta)
    }
}
