//! Metadata sources for module versions.

use std::collections::BTreeMap;

use graft_core::dependency::{ModuleIdentifier, ModuleVersionIdentifier};
use graft_core::manifest::RepositoryEntry;
use graft_core::metadata::ModuleVersionMetadata;

use crate::error::ResolveResult;

/// A source of published module versions.
///
/// Implementations push every location they look at onto `attempted`, whether
/// or not anything was found there.
pub trait ModuleRepository {
    fn name(&self) -> &str;

    /// All known versions of `module`, or `None` if the module is unknown here.
    fn list_versions(
        &self,
        module: &ModuleIdentifier,
        attempted: &mut Vec<String>,
    ) -> ResolveResult<Option<Vec<String>>>;

    /// Metadata for one version, or `None` if it is not published here.
    fn metadata(
        &self,
        id: &ModuleVersionIdentifier,
        attempted: &mut Vec<String>,
    ) -> ResolveResult<Option<ModuleVersionMetadata>>;
}

/// A repository held in memory, typically loaded from `[[repository]]` in Graft.toml.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    name: String,
    modules: BTreeMap<ModuleIdentifier, Vec<ModuleVersionMetadata>>,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: BTreeMap::new(),
        }
    }

    /// Build a repository from a manifest entry.
    pub fn from_entry(entry: &RepositoryEntry, status_scheme: &[String]) -> miette::Result<Self> {
        let mut repo = Self::new(entry.name.clone());
        for module in &entry.module {
            repo.add(module.to_metadata(status_scheme)?);
        }
        Ok(repo)
    }

    /// Publish a module version, replacing an earlier entry for the same version.
    pub fn add(&mut self, metadata: ModuleVersionMetadata) -> &mut Self {
        let versions = self.modules.entry(metadata.id.module()).or_default();
        match versions.iter_mut().find(|m| m.id.version == metadata.id.version) {
            Some(existing) => *existing = metadata,
            None => versions.push(metadata),
        }
        self
    }

    pub fn with(mut self, metadata: ModuleVersionMetadata) -> Self {
        self.add(metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn location(&self, module: &ModuleIdentifier) -> String {
        format!("memory:{}/{}/{}", self.name, module.group, module.name)
    }
}

impl ModuleRepository for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_versions(
        &self,
        module: &ModuleIdentifier,
        attempted: &mut Vec<String>,
    ) -> ResolveResult<Option<Vec<String>>> {
        attempted.push(self.location(module));
        Ok(self
            .modules
            .get(module)
            .map(|versions| versions.iter().map(|m| m.id.version.clone()).collect()))
    }

    fn metadata(
        &self,
        id: &ModuleVersionIdentifier,
        attempted: &mut Vec<String>,
    ) -> ResolveResult<Option<ModuleVersionMetadata>> {
        let module = id.module();
        attempted.push(format!("{}/{}", self.location(&module), id.version));
        Ok(self
            .modules
            .get(&module)
            .and_then(|versions| versions.iter().find(|m| m.id.version == id.version))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::manifest::Manifest;

    fn meta(id: &str) -> ModuleVersionMetadata {
        ModuleVersionMetadata::new(ModuleVersionIdentifier::parse(id).unwrap())
    }

    #[test]
    fn lists_versions_and_records_location() {
        let repo = InMemoryRepository::new("local")
            .with(meta("org.a:a:1.0"))
            .with(meta("org.a:a:1.1"));
        let mut attempted = Vec::new();
        let versions = repo
            .list_versions(&ModuleIdentifier::new("org.a", "a"), &mut attempted)
            .unwrap();
        assert_eq!(versions, Some(vec!["1.0".to_string(), "1.1".to_string()]));
        assert_eq!(attempted, vec!["memory:local/org.a/a"]);
    }

    #[test]
    fn unknown_module_is_none() {
        let repo = InMemoryRepository::new("local");
        let mut attempted = Vec::new();
        let versions = repo
            .list_versions(&ModuleIdentifier::new("org.x", "x"), &mut attempted)
            .unwrap();
        assert!(versions.is_none());
        assert_eq!(attempted.len(), 1);
    }

    #[test]
    fn metadata_lookup() {
        let repo = InMemoryRepository::new("local").with(meta("org.a:a:1.0"));
        let mut attempted = Vec::new();
        let found = repo
            .metadata(&ModuleVersionIdentifier::new("org.a", "a", "1.0"), &mut attempted)
            .unwrap();
        assert_eq!(found.map(|m| m.id.version), Some("1.0".to_string()));
        let missing = repo
            .metadata(&ModuleVersionIdentifier::new("org.a", "a", "2.0"), &mut attempted)
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(
            attempted,
            vec!["memory:local/org.a/a/1.0", "memory:local/org.a/a/2.0"]
        );
    }

    #[test]
    fn adding_same_version_replaces() {
        let mut repo = InMemoryRepository::new("local");
        repo.add(meta("org.a:a:1.0"));
        repo.add(meta("org.a:a:1.0").with_status("release"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn built_from_manifest_entry() {
        let manifest = Manifest::from_str(
            r#"
[project]
name = "app"
version = "1.0"

[[repository]]
name = "central"

[[repository.module]]
id = "org.a:a:1.0"
status = "release"
dependencies = { "org.b:b" = "2.+" }
"#,
        )
        .unwrap();
        let scheme = graft_core::metadata::default_status_scheme();
        let repo = InMemoryRepository::from_entry(&manifest.repository[0], &scheme).unwrap();
        assert_eq!(repo.name(), "central");
        let mut attempted = Vec::new();
        let meta = repo
            .metadata(&ModuleVersionIdentifier::new("org.a", "a", "1.0"), &mut attempted)
            .unwrap()
            .unwrap();
        assert_eq!(meta.status, "release");
        assert_eq!(meta.dependencies[0].selector, "2.+");
    }
}
