//! Module version metadata as supplied by a metadata source.

use crate::dependency::{DependencyMetadata, ModuleVersionIdentifier};

/// Status assigned to modules that do not declare one.
pub const DEFAULT_STATUS: &str = "integration";

/// Statuses ordered from least to most stable.
pub const DEFAULT_STATUS_SCHEME: [&str; 3] = ["integration", "milestone", "release"];

/// The default status scheme as owned strings.
pub fn default_status_scheme() -> Vec<String> {
    DEFAULT_STATUS_SCHEME.iter().map(|s| s.to_string()).collect()
}

/// A concrete module version together with its maturity and declared dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersionMetadata {
    pub id: ModuleVersionIdentifier,
    pub status: String,
    pub status_scheme: Vec<String>,
    pub dependencies: Vec<DependencyMetadata>,
}

impl ModuleVersionMetadata {
    /// Metadata with the default status and status scheme and no dependencies.
    pub fn new(id: ModuleVersionIdentifier) -> Self {
        Self {
            id,
            status: DEFAULT_STATUS.to_string(),
            status_scheme: default_status_scheme(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_status_scheme(mut self, scheme: Vec<String>) -> Self {
        self.status_scheme = scheme;
        self
    }

    pub fn with_dependency(mut self, dependency: DependencyMetadata) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn version(&self) -> &str {
        &self.id.version
    }

    /// Position of `status` in this module's status scheme.
    pub fn status_index(&self, status: &str) -> Option<usize> {
        self.status_scheme.iter().position(|s| s == status)
    }
}
