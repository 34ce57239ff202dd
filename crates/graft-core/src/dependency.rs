use std::fmt;

use serde::{Deserialize, Serialize};

use graft_util::errors::GraftError;

/// A module without a version: `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
}

impl ModuleIdentifier {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse `"group:name"` into an identifier.
    pub fn parse(s: &str) -> Option<Self> {
        let (group, name) = s.split_once(':')?;
        if group.is_empty() || name.is_empty() || name.contains(':') {
            return None;
        }
        Some(Self::new(group, name))
    }

    /// Attach a version to this module.
    pub fn with_version(&self, version: impl Into<String>) -> ModuleVersionIdentifier {
        ModuleVersionIdentifier {
            group: self.group.clone(),
            name: self.name.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A concrete module version: `group:name:version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleVersionIdentifier {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleVersionIdentifier {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:name:version"` into an identifier.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() == 3 && parts.iter().all(|p| !p.is_empty()) {
            Some(Self::new(parts[0], parts[1], parts[2]))
        } else {
            None
        }
    }

    pub fn module(&self) -> ModuleIdentifier {
        ModuleIdentifier::new(self.group.clone(), self.name.clone())
    }
}

impl fmt::Display for ModuleVersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Identity of a component in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentIdentifier {
    /// A published module version.
    Module(ModuleVersionIdentifier),
    /// A project in the current build, identified by its path (e.g. `:app`).
    Project(String),
}

impl ComponentIdentifier {
    pub fn display_name(&self) -> String {
        match self {
            Self::Module(id) => id.to_string(),
            Self::Project(path) => format!("project {path}"),
        }
    }
}

impl From<ModuleVersionIdentifier> for ComponentIdentifier {
    fn from(id: ModuleVersionIdentifier) -> Self {
        Self::Module(id)
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// A transitive dependency to exclude: a whole group, or one `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExcludeRule {
    pub group: String,
    pub name: Option<String>,
}

impl ExcludeRule {
    /// Parse `"group"` or `"group:name"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        match s.split_once(':') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() => Some(Self {
                group: group.to_string(),
                name: Some(name.to_string()),
            }),
            Some(_) => None,
            None => Some(Self {
                group: s.to_string(),
                name: None,
            }),
        }
    }

    pub fn matches(&self, module: &ModuleIdentifier) -> bool {
        self.group == module.group && self.name.as_ref().map_or(true, |n| *n == module.name)
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{name}", self.group),
            None => f.write_str(&self.group),
        }
    }
}

/// A declared dependency: which module, which versions, and what to leave out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyMetadata {
    pub module: ModuleIdentifier,
    /// Version selector string, interpreted by the resolver's matcher chain.
    pub selector: String,
    /// Modules excluded from this dependency's transitive subtree.
    pub excludes: Vec<ExcludeRule>,
    /// Version selectors whose matches must not be selected.
    pub rejects: Vec<String>,
}

impl DependencyMetadata {
    pub fn new(module: ModuleIdentifier, selector: impl Into<String>) -> Self {
        Self {
            module,
            selector: selector.into(),
            excludes: Vec::new(),
            rejects: Vec::new(),
        }
    }

    pub fn exclude(mut self, rule: ExcludeRule) -> Self {
        self.excludes.push(rule);
        self
    }

    pub fn reject(mut self, selector: impl Into<String>) -> Self {
        self.rejects.push(selector.into());
        self
    }

    /// `group:name:selector` for messages.
    pub fn display_name(&self) -> String {
        format!("{}:{}", self.module, self.selector)
    }
}

/// A dependency specification in Graft.toml.
///
/// Supports both shorthand (`"1.2.+"`) and detailed forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Short(String),
    Detailed(DetailedDependency),
}

/// A dependency with an explicit selector plus exclusions and rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDependency {
    pub version: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub reject: Vec<String>,
}

impl Dependency {
    /// Convert a `"group:name" = ...` manifest entry into a declaration.
    pub fn to_metadata(&self, key: &str) -> Result<DependencyMetadata, GraftError> {
        let module = ModuleIdentifier::parse(key).ok_or_else(|| GraftError::Manifest {
            message: format!("Invalid module '{key}', expected 'group:name'"),
        })?;
        match self {
            Dependency::Short(selector) => Ok(DependencyMetadata::new(module, selector.trim())),
            Dependency::Detailed(d) => {
                let mut dep = DependencyMetadata::new(module, d.version.trim());
                for pattern in &d.exclude {
                    let rule = ExcludeRule::parse(pattern).ok_or_else(|| GraftError::Manifest {
                        message: format!("Invalid exclude '{pattern}' on {key}"),
                    })?;
                    dep = dep.exclude(rule);
                }
                for selector in &d.reject {
                    dep = dep.reject(selector.trim());
                }
                Ok(dep)
            }
        }
    }
}
