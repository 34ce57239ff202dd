use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::metadata::default_status_scheme;

/// Resolver configuration loaded from a TOML file.
///
/// All keys live under `[resolution]`; a missing file means defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraftConfig {
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

/// Settings from `[resolution]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub conflict: ConflictStrategy,
    #[serde(default = "default_max_rounds", rename = "max-rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_matchers")]
    pub matchers: Vec<MatcherName>,
    #[serde(default = "default_status_scheme", rename = "status-scheme")]
    pub status_scheme: Vec<String>,
    #[serde(default)]
    pub reject: Vec<RejectRule>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            conflict: ConflictStrategy::default(),
            max_rounds: default_max_rounds(),
            matchers: default_matchers(),
            status_scheme: default_status_scheme(),
            reject: Vec::new(),
        }
    }
}

fn default_max_rounds() -> usize {
    32
}

fn default_matchers() -> Vec<MatcherName> {
    vec![
        MatcherName::Range,
        MatcherName::SubVersion,
        MatcherName::Latest,
        MatcherName::Exact,
    ]
}

/// How competing versions of one module are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// The newest requested version wins.
    #[default]
    Latest,
    /// Any two different versions of the same module are an error.
    Fail,
}

/// Names of the version matcher kinds, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherName {
    Range,
    SubVersion,
    Latest,
    Exact,
}

/// A global rule rejecting versions of a module, from `[[resolution.reject]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRule {
    /// `group:name` of the module the rule applies to.
    pub module: String,
    /// Version selector whose matches are rejected.
    pub version: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl GraftConfig {
    /// Load configuration from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> miette::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| {
            graft_util::errors::GraftError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            graft_util::errors::GraftError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }
}
