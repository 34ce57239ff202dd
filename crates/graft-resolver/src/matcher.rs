//! Version selectors and the chain of matchers that interprets them.
//!
//! A selector string is handed to each [`MatcherKind`] in chain order; the
//! first kind that claims it parses it into a [`VersionSelector`]. The exact
//! kind claims everything, so it always closes the chain.

use std::cmp::Ordering;
use std::fmt;

use graft_core::config::MatcherName;
use graft_core::metadata::ModuleVersionMetadata;

use crate::error::{ResolveError, ResolveResult};
use crate::version::{compare_versions, Version, VersionRange};

const LATEST_PREFIX: &str = "latest.";

/// The kinds of selector the chain knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    /// `[1.0,2.0)`, `(,1.5]`, `]1.0,2.0[`, `[1.2]`
    Range,
    /// `1.2.+`, `+`
    SubVersion,
    /// `latest.release`, `latest.integration`
    Latest,
    /// `1.2.3`
    Exact,
}

impl MatcherKind {
    pub fn can_handle(self, selector: &str) -> bool {
        match self {
            MatcherKind::Range => VersionRange::is_range_syntax(selector),
            MatcherKind::SubVersion => selector.ends_with('+'),
            MatcherKind::Latest => selector.starts_with(LATEST_PREFIX),
            MatcherKind::Exact => true,
        }
    }

    /// Parse a selector this kind has claimed.
    pub fn parse(self, selector: &str) -> ResolveResult<VersionSelector> {
        let invalid = |reason: String| ResolveError::InvalidSelector {
            selector: selector.to_string(),
            reason,
        };
        let parsed = match self {
            MatcherKind::Range => VersionSelector::Range {
                range: VersionRange::parse(selector).map_err(invalid)?,
                selector: selector.to_string(),
            },
            MatcherKind::SubVersion => {
                let prefix = &selector[..selector.len() - 1];
                if prefix.contains('+') {
                    return Err(invalid("'+' may only appear once, at the end".into()));
                }
                VersionSelector::SubVersion {
                    prefix: prefix.to_string(),
                    selector: selector.to_string(),
                }
            }
            MatcherKind::Latest => {
                let status = &selector[LATEST_PREFIX.len()..];
                if status.is_empty() {
                    return Err(invalid("missing status after 'latest.'".into()));
                }
                VersionSelector::Latest {
                    status: status.to_string(),
                    selector: selector.to_string(),
                }
            }
            MatcherKind::Exact => VersionSelector::exact(selector),
        };
        Ok(parsed)
    }
}

impl From<MatcherName> for MatcherKind {
    fn from(name: MatcherName) -> Self {
        match name {
            MatcherName::Range => MatcherKind::Range,
            MatcherName::SubVersion => MatcherKind::SubVersion,
            MatcherName::Latest => MatcherKind::Latest,
            MatcherName::Exact => MatcherKind::Exact,
        }
    }
}

/// A parsed version selector.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionSelector {
    Range { selector: String, range: VersionRange },
    SubVersion { selector: String, prefix: String },
    Latest { selector: String, status: String },
    Exact { selector: String, version: Version },
}

impl VersionSelector {
    pub fn exact(version: &str) -> Self {
        VersionSelector::Exact {
            selector: version.to_string(),
            version: Version::parse(version),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VersionSelector::Range { selector, .. }
            | VersionSelector::SubVersion { selector, .. }
            | VersionSelector::Latest { selector, .. }
            | VersionSelector::Exact { selector, .. } => selector,
        }
    }

    pub fn kind(&self) -> MatcherKind {
        match self {
            VersionSelector::Range { .. } => MatcherKind::Range,
            VersionSelector::SubVersion { .. } => MatcherKind::SubVersion,
            VersionSelector::Latest { .. } => MatcherKind::Latest,
            VersionSelector::Exact { .. } => MatcherKind::Exact,
        }
    }

    /// Whether more than one version can satisfy this selector.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, VersionSelector::Exact { .. })
    }

    /// Whether [`accept_metadata`](Self::accept_metadata) must be used instead of
    /// [`accept`](Self::accept).
    pub fn needs_metadata(&self) -> bool {
        matches!(self, VersionSelector::Latest { .. })
    }

    /// Check a candidate version string.
    ///
    /// A `latest.<status>` selector cannot decide from the string alone and
    /// accepts nothing here.
    pub fn accept(&self, candidate: &str) -> bool {
        match self {
            VersionSelector::Range { range, .. } => range.contains(&Version::parse(candidate)),
            VersionSelector::SubVersion { prefix, .. } => candidate.starts_with(prefix.as_str()),
            VersionSelector::Latest { .. } => false,
            VersionSelector::Exact { selector, .. } => selector == candidate,
        }
    }

    /// Check a candidate together with its metadata.
    pub fn accept_metadata(&self, candidate: &ModuleVersionMetadata) -> bool {
        match self {
            VersionSelector::Latest { status, .. } => {
                match (
                    candidate.status_index(status),
                    candidate.status_index(&candidate.status),
                ) {
                    (Some(wanted), Some(actual)) => wanted <= actual,
                    _ => false,
                }
            }
            _ => self.accept(candidate.version()),
        }
    }

    /// Compare this selector with a candidate version.
    ///
    /// `Equal` means the two cannot be told apart; callers treat the selector
    /// as the greater value in that case.
    pub fn compare(&self, candidate: &str) -> Ordering {
        match self {
            VersionSelector::Range { range, .. } => match &range.upper {
                None => Ordering::Greater,
                Some(upper) => match upper.version.cmp(&Version::parse(candidate)) {
                    Ordering::Equal if !upper.inclusive => Ordering::Less,
                    other => other,
                },
            },
            VersionSelector::SubVersion { prefix, .. } => {
                if candidate.starts_with(prefix.as_str()) {
                    Ordering::Greater
                } else {
                    compare_versions(prefix.trim_end_matches(['.', '-', '_']), candidate)
                }
            }
            VersionSelector::Latest { .. } => Ordering::Equal,
            VersionSelector::Exact { version, .. } => version.cmp(&Version::parse(candidate)),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered chain of matcher kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVersionMatcher {
    kinds: Vec<MatcherKind>,
}

impl ChainVersionMatcher {
    /// Build a chain from `kinds`, appending the exact kind if it is missing.
    pub fn new(kinds: impl IntoIterator<Item = MatcherKind>) -> Self {
        let mut chain: Vec<MatcherKind> = Vec::new();
        for kind in kinds {
            if !chain.contains(&kind) {
                chain.push(kind);
            }
        }
        if !chain.contains(&MatcherKind::Exact) {
            chain.push(MatcherKind::Exact);
        }
        Self { kinds: chain }
    }

    pub fn from_config(names: &[MatcherName]) -> Self {
        Self::new(names.iter().copied().map(MatcherKind::from))
    }

    pub fn kinds(&self) -> &[MatcherKind] {
        &self.kinds
    }

    pub fn can_handle(&self, selector: &str) -> bool {
        self.kinds.iter().any(|kind| kind.can_handle(selector))
    }

    /// The first kind in the chain that claims `selector`.
    pub fn matcher_for(&self, selector: &str) -> MatcherKind {
        self.kinds
            .iter()
            .copied()
            .find(|kind| kind.can_handle(selector))
            .unwrap_or(MatcherKind::Exact)
    }

    pub fn parse(&self, selector: &str) -> ResolveResult<VersionSelector> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(ResolveError::InvalidSelector {
                selector: String::new(),
                reason: "empty selector".into(),
            });
        }
        self.matcher_for(selector).parse(selector)
    }
}

impl Default for ChainVersionMatcher {
    fn default() -> Self {
        Self::new([
            MatcherKind::Range,
            MatcherKind::SubVersion,
            MatcherKind::Latest,
            MatcherKind::Exact,
        ])
    }
}
