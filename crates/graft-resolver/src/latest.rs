//! Ordering of versions and selectors by "latest".

use std::cmp::Ordering;

use graft_core::dependency::ModuleVersionIdentifier;
use graft_core::metadata::ModuleVersionMetadata;

use crate::error::{ResolveError, ResolveResult};
use crate::matcher::{ChainVersionMatcher, VersionSelector};

/// Anything that carries a version string or selector.
pub trait Versioned {
    fn version(&self) -> &str;
}

impl Versioned for str {
    fn version(&self) -> &str {
        self
    }
}

impl Versioned for String {
    fn version(&self) -> &str {
        self
    }
}

impl Versioned for ModuleVersionIdentifier {
    fn version(&self) -> &str {
        &self.version
    }
}

impl Versioned for ModuleVersionMetadata {
    fn version(&self) -> &str {
        &self.id.version
    }
}

impl<T: Versioned + ?Sized> Versioned for &T {
    fn version(&self) -> &str {
        (**self).version()
    }
}

/// Orders versions and dynamic selectors so that the newest sorts last.
///
/// A dynamic selector is compared with a concrete version through its own
/// `compare`; when two dynamic selectors meet, the first argument plays the
/// selector. The resulting relation is not guaranteed to be a total order, so
/// sorting and max-finding here never assume it is.
#[derive(Debug, Clone, Default)]
pub struct LatestVersionStrategy {
    matcher: ChainVersionMatcher,
}

impl LatestVersionStrategy {
    pub fn new(matcher: ChainVersionMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &ChainVersionMatcher {
        &self.matcher
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_selectors(&self.selector(a), &self.selector(b))
    }

    /// Stable ascending sort.
    pub fn sort<T: Versioned>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut keyed: Vec<(VersionSelector, T)> = items
            .into_iter()
            .map(|item| (self.selector(item.version()), item))
            .collect();
        // Insertion sort: terminates and stays stable whatever the comparator says.
        for i in 1..keyed.len() {
            let mut j = i;
            while j > 0 && compare_selectors(&keyed[j - 1].0, &keyed[j].0) == Ordering::Greater {
                keyed.swap(j - 1, j);
                j -= 1;
            }
        }
        keyed.into_iter().map(|(_, item)| item).collect()
    }

    /// The newest element; the first one wins among equals.
    pub fn find_latest<'a, T: Versioned>(&self, items: &'a [T]) -> ResolveResult<&'a T> {
        let (first, rest) = items.split_first().ok_or(ResolveError::NoVersions)?;
        let mut best = (self.selector(first.version()), first);
        for item in rest {
            let candidate = self.selector(item.version());
            if compare_selectors(&candidate, &best.0) == Ordering::Greater {
                best = (candidate, item);
            }
        }
        Ok(best.1)
    }

    // Strings the chain cannot parse are still versions; compare them literally.
    fn selector(&self, version: &str) -> VersionSelector {
        self.matcher
            .parse(version)
            .unwrap_or_else(|_| VersionSelector::exact(version))
    }
}

fn compare_selectors(a: &VersionSelector, b: &VersionSelector) -> Ordering {
    match (a.is_dynamic(), b.is_dynamic()) {
        (false, false) => a.compare(b.as_str()),
        (true, _) => selector_wins(a.compare(b.as_str())),
        (false, true) => selector_wins(b.compare(a.as_str())).reverse(),
    }
}

fn selector_wins(ord: Ordering) -> Ordering {
    if ord == Ordering::Less {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}
