//! The outcome of resolving one dependency declaration to a component id.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

use graft_core::dependency::{ComponentIdentifier, ModuleVersionIdentifier};
use graft_core::metadata::ModuleVersionMetadata;

use crate::error::{ResolveError, ResolveResult};

static NEXT_MARK: AtomicU64 = AtomicU64::new(0);

/// An identity used to tell whether a result was already visited by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkToken(u64);

impl MarkToken {
    pub fn new() -> Self {
        Self(NEXT_MARK.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MarkToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A version that matched the selector but was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RejectedVersion {
    pub version: String,
    pub reason: String,
}

impl RejectedVersion {
    pub fn new(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for RejectedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.version, self.reason)
    }
}

/// Read access to a resolve result.
pub trait ComponentIdResolveResult {
    fn failure(&self) -> Option<&ResolveError>;

    fn id(&self) -> ResolveResult<&ComponentIdentifier>;

    fn module_version_id(&self) -> ResolveResult<&ModuleVersionIdentifier>;

    /// Metadata, when the resolution produced it.
    fn metadata(&self) -> ResolveResult<Option<&ModuleVersionMetadata>>;

    fn is_rejected(&self) -> ResolveResult<bool>;

    /// Whether a terminal state (resolved, rejected or failed) was reached.
    fn has_result(&self) -> bool;

    fn attempted_locations(&self) -> &IndexSet<String>;

    fn unmatched_versions(&self) -> &IndexSet<String>;

    fn rejected_versions(&self) -> &IndexSet<RejectedVersion>;
}

type ResolvedView<'a> = (
    &'a ComponentIdentifier,
    &'a ModuleVersionIdentifier,
    Option<&'a ModuleVersionMetadata>,
    bool,
);

#[derive(Debug, Clone, Default)]
enum State {
    #[default]
    Unresolved,
    Resolved {
        id: ComponentIdentifier,
        module_version_id: ModuleVersionIdentifier,
        metadata: Option<ModuleVersionMetadata>,
        rejected: bool,
    },
    Failed(ResolveError),
}

/// Resolve result written by the step that owns it.
///
/// The last terminal transition wins and replaces whatever the previous one
/// stored. The diagnostic sets only ever grow.
#[derive(Debug, Clone, Default)]
pub struct BuildableComponentIdResolveResult {
    state: State,
    attempted: IndexSet<String>,
    unmatched: IndexSet<String>,
    rejections: IndexSet<RejectedVersion>,
    last_mark: Option<MarkToken>,
}

impl BuildableComponentIdResolveResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolved(&mut self, id: ComponentIdentifier, module_version_id: ModuleVersionIdentifier) {
        self.state = State::Resolved {
            id,
            module_version_id,
            metadata: None,
            rejected: false,
        };
    }

    pub fn resolved_metadata(&mut self, metadata: ModuleVersionMetadata) {
        self.state = State::Resolved {
            id: ComponentIdentifier::Module(metadata.id.clone()),
            module_version_id: metadata.id.clone(),
            metadata: Some(metadata),
            rejected: false,
        };
    }

    pub fn rejected(&mut self, id: ComponentIdentifier, module_version_id: ModuleVersionIdentifier) {
        self.state = State::Resolved {
            id,
            module_version_id,
            metadata: None,
            rejected: true,
        };
    }

    pub fn failed(&mut self, failure: ResolveError) {
        self.state = State::Failed(failure);
    }

    pub fn attempted(&mut self, location: impl Into<String>) {
        self.attempted.insert(location.into());
    }

    pub fn unmatched<I, S>(&mut self, versions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut versions = versions.into_iter().peekable();
        if versions.peek().is_some() {
            self.unmatched.extend(versions.map(Into::into));
        }
    }

    pub fn rejections(&mut self, versions: impl IntoIterator<Item = RejectedVersion>) {
        let mut versions = versions.into_iter().peekable();
        if versions.peek().is_some() {
            self.rejections.extend(versions);
        }
    }

    /// Record a visit by `token`; false if the previous visit used the same token.
    pub fn mark(&mut self, token: MarkToken) -> bool {
        if self.last_mark == Some(token) {
            return false;
        }
        self.last_mark = Some(token);
        true
    }

    fn resolved_state(&self) -> ResolveResult<ResolvedView<'_>> {
        match &self.state {
            State::Resolved {
                id,
                module_version_id,
                metadata,
                rejected,
            } => Ok((id, module_version_id, metadata.as_ref(), *rejected)),
            State::Failed(failure) => Err(failure.clone()),
            State::Unresolved => Err(ResolveError::NotResolved),
        }
    }
}

impl ComponentIdResolveResult for BuildableComponentIdResolveResult {
    fn failure(&self) -> Option<&ResolveError> {
        match &self.state {
            State::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    fn id(&self) -> ResolveResult<&ComponentIdentifier> {
        self.resolved_state().map(|(id, ..)| id)
    }

    fn module_version_id(&self) -> ResolveResult<&ModuleVersionIdentifier> {
        self.resolved_state().map(|(_, mvid, ..)| mvid)
    }

    fn metadata(&self) -> ResolveResult<Option<&ModuleVersionMetadata>> {
        self.resolved_state().map(|(_, _, metadata, _)| metadata)
    }

    fn is_rejected(&self) -> ResolveResult<bool> {
        self.resolved_state().map(|(.., rejected)| rejected)
    }

    fn has_result(&self) -> bool {
        !matches!(self.state, State::Unresolved)
    }

    fn attempted_locations(&self) -> &IndexSet<String> {
        &self.attempted
    }

    fn unmatched_versions(&self) -> &IndexSet<String> {
        &self.unmatched
    }

    fn rejected_versions(&self) -> &IndexSet<RejectedVersion> {
        &self.rejections
    }
}
