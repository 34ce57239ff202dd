//! Round-based dependency resolution.
//!
//! Each round walks the graph of selected modules from the root, resolving
//! every declaration it meets. The versions those declarations resolve to
//! become that round's candidates, the conflict strategy picks one version per
//! module, and the next round walks the graph again with the new selection.
//! Resolution is done when a round leaves the selection unchanged.
//!
//! Candidates come only from the current round's walk, so requests made by an
//! evicted version stop counting once it is evicted. A selection that comes
//! back after changing is an oscillation and fails like an exhausted
//! `max_rounds`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use graft_core::config::{ConflictStrategy, ResolutionConfig};
use graft_core::dependency::{
    DependencyMetadata, ExcludeRule, ModuleIdentifier, ModuleVersionIdentifier,
};
use graft_core::metadata::ModuleVersionMetadata;

use crate::conflict::{ConflictReport, VersionConflict};
use crate::dynamic::DynamicVersionResolver;
use crate::error::{ResolveError, ResolveResult};
use crate::graph::{DepEdge, DependencyGraph, ResolvedNode};
use crate::matcher::ChainVersionMatcher;
use crate::repository::ModuleRepository;
use crate::result::{BuildableComponentIdResolveResult, ComponentIdResolveResult};
use crate::walker::{CachingDirectedGraphWalker, DirectedGraph};

/// What a declaration is resolved by: equal keys always resolve the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    pub module: ModuleIdentifier,
    pub selector: String,
    pub rejects: Vec<String>,
}

impl DependencyKey {
    pub fn of(dependency: &DependencyMetadata) -> Self {
        Self {
            module: dependency.module.clone(),
            selector: dependency.selector.clone(),
            rejects: dependency.rejects.clone(),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.selector)
    }
}

/// A node of a round's graph.
///
/// Exclusions are inherited along paths, so the same module reached with
/// different exclusions is a different node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    Root,
    Module {
        module: ModuleIdentifier,
        excludes: BTreeSet<ExcludeRule>,
    },
}

/// A declaration found while walking: who asked, and for what.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    pub from: ModuleVersionIdentifier,
    pub key: DependencyKey,
}

/// A declaration that could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedDependency {
    pub from: ModuleVersionIdentifier,
    pub requested: DependencyKey,
    pub error: ResolveError,
}

impl fmt::Display for UnresolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {}): {}", self.requested, self.from, self.error)
    }
}

/// A declaration whose version was found but rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDependency {
    pub from: ModuleVersionIdentifier,
    pub id: ModuleVersionIdentifier,
    pub reasons: Vec<String>,
}

impl fmt::Display for RejectedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {})", self.id, self.from)?;
        if !self.reasons.is_empty() {
            write!(f, ": {}", self.reasons.join(", "))?;
        }
        Ok(())
    }
}

/// The outcome of resolving a project.
#[derive(Debug)]
pub struct ResolutionResult {
    pub root: ModuleVersionIdentifier,
    pub graph: DependencyGraph,
    /// Selected version per module, in discovery order.
    pub selected: IndexMap<ModuleIdentifier, ModuleVersionIdentifier>,
    pub conflicts: ConflictReport,
    pub unresolved: Vec<UnresolvedDependency>,
    pub rejected: Vec<RejectedDependency>,
    pub cycles: Vec<Vec<ModuleVersionIdentifier>>,
    pub rounds: usize,
}

impl ResolutionResult {
    /// Whether every declaration resolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// The selected version of `group:name`.
    pub fn selected_version(&self, module: &str) -> Option<&str> {
        let module = ModuleIdentifier::parse(module)?;
        self.selected.get(&module).map(|id| id.version.as_str())
    }
}

/// Resolves a project's declarations into a consistent graph.
pub struct Resolver {
    versions: DynamicVersionResolver,
    conflict: ConflictStrategy,
    max_rounds: usize,
}

impl Resolver {
    pub fn new(versions: DynamicVersionResolver) -> Self {
        let defaults = ResolutionConfig::default();
        Self {
            versions,
            conflict: defaults.conflict,
            max_rounds: defaults.max_rounds,
        }
    }

    pub fn from_config(
        config: &ResolutionConfig,
        repositories: impl IntoIterator<Item = Box<dyn ModuleRepository>>,
    ) -> ResolveResult<Self> {
        let mut versions =
            DynamicVersionResolver::new(ChainVersionMatcher::from_config(&config.matchers));
        for repository in repositories {
            versions.add(repository);
        }
        for rule in &config.reject {
            versions.add_reject_rule(rule)?;
        }
        Ok(Self::new(versions)
            .with_conflict_strategy(config.conflict)
            .with_max_rounds(config.max_rounds))
    }

    pub fn with_conflict_strategy(mut self, conflict: ConflictStrategy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn versions(&self) -> &DynamicVersionResolver {
        &self.versions
    }

    /// Resolve `dependencies` declared by `root`.
    pub fn resolve(
        &self,
        root: &ModuleVersionIdentifier,
        dependencies: &[DependencyMetadata],
    ) -> ResolveResult<ResolutionResult> {
        for dependency in dependencies {
            self.versions.validate(dependency)?;
        }

        let mut memo: HashMap<DependencyKey, BuildableComponentIdResolveResult> = HashMap::new();
        let mut selected: IndexMap<ModuleIdentifier, ModuleVersionMetadata> = IndexMap::new();
        let mut history: HashSet<Vec<ModuleVersionIdentifier>> = HashSet::new();

        for round in 1..=self.max_rounds {
            let graph = RoundGraph {
                versions: &self.versions,
                root,
                root_dependencies: dependencies,
                selected: &selected,
                provisional: IndexMap::new(),
                memo: &mut memo,
            };
            let mut walker = CachingDirectedGraphWalker::new(graph);
            walker.add([GraphNode::Root]);
            let requests = walker.find_values()?;
            let components = walker.find_cycles()?;
            drop(walker);

            let next = self.select(&candidates_of(&requests, &memo))?;
            let settled = same_selection(&selected, &next);
            tracing::info!(
                "Resolution round {round}: {} requests, {} modules selected",
                requests.len(),
                next.len()
            );
            selected = next;

            if settled {
                return Ok(self.finish(root, &selected, &requests, &memo, components, round));
            }
            if !history.insert(selection_key(&selected)) {
                tracing::warn!("Selection in round {round} repeats an earlier round");
                return Err(ResolveError::NoFixpoint { rounds: round });
            }
        }

        Err(ResolveError::NoFixpoint {
            rounds: self.max_rounds,
        })
    }

    fn select(
        &self,
        candidates: &IndexMap<ModuleIdentifier, IndexMap<String, ModuleVersionMetadata>>,
    ) -> ResolveResult<IndexMap<ModuleIdentifier, ModuleVersionMetadata>> {
        let mut selected = IndexMap::with_capacity(candidates.len());
        for (module, versions) in candidates {
            let all: Vec<&ModuleVersionMetadata> = versions.values().collect();
            let winner = match self.conflict {
                ConflictStrategy::Fail => {
                    if let [first, second, ..] = all.as_slice() {
                        return Err(ResolveError::VersionConflict {
                            module: module.to_string(),
                            first: first.id.version.clone(),
                            second: second.id.version.clone(),
                        });
                    }
                    all.first().copied()
                }
                ConflictStrategy::Latest => {
                    Some(*self.versions.strategy().find_latest(&all)?)
                }
            };
            if let Some(winner) = winner {
                selected.insert(module.clone(), winner.clone());
            }
        }
        Ok(selected)
    }

    fn finish(
        &self,
        root: &ModuleVersionIdentifier,
        selected: &IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
        requests: &IndexSet<Request>,
        memo: &HashMap<DependencyKey, BuildableComponentIdResolveResult>,
        components: Vec<IndexSet<GraphNode>>,
        rounds: usize,
    ) -> ResolutionResult {
        let mut graph = DependencyGraph::new();
        let root_idx = graph.add_node(ResolvedNode::new(root.clone(), None));
        graph.set_root(root_idx);

        let mut conflicts = ConflictReport::new();
        let mut reported = HashSet::new();
        let mut unresolved = Vec::new();
        let mut rejected = Vec::new();

        for request in requests {
            let module = &request.key.module;
            if let Some(result) = memo.get(&request.key) {
                if let Some(error) = result.failure() {
                    tracing::warn!("Could not resolve {} (from {})", request.key, request.from);
                    unresolved.push(UnresolvedDependency {
                        from: request.from.clone(),
                        requested: request.key.clone(),
                        error: error.clone(),
                    });
                } else if result.is_rejected() == Ok(true) {
                    if let Ok(id) = result.module_version_id() {
                        rejected.push(RejectedDependency {
                            from: request.from.clone(),
                            id: id.clone(),
                            reasons: result
                                .rejected_versions()
                                .iter()
                                .map(|r| r.reason.clone())
                                .collect(),
                        });
                    }
                } else if let (Some(requested), Some(winner)) =
                    (selectable(result), selected.get(module))
                {
                    if requested.id != winner.id
                        && reported.insert((module.clone(), requested.id.version.clone()))
                    {
                        conflicts.add(VersionConflict {
                            module: module.clone(),
                            requested: requested.id.version.clone(),
                            selected: winner.id.version.clone(),
                            reason: conflict_reason(self.conflict).into(),
                        });
                    }
                }
            }

            let Some(target) = selected.get(module) else {
                continue;
            };
            let from_idx = if request.from == *root {
                root_idx
            } else {
                let status = selected.get(&request.from.module()).map(|m| m.status.clone());
                graph.add_node(ResolvedNode::new(request.from.clone(), status))
            };
            let to_idx = graph.add_node(ResolvedNode::new(
                target.id.clone(),
                Some(target.status.clone()),
            ));
            graph.add_edge(
                from_idx,
                to_idx,
                DepEdge {
                    requested: request.key.selector.clone(),
                },
            );
        }

        ResolutionResult {
            root: root.clone(),
            graph,
            selected: selected
                .iter()
                .map(|(module, metadata)| (module.clone(), metadata.id.clone()))
                .collect(),
            conflicts,
            unresolved,
            rejected,
            cycles: cycles_by_version(root, selected, components),
            rounds,
        }
    }
}

// Versions requested in one round, per module, in discovery order.
fn candidates_of(
    requests: &IndexSet<Request>,
    memo: &HashMap<DependencyKey, BuildableComponentIdResolveResult>,
) -> IndexMap<ModuleIdentifier, IndexMap<String, ModuleVersionMetadata>> {
    let mut candidates: IndexMap<ModuleIdentifier, IndexMap<String, ModuleVersionMetadata>> =
        IndexMap::new();
    for request in requests {
        if let Some(metadata) = memo.get(&request.key).and_then(selectable) {
            candidates
                .entry(request.key.module.clone())
                .or_default()
                .entry(metadata.id.version.clone())
                .or_insert_with(|| metadata.clone());
        }
    }
    candidates
}

fn selection_key(
    selected: &IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
) -> Vec<ModuleVersionIdentifier> {
    let mut ids: Vec<_> = selected.values().map(|m| m.id.clone()).collect();
    ids.sort();
    ids
}

fn conflict_reason(strategy: ConflictStrategy) -> &'static str {
    match strategy {
        ConflictStrategy::Latest => "latest version wins",
        ConflictStrategy::Fail => "conflicting versions are an error",
    }
}

// Metadata of a result that can take part in selection.
fn selectable(result: &BuildableComponentIdResolveResult) -> Option<&ModuleVersionMetadata> {
    match result.is_rejected() {
        Ok(false) => result.metadata().ok().flatten(),
        _ => None,
    }
}

fn same_selection(
    previous: &IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
    next: &IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
) -> bool {
    previous.len() == next.len()
        && previous
            .iter()
            .all(|(module, meta)| next.get(module).map_or(false, |other| other.id == meta.id))
}

// Several nodes of one module (differing only in exclusions) map to the same
// version, so identical cycles are reported once.
fn cycles_by_version(
    root: &ModuleVersionIdentifier,
    selected: &IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
    components: Vec<IndexSet<GraphNode>>,
) -> Vec<Vec<ModuleVersionIdentifier>> {
    let mut seen = HashSet::new();
    let mut cycles = Vec::new();
    for component in components {
        let ids: IndexSet<ModuleVersionIdentifier> = component
            .iter()
            .filter_map(|node| match node {
                GraphNode::Root => Some(root.clone()),
                GraphNode::Module { module, .. } => selected.get(module).map(|m| m.id.clone()),
            })
            .collect();
        let mut key: Vec<_> = ids.iter().cloned().collect();
        key.sort();
        if !ids.is_empty() && seen.insert(key) {
            cycles.push(ids.into_iter().collect());
        }
    }
    cycles
}

/// The graph walked in one round.
struct RoundGraph<'a> {
    versions: &'a DynamicVersionResolver,
    root: &'a ModuleVersionIdentifier,
    root_dependencies: &'a [DependencyMetadata],
    selected: &'a IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
    /// First resolution of a module not selected yet; lets the walk go on
    /// below it until the next round.
    provisional: IndexMap<ModuleIdentifier, ModuleVersionMetadata>,
    memo: &'a mut HashMap<DependencyKey, BuildableComponentIdResolveResult>,
}

impl RoundGraph<'_> {
    fn selection(&self, module: &ModuleIdentifier) -> Option<&ModuleVersionMetadata> {
        self.selected
            .get(module)
            .or_else(|| self.provisional.get(module))
    }

    // A malformed selector in repository metadata fails only this declaration.
    fn resolve(&mut self, dependency: &DependencyMetadata) -> Option<ModuleVersionMetadata> {
        let key = DependencyKey::of(dependency);
        if !self.memo.contains_key(&key) {
            let mut result = BuildableComponentIdResolveResult::new();
            if let Err(error) = self.versions.resolve(dependency, &mut result) {
                tracing::debug!("Cannot resolve {}: {error}", dependency.display_name());
                result.failed(error);
            }
            self.memo.insert(key.clone(), result);
        }
        self.memo.get(&key).and_then(selectable).cloned()
    }
}

impl DirectedGraph<GraphNode, Request> for RoundGraph<'_> {
    type Error = ResolveError;

    fn node_values(
        &mut self,
        node: &GraphNode,
        values: &mut IndexSet<Request>,
        successors: &mut Vec<GraphNode>,
    ) -> ResolveResult<()> {
        let (from, dependencies, excludes) = match node {
            GraphNode::Root => (
                self.root.clone(),
                self.root_dependencies.to_vec(),
                BTreeSet::new(),
            ),
            GraphNode::Module { module, excludes } => match self.selection(module) {
                Some(metadata) => (
                    metadata.id.clone(),
                    metadata.dependencies.clone(),
                    excludes.clone(),
                ),
                None => return Ok(()),
            },
        };

        for dependency in &dependencies {
            if excludes.iter().any(|rule| rule.matches(&dependency.module)) {
                tracing::debug!("Excluding {} below {}", dependency.display_name(), from);
                continue;
            }
            values.insert(Request {
                from: from.clone(),
                key: DependencyKey::of(dependency),
            });

            if let Some(metadata) = self.resolve(dependency) {
                if !self.selected.contains_key(&dependency.module) {
                    self.provisional
                        .entry(dependency.module.clone())
                        .or_insert(metadata);
                }
            }
            if self.selection(&dependency.module).is_some() {
                let mut inherited = excludes.clone();
                inherited.extend(dependency.excludes.iter().cloned());
                successors.push(GraphNode::Module {
                    module: dependency.module.clone(),
                    excludes: inherited,
                });
            }
        }
        Ok(())
    }
}
