use std::cell::Cell;
use std::rc::Rc;

use graft_core::config::{ConflictStrategy, RejectRule, ResolutionConfig};
use graft_core::dependency::{
    DependencyMetadata, ExcludeRule, ModuleIdentifier, ModuleVersionIdentifier,
};
use graft_core::metadata::ModuleVersionMetadata;
use graft_resolver::error::ResolveResult;
use graft_resolver::repository::{InMemoryRepository, ModuleRepository};
use graft_resolver::{ResolveError, Resolver};

fn dep(module: &str, selector: &str) -> DependencyMetadata {
    DependencyMetadata::new(ModuleIdentifier::parse(module).unwrap(), selector)
}

fn module(id: &str) -> ModuleVersionMetadata {
    ModuleVersionMetadata::new(ModuleVersionIdentifier::parse(id).unwrap()).with_status("release")
}

fn root() -> ModuleVersionIdentifier {
    ModuleVersionIdentifier::new("com.example", "app", "1.0")
}

fn resolver(repo: InMemoryRepository) -> Resolver {
    resolver_with(ResolutionConfig::default(), repo)
}

fn resolver_with(config: ResolutionConfig, repo: InMemoryRepository) -> Resolver {
    let repositories: Vec<Box<dyn ModuleRepository>> = vec![Box::new(repo)];
    Resolver::from_config(&config, repositories).unwrap()
}

#[test]
fn newest_requested_version_wins() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0"))
        .with(module("org.a:a:2.0"))
        .with(module("org.b:b:1.0").with_dependency(dep("org.a:a", "2.0")));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.b:b", "1.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("2.0"));
    assert_eq!(result.selected_version("org.b:b"), Some("1.0"));
    assert_eq!(result.conflicts.len(), 1);
    let conflict = &result.conflicts.conflicts[0];
    assert_eq!(conflict.requested, "1.0");
    assert_eq!(conflict.selected, "2.0");
    assert!(result.is_complete());
    assert_eq!(result.graph.len(), 2);
}

#[test]
fn selection_changes_follow_transitively() {
    // a:1.0 -> c:1.0 is requested first, but b pulls a up to 2.0, which wants c:2.0.
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0").with_dependency(dep("org.c:c", "1.0")))
        .with(module("org.a:a:2.0").with_dependency(dep("org.c:c", "2.0")))
        .with(module("org.b:b:1.0").with_dependency(dep("org.a:a", "2.0")))
        .with(module("org.c:c:1.0"))
        .with(module("org.c:c:2.0"));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.b:b", "1.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("2.0"));
    assert_eq!(result.selected_version("org.c:c"), Some("2.0"));
    assert!(result.rounds >= 2);
    let path = result.graph.find_path("org.c:c").unwrap();
    assert_eq!(path.len(), 3);
}

#[test]
fn evicted_versions_stop_requesting() {
    // a:1.0 asks for a newer c and for d, but is evicted by a:2.0 which only wants c:1.0.
    let repo = InMemoryRepository::new("local")
        .with(
            module("org.a:a:1.0")
                .with_dependency(dep("org.c:c", "5.0"))
                .with_dependency(dep("org.d:d", "1.0")),
        )
        .with(module("org.a:a:2.0").with_dependency(dep("org.c:c", "1.0")))
        .with(module("org.b:b:1.0").with_dependency(dep("org.a:a", "2.0")))
        .with(module("org.c:c:1.0"))
        .with(module("org.c:c:5.0"))
        .with(module("org.d:d:1.0"));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.b:b", "1.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("2.0"));
    assert_eq!(result.selected_version("org.c:c"), Some("1.0"));
    assert_eq!(result.selected_version("org.d:d"), None);

    let selected: Vec<String> = result.selected.values().map(ToString::to_string).collect();
    let mut in_graph: Vec<String> = result
        .graph
        .all_nodes()
        .iter()
        .map(|node| node.id.to_string())
        .collect();
    in_graph.sort();
    let mut sorted = selected.clone();
    sorted.sort();
    assert_eq!(sorted, in_graph);
    assert_eq!(sorted, vec!["org.a:a:2.0", "org.b:b:1.0", "org.c:c:1.0"]);

    let conflicts: Vec<String> = result
        .conflicts
        .conflicts
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        conflicts,
        vec!["org.a:a requested 1.0 but selected 2.0 (latest version wins)"]
    );
}

#[test]
fn oscillating_selection_has_no_fixpoint() {
    // a:1.0 wants x:2.0, x:2.0 wants a:2.0, and neither newer version asks for the other.
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0").with_dependency(dep("org.x:x", "2.0")))
        .with(module("org.a:a:2.0"))
        .with(module("org.x:x:1.0"))
        .with(module("org.x:x:2.0").with_dependency(dep("org.a:a", "2.0")));

    let err = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.x:x", "1.0")])
        .unwrap_err();

    assert!(matches!(err, ResolveError::NoFixpoint { rounds } if rounds < 32));
}

#[test]
fn dynamic_selectors_resolve_to_newest_match() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.2.0"))
        .with(module("org.a:a:1.2.7"))
        .with(module("org.a:a:1.3.0"))
        .with(module("org.b:b:0.9"))
        .with(module("org.b:b:1.4"))
        .with(module("org.b:b:2.0"));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.2.+"), dep("org.b:b", "[1.0,2.0)")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("1.2.7"));
    assert_eq!(result.selected_version("org.b:b"), Some("1.4"));
}

#[test]
fn one_failure_does_not_stop_the_rest() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0").with_dependency(dep("org.missing:gone", "1.+")));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.x:x", "3.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("1.0"));
    assert!(!result.is_complete());
    let mut failed: Vec<String> = result
        .unresolved
        .iter()
        .map(|u| u.requested.to_string())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["org.missing:gone:1.+", "org.x:x:3.0"]);

    let gone = result
        .unresolved
        .iter()
        .find(|u| u.requested.module.name == "gone")
        .unwrap();
    assert!(matches!(gone.error, ResolveError::ModuleVersionNotFound { .. }));
    assert_eq!(gone.from.to_string(), "org.a:a:1.0");
}

#[test]
fn rejected_versions_are_not_selected() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0"))
        .with(module("org.a:a:1.1"))
        .with(module("org.b:b:1.0"));

    let result = resolver(repo)
        .resolve(
            &root(),
            &[dep("org.a:a", "1.+").reject("1.1"), dep("org.b:b", "1.0").reject("1.0")],
        )
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("1.0"));
    assert_eq!(result.selected_version("org.b:b"), None);
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(result.rejected[0].id.to_string(), "org.b:b:1.0");
    assert!(result.graph.find("org.b:b").is_none());
}

#[test]
fn configured_reject_rules_apply_everywhere() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0"))
        .with(module("org.a:a:1.1"))
        .with(module("org.b:b:1.0").with_dependency(dep("org.a:a", "1.+")));
    let config = ResolutionConfig {
        reject: vec![RejectRule {
            module: "org.a:a".into(),
            version: "1.1".into(),
            reason: Some("known regression".into()),
        }],
        ..ResolutionConfig::default()
    };

    let result = resolver_with(config, repo)
        .resolve(&root(), &[dep("org.b:b", "1.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("1.0"));
}

#[test]
fn exclusions_prune_the_subtree() {
    let repo = InMemoryRepository::new("local")
        .with(
            module("org.a:a:1.0")
                .with_dependency(dep("org.legacy:old", "1.0"))
                .with_dependency(dep("org.b:b", "1.0")),
        )
        .with(module("org.b:b:1.0").with_dependency(dep("org.legacy:older", "1.0")))
        .with(module("org.legacy:old:1.0"))
        .with(module("org.legacy:older:1.0"));

    let declaration = dep("org.a:a", "1.0").exclude(ExcludeRule::parse("org.legacy").unwrap());
    let result = resolver(repo).resolve(&root(), &[declaration]).unwrap();

    assert_eq!(result.selected_version("org.b:b"), Some("1.0"));
    assert!(result.selected_version("org.legacy:old").is_none());
    assert!(result.selected_version("org.legacy:older").is_none());
    assert!(result.is_complete());
}

#[test]
fn exclusion_applies_only_below_its_declaration() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0").with_dependency(dep("org.c:c", "1.0")))
        .with(module("org.b:b:1.0").with_dependency(dep("org.c:c", "1.0")))
        .with(module("org.c:c:1.0"));

    let result = resolver(repo)
        .resolve(
            &root(),
            &[
                dep("org.a:a", "1.0").exclude(ExcludeRule::parse("org.c:c").unwrap()),
                dep("org.b:b", "1.0"),
            ],
        )
        .unwrap();

    assert_eq!(result.selected_version("org.c:c"), Some("1.0"));
    let c = result.graph.find("org.c:c").unwrap();
    let parents: Vec<String> = result
        .graph
        .dependents_of(c)
        .iter()
        .map(|(idx, _)| result.graph.node(*idx).id.name.clone())
        .collect();
    assert_eq!(parents, vec!["b"]);
}

#[test]
fn cycles_are_reported_by_version() {
    // X -> Y -> Z -> X plus X -> W
    let repo = InMemoryRepository::new("local")
        .with(
            module("org.x:x:1.0")
                .with_dependency(dep("org.y:y", "1.0"))
                .with_dependency(dep("org.w:w", "1.0")),
        )
        .with(module("org.y:y:1.0").with_dependency(dep("org.z:z", "1.0")))
        .with(module("org.z:z:1.0").with_dependency(dep("org.x:x", "1.0")))
        .with(module("org.w:w:1.0"));

    let result = resolver(repo).resolve(&root(), &[dep("org.x:x", "1.0")]).unwrap();

    assert_eq!(result.graph.len(), 4);
    assert_eq!(result.cycles.len(), 1);
    let mut cycle: Vec<String> = result.cycles[0].iter().map(|id| id.to_string()).collect();
    cycle.sort();
    assert_eq!(cycle, vec!["org.x:x:1.0", "org.y:y:1.0", "org.z:z:1.0"]);
    assert!(result.graph.print_tree(None).contains("org.x:x:1.0 (*)"));
}

#[test]
fn fail_strategy_rejects_conflicts() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0"))
        .with(module("org.a:a:2.0"))
        .with(module("org.b:b:1.0").with_dependency(dep("org.a:a", "2.0")));

    let err = resolver(repo)
        .with_conflict_strategy(ConflictStrategy::Fail)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.b:b", "1.0")])
        .unwrap_err();

    assert_eq!(
        err,
        ResolveError::VersionConflict {
            module: "org.a:a".into(),
            first: "1.0".into(),
            second: "2.0".into(),
        }
    );
}

#[test]
fn round_limit_is_enforced() {
    let repo = InMemoryRepository::new("local").with(module("org.a:a:1.0"));
    let err = resolver(repo)
        .with_max_rounds(1)
        .resolve(&root(), &[dep("org.a:a", "1.0")])
        .unwrap_err();
    assert_eq!(err, ResolveError::NoFixpoint { rounds: 1 });
}

#[test]
fn invalid_selector_aborts_resolution() {
    let repo = InMemoryRepository::new("local").with(module("org.a:a:1.0"));
    let err = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "[1.0")])
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidSelector { .. }));
}

#[test]
fn invalid_transitive_selector_fails_only_its_declaration() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0").with_dependency(dep("org.c:c", "[1.0")))
        .with(module("org.b:b:1.0"))
        .with(module("org.c:c:1.0"));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.b:b", "1.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.a:a"), Some("1.0"));
    assert_eq!(result.selected_version("org.b:b"), Some("1.0"));
    assert_eq!(result.selected_version("org.c:c"), None);
    assert_eq!(result.unresolved.len(), 1);
    let failed = &result.unresolved[0];
    assert_eq!(failed.from.to_string(), "org.a:a:1.0");
    assert!(matches!(failed.error, ResolveError::InvalidSelector { .. }));
}

#[test]
fn invalid_root_reject_aborts_before_resolving() {
    let repo = InMemoryRepository::new("local").with(module("org.a:a:1.0"));
    let err = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "1.0").reject("[2.0")])
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidSelector { .. }));
}

#[test]
fn latest_status_selector() {
    let repo = InMemoryRepository::new("local")
        .with(module("org.a:a:1.0"))
        .with(module("org.a:a:1.1").with_status("integration"));

    let result = resolver(repo)
        .resolve(&root(), &[dep("org.a:a", "latest.release")])
        .unwrap();
    assert_eq!(result.selected_version("org.a:a"), Some("1.0"));
}

/// Wraps a repository and counts version listings.
struct Counting {
    inner: InMemoryRepository,
    listings: Rc<Cell<usize>>,
}

impl ModuleRepository for Counting {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_versions(
        &self,
        module: &ModuleIdentifier,
        attempted: &mut Vec<String>,
    ) -> ResolveResult<Option<Vec<String>>> {
        self.listings.set(self.listings.get() + 1);
        self.inner.list_versions(module, attempted)
    }

    fn metadata(
        &self,
        id: &ModuleVersionIdentifier,
        attempted: &mut Vec<String>,
    ) -> ResolveResult<Option<ModuleVersionMetadata>> {
        self.inner.metadata(id, attempted)
    }
}

#[test]
fn declarations_are_resolved_once() {
    let listings = Rc::new(Cell::new(0));
    let repo = Counting {
        inner: InMemoryRepository::new("local")
            .with(module("org.a:a:1.0").with_dependency(dep("org.c:c", "1.+")))
            .with(module("org.b:b:1.0").with_dependency(dep("org.c:c", "1.+")))
            .with(module("org.c:c:1.5")),
        listings: Rc::clone(&listings),
    };
    let repositories: Vec<Box<dyn ModuleRepository>> = vec![Box::new(repo)];
    let resolver = Resolver::from_config(&ResolutionConfig::default(), repositories).unwrap();

    let result = resolver
        .resolve(&root(), &[dep("org.a:a", "1.0"), dep("org.b:b", "1.0")])
        .unwrap();

    assert_eq!(result.selected_version("org.c:c"), Some("1.5"));
    assert!(result.rounds >= 2);
    assert_eq!(listings.get(), 1);
}
