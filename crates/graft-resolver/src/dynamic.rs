//! Turning one dependency declaration into a concrete module version.

use graft_core::config::RejectRule;
use graft_core::dependency::{ComponentIdentifier, DependencyMetadata, ModuleIdentifier};
use graft_core::metadata::ModuleVersionMetadata;

use crate::error::{ResolveError, ResolveResult};
use crate::latest::{LatestVersionStrategy, Versioned};
use crate::matcher::{ChainVersionMatcher, VersionSelector};
use crate::repository::ModuleRepository;
use crate::result::{BuildableComponentIdResolveResult, ComponentIdResolveResult, RejectedVersion};

/// Selectors whose matches must not be chosen, with the reason reported.
struct Rejection {
    selector: VersionSelector,
    reason: String,
}

/// A global rule rejecting versions of one module.
struct ModuleReject {
    module: ModuleIdentifier,
    rejection: Rejection,
}

/// A version found in one repository.
struct Match {
    metadata: ModuleVersionMetadata,
    repository: String,
    rejected: Option<String>,
}

impl Versioned for Match {
    fn version(&self) -> &str {
        &self.metadata.id.version
    }
}

/// Resolves declarations against an ordered list of repositories.
pub struct DynamicVersionResolver {
    repositories: Vec<Box<dyn ModuleRepository>>,
    strategy: LatestVersionStrategy,
    reject_rules: Vec<ModuleReject>,
}

impl DynamicVersionResolver {
    pub fn new(matcher: ChainVersionMatcher) -> Self {
        Self {
            repositories: Vec::new(),
            strategy: LatestVersionStrategy::new(matcher),
            reject_rules: Vec::new(),
        }
    }

    /// Append a repository; earlier repositories take precedence.
    pub fn add(&mut self, repository: Box<dyn ModuleRepository>) -> &mut Self {
        self.repositories.push(repository);
        self
    }

    /// Reject versions of a module everywhere it is requested.
    pub fn add_reject_rule(&mut self, rule: &RejectRule) -> ResolveResult<&mut Self> {
        let module = ModuleIdentifier::parse(&rule.module).ok_or_else(|| {
            ResolveError::InvalidSelector {
                selector: rule.module.clone(),
                reason: "reject rules name a module as 'group:name'".into(),
            }
        })?;
        let selector = self.matcher().parse(&rule.version)?;
        let reason = rule
            .reason
            .clone()
            .unwrap_or_else(|| format!("rejected by rule {}:{}", rule.module, rule.version));
        self.reject_rules.push(ModuleReject {
            module,
            rejection: Rejection { selector, reason },
        });
        Ok(self)
    }

    pub fn matcher(&self) -> &ChainVersionMatcher {
        self.strategy.matcher()
    }

    pub fn strategy(&self) -> &LatestVersionStrategy {
        &self.strategy
    }

    pub fn repository_names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name()).collect()
    }

    /// Check that the selector and rejects of `dependency` parse.
    pub fn validate(&self, dependency: &DependencyMetadata) -> ResolveResult<()> {
        self.matcher().parse(&dependency.selector)?;
        for reject in &dependency.rejects {
            self.matcher().parse(reject)?;
        }
        Ok(())
    }

    /// Resolve `dependency` into `result`.
    ///
    /// Only a malformed selector is returned as an error; everything else that
    /// goes wrong is recorded in `result` as a failure.
    pub fn resolve(
        &self,
        dependency: &DependencyMetadata,
        result: &mut BuildableComponentIdResolveResult,
    ) -> ResolveResult<()> {
        let selector = self.matcher().parse(&dependency.selector)?;
        let rejections = self.rejections_for(dependency)?;

        tracing::debug!(
            "Attempting to resolve version for {} using repositories {:?}",
            dependency.display_name(),
            self.repository_names()
        );

        let mut matches = Vec::new();
        let mut errors = Vec::new();
        for repository in &self.repositories {
            let mut attempted = Vec::new();
            let found = if selector.is_dynamic() {
                self.find_dynamic(
                    repository.as_ref(),
                    dependency,
                    &selector,
                    &rejections,
                    &mut attempted,
                    result,
                )
            } else {
                find_static(
                    repository.as_ref(),
                    dependency,
                    &selector,
                    &rejections,
                    &mut attempted,
                )
            };
            for location in attempted {
                result.attempted(location);
            }
            match found {
                Ok(Some(found)) => {
                    matches.push(found);
                    if !selector.is_dynamic() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => errors.push(e.to_string()),
            }
        }

        if let Ok(best) = self.strategy.find_latest(&matches) {
            if !errors.is_empty() {
                tracing::debug!(
                    "Discarding repository failures for {}: {}",
                    dependency.display_name(),
                    errors.join("; ")
                );
            }
            let id = best.metadata.id.clone();
            match &best.rejected {
                Some(reason) => {
                    tracing::debug!("Rejected {} from {}: {}", id, best.repository, reason);
                    result.rejections([RejectedVersion::new(id.version.clone(), reason.clone())]);
                    result.rejected(ComponentIdentifier::Module(id.clone()), id);
                }
                None => {
                    tracing::debug!("Using {} from {}", id, best.repository);
                    result.resolved_metadata(best.metadata.clone());
                }
            }
            return Ok(());
        }

        if !errors.is_empty() {
            result.failed(ResolveError::ModuleVersionResolve {
                selector: dependency.display_name(),
                causes: errors,
            });
            return Ok(());
        }

        result.failed(ResolveError::ModuleVersionNotFound {
            selector: dependency.display_name(),
            attempted: result.attempted_locations().iter().cloned().collect(),
            unmatched: result.unmatched_versions().iter().cloned().collect(),
            rejected: result.rejected_versions().iter().map(ToString::to_string).collect(),
        });
        Ok(())
    }

    fn rejections_for(&self, dependency: &DependencyMetadata) -> ResolveResult<Vec<Rejection>> {
        let mut rejections = Vec::new();
        for reject in &dependency.rejects {
            rejections.push(Rejection {
                selector: self.matcher().parse(reject)?,
                reason: format!("rejected by declaration {}", dependency.display_name()),
            });
        }
        for rule in &self.reject_rules {
            if rule.module == dependency.module {
                rejections.push(Rejection {
                    selector: rule.rejection.selector.clone(),
                    reason: rule.rejection.reason.clone(),
                });
            }
        }
        Ok(rejections)
    }

    // Newest accepted, non-rejected version in one repository.
    fn find_dynamic(
        &self,
        repository: &dyn ModuleRepository,
        dependency: &DependencyMetadata,
        selector: &VersionSelector,
        rejections: &[Rejection],
        attempted: &mut Vec<String>,
        result: &mut BuildableComponentIdResolveResult,
    ) -> ResolveResult<Option<Match>> {
        let Some(versions) = repository.list_versions(&dependency.module, attempted)? else {
            return Ok(None);
        };

        let mut unmatched = Vec::new();
        let mut rejected = Vec::new();
        let mut found = None;
        for version in self.strategy.sort(versions).into_iter().rev() {
            let id = dependency.module.with_version(version.clone());
            let mut metadata = None;
            if selector.needs_metadata() {
                metadata = repository.metadata(&id, attempted)?;
                let accepted = metadata
                    .as_ref()
                    .map_or(false, |m| selector.accept_metadata(m));
                if !accepted {
                    unmatched.push(version);
                    continue;
                }
            } else if !selector.accept(&version) {
                unmatched.push(version);
                continue;
            }

            if rejections.iter().any(|r| r.selector.needs_metadata()) && metadata.is_none() {
                metadata = repository.metadata(&id, attempted)?;
            }
            if let Some(reason) = rejection_reason(rejections, &version, metadata.as_ref()) {
                rejected.push(RejectedVersion::new(version, reason));
                continue;
            }

            if metadata.is_none() {
                metadata = repository.metadata(&id, attempted)?;
            }
            match metadata {
                Some(metadata) => {
                    found = Some(Match {
                        metadata,
                        repository: repository.name().to_string(),
                        rejected: None,
                    });
                    break;
                }
                None => unmatched.push(version),
            }
        }

        result.unmatched(unmatched);
        result.rejections(rejected);
        Ok(found)
    }
}

// The exact version from the first repository that publishes it.
fn find_static(
    repository: &dyn ModuleRepository,
    dependency: &DependencyMetadata,
    selector: &VersionSelector,
    rejections: &[Rejection],
    attempted: &mut Vec<String>,
) -> ResolveResult<Option<Match>> {
    let id = dependency.module.with_version(selector.as_str());
    let Some(metadata) = repository.metadata(&id, attempted)? else {
        return Ok(None);
    };
    let rejected = rejection_reason(rejections, &id.version, Some(&metadata));
    Ok(Some(Match {
        metadata,
        repository: repository.name().to_string(),
        rejected,
    }))
}

fn rejection_reason(
    rejections: &[Rejection],
    version: &str,
    metadata: Option<&ModuleVersionMetadata>,
) -> Option<String> {
    rejections
        .iter()
        .find(|r| match metadata {
            Some(metadata) => r.selector.accept_metadata(metadata),
            None => r.selector.accept(version),
        })
        .map(|r| r.reason.clone())
}
