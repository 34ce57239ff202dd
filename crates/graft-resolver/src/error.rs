use miette::Diagnostic;
use thiserror::Error;

/// Errors raised or recorded by the resolution engine.
///
/// Cloneable so a result that failed can hand out its failure more than once.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolveError {
    /// A selector the matching kind cannot interpret.
    #[error("Invalid version selector '{selector}': {reason}")]
    #[diagnostic(help("Use an exact version, a range like [1.0,2.0), a prefix like 1.2.+ or latest.<status>"))]
    InvalidSelector { selector: String, reason: String },

    /// A resolved-state accessor was used before a terminal state was reached.
    #[error("No result has been specified")]
    NotResolved,

    /// No repository had a version matching the selector.
    #[error("Could not find any version that matches {selector}{}", not_found_detail(.attempted, .unmatched, .rejected))]
    ModuleVersionNotFound {
        selector: String,
        attempted: Vec<String>,
        unmatched: Vec<String>,
        rejected: Vec<String>,
    },

    /// One or more repositories failed and none produced a match.
    #[error("Could not resolve {selector}: {}", .causes.join("; "))]
    ModuleVersionResolve { selector: String, causes: Vec<String> },

    /// A metadata source reported an error.
    #[error("Repository '{repository}' failed: {message}")]
    Repository { repository: String, message: String },

    /// Two different versions of one module under the `fail` conflict policy.
    #[error("Conflict on {module}: versions {first} and {second} were both requested")]
    #[diagnostic(help("Align the requested versions, or set conflict = \"latest\""))]
    VersionConflict {
        module: String,
        first: String,
        second: String,
    },

    /// Selections kept changing for the allowed number of rounds.
    #[error("Resolution did not settle after {rounds} rounds")]
    NoFixpoint { rounds: usize },

    /// The latest of an empty collection was requested.
    #[error("No versions to choose from")]
    NoVersions,
}

fn not_found_detail(attempted: &[String], unmatched: &[String], rejected: &[String]) -> String {
    let mut out = String::new();
    if !unmatched.is_empty() {
        out.push_str(&format!("\n  versions that do not match: {}", unmatched.join(", ")));
    }
    if !rejected.is_empty() {
        out.push_str(&format!("\n  versions rejected: {}", rejected.join(", ")));
    }
    if !attempted.is_empty() {
        out.push_str(&format!("\n  searched in: {}", attempted.join(", ")));
    }
    out
}

pub type ResolveResult<T> = Result<T, ResolveError>;
