//! Dependency resolution engine: version selectors, latest-version ordering,
//! a caching cycle-aware graph walker, and round-based conflict resolution.

pub mod conflict;
pub mod dynamic;
pub mod error;
pub mod graph;
pub mod latest;
pub mod matcher;
pub mod repository;
pub mod resolver;
pub mod result;
pub mod version;
pub mod walker;

pub use error::{ResolveError, ResolveResult};
pub use resolver::{ResolutionResult, Resolver};
