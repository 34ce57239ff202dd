//! Core data types for the Graft dependency resolver.
//!
//! This crate defines module and component identifiers, dependency
//! declarations, module version metadata, the `Graft.toml` manifest, and the
//! resolution configuration.
//!
//! This crate is intentionally free of resolution logic.

pub mod config;
pub mod dependency;
pub mod manifest;
pub mod metadata;
