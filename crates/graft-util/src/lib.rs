//! Shared utilities for Graft.
//!
//! This crate provides the cross-cutting concerns used by the other Graft
//! crates: the unified error type for the outer layers and Cargo-style
//! status lines on stderr.

pub mod errors;
pub mod status;
