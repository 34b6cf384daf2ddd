//! Lineage Core: shared errors and storage abstraction.
//!
//! This crate provides the foundational types used across all Lineage crates.
//! It has no internal Lineage dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`kv`]: The `KeyValueStore` trait and its in-memory and file backends

pub mod error;
pub mod kv;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};

/// Identifier of a version, unique within a project.
pub type VersionId = String;
