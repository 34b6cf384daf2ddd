//! Lineage Graph: version relationships, integrity checks and layout.
//!
//! This crate owns the parent → children relationship map of each project
//! and everything that reads it. It depends only on `lineage-core`
//! (dependency level 1).
//!
//! # Modules
//!
//! - [`types`]: `RelationshipGraph`, `ArchiveMap` and the `LineageNode` trait
//! - [`store`]: `RelationshipStore` over an injected `KeyValueStore`
//! - [`diagnostics`]: roots, orphans, cycles and multi-parent detection
//! - [`ancestry`]: cycle-guarded ancestor chains and `AncestryCache`
//! - [`builder`]: `RelationshipBuilder` from an assembled version list
//! - [`layout`]: tree and linear layouts with detail/miniature presets

pub mod ancestry;
pub mod builder;
pub mod diagnostics;
pub mod layout;
pub mod store;
pub mod types;

pub use ancestry::{AncestryCache, ParentIndex};
pub use builder::{BuildStats, DanglingParent, DanglingPolicy, RelationshipBuilder};
pub use diagnostics::{
    Diagnostics, diagnose, find_cycles, find_multi_parent, find_orphans, find_roots,
};
pub use layout::{
    Bounds, Layout, LayoutConfig, LayoutEdge, LayoutMode, Orientation, Position, compute_layout,
    linear_layout, tree_layout,
};
pub use store::{ARCHIVES_KEY, RELATIONSHIPS_KEY, RelationshipStore};
pub use types::{
    ArchiveDocument, ArchiveMap, Deletion, LineageNode, RelationshipDocument, RelationshipGraph,
    VersionLink,
};
