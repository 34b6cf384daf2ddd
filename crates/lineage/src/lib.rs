//! Lineage version-lineage engine: umbrella crate.
//!
//! This crate re-exports all Lineage components for convenience and adds
//! the assembly layer that joins relationship data, metric enrichment and
//! layout for one project's version list.

pub mod assembly;

pub use lineage_core as core;
pub use lineage_graph as graph;
pub use lineage_metrics as metrics;

pub use assembly::{
    Assembler, VersionNode, enrich_versions, layout_versions, sort_versions_by_metric,
    visible_versions,
};
pub use lineage_core::{Error, JsonFileStore, KeyValueStore, MemoryStore, Result, VersionId};
pub use lineage_graph::{Layout, LayoutConfig, LayoutMode, Orientation, RelationshipStore};
pub use lineage_metrics::{Metric, MetricKey, MetricValue, SortOrder};
