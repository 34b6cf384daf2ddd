//! RelationshipBuilder for deriving a relationship map from a version list.
//!
//! The assembly layer knows each version's `parentId`; the store knows
//! parent → children lists. The builder bridges the two:
//!
//! 1. Phase 1 creates an (empty) entry for every distinct version id
//! 2. Phase 2 links every version under its declared parent
//!
//! Creating all entries first means a child listed before its parent still
//! links correctly. Parents that never appear in the list are tracked in
//! [`BuildStats::dangling_parents`] instead of being silently invented.

use crate::{LineageNode, RelationshipGraph};
use lineage_core::{Error, Result, VersionId};
use std::collections::HashSet;

// ============================================================================
// Builder configuration types
// ============================================================================

/// What to do with a declared parent missing from the version list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Treat the version as a root and record the reference.
    #[default]
    AsRoot,
    /// Fail the build on the first dangling parent.
    Fail,
}

/// A declared parent that is not in the version list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingParent {
    /// Version declaring the parent.
    pub version_id: VersionId,
    /// The missing parent.
    pub parent_id: VersionId,
}

/// Statistics from a build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Distinct versions recorded.
    pub versions: usize,
    /// Parent → child links created.
    pub links: usize,
    /// Versions left without a parent.
    pub roots: usize,
    /// Ids seen more than once; only the first occurrence is used.
    pub duplicate_ids: Vec<VersionId>,
    /// Parent references to versions outside the list.
    pub dangling_parents: Vec<DanglingParent>,
    /// Versions that declared themselves as parent.
    pub self_parents: Vec<VersionId>,
}

// ============================================================================
// RelationshipBuilder
// ============================================================================

/// Builder for relationship maps.
#[derive(Clone, Debug, Default)]
pub struct RelationshipBuilder {
    base: RelationshipGraph,
    dangling: DanglingPolicy,
}

impl RelationshipBuilder {
    /// Creates a builder starting from an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing map instead of an empty one.
    pub fn with_base(mut self, base: RelationshipGraph) -> Self {
        self.base = base;
        self
    }

    /// Sets the dangling-parent policy.
    pub fn with_dangling_policy(mut self, policy: DanglingPolicy) -> Self {
        self.dangling = policy;
        self
    }

    /// Builds the map from `nodes`, in list order.
    pub fn build<N: LineageNode>(self, nodes: &[N]) -> Result<(RelationshipGraph, BuildStats)> {
        let mut graph = self.base;
        let mut stats = BuildStats::default();

        // ================================================================
        // Phase 1: one entry per distinct version
        // ================================================================
        let mut seen: HashSet<&str> = HashSet::new();
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if !seen.insert(node.id()) {
                log::warn!("duplicate version id '{}' ignored", node.id());
                stats.duplicate_ids.push(node.id().to_string());
                continue;
            }
            graph.insert_version(node.id(), None);
            unique.push(node);
        }
        stats.versions = unique.len();

        // ================================================================
        // Phase 2: link under declared parents
        // ================================================================
        for node in unique {
            let Some(parent) = node.parent_id() else {
                stats.roots += 1;
                continue;
            };

            if parent == node.id() {
                log::warn!("version '{parent}' declares itself as parent; treating as root");
                stats.self_parents.push(parent.to_string());
                stats.roots += 1;
                continue;
            }

            if !seen.contains(parent) {
                if self.dangling == DanglingPolicy::Fail {
                    return Err(Error::not_found("parent version", parent));
                }
                log::warn!("version '{}' references missing parent '{parent}'", node.id());
                stats.dangling_parents.push(DanglingParent {
                    version_id: node.id().to_string(),
                    parent_id: parent.to_string(),
                });
                stats.roots += 1;
                continue;
            }

            if graph.insert_version(node.id(), Some(parent)) {
                stats.links += 1;
            }
        }

        log::debug!(
            "built relationships: {} version(s), {} link(s), {} root(s)",
            stats.versions,
            stats.links,
            stats.roots
        );
        Ok((graph, stats))
    }
}
