//! Assembly layer: versions in, enriched metrics and render positions out.
//!
//! The caller hands over the ordered version list of one project. Parent
//! ids come either from the list itself or from a [`ParentIndex`] built by
//! the relationship store; ancestor chains are cached per project in an
//! [`AncestryCache`] owned by the [`Assembler`].

use lineage_core::VersionId;
use lineage_graph::{
    AncestryCache, ArchiveMap, Layout, LayoutConfig, LayoutMode, LineageNode, ParentIndex,
};
use lineage_metrics::{Metric, MetricKey, MetricLineageEngine, SortOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A version as assembled for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionNode {
    /// Version id.
    pub id: VersionId,
    /// Parent id, `None` for roots.
    #[serde(default)]
    pub parent_id: Option<VersionId>,
    /// Metrics, enriched or raw.
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl VersionNode {
    /// Creates a root version without metrics.
    pub fn root(id: impl Into<VersionId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Creates a child version without metrics.
    pub fn child(id: impl Into<VersionId>, parent: impl Into<VersionId>) -> Self {
        Self {
            id: id.into(),
            parent_id: Some(parent.into()),
            metrics: Vec::new(),
        }
    }

    /// Appends a metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }
}

impl LineageNode for VersionNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

// ============================================================================
// Assembler
// ============================================================================

/// Enriches version lists, caching ancestor chains between calls.
///
/// The cache is keyed by `(project, version)` and refreshes a project's
/// chains whenever the parent index passed in differs from the last one.
/// [`clear`](Self::clear) releases memory on project switch.
#[derive(Debug, Default)]
pub struct Assembler {
    engine: MetricLineageEngine,
    cache: AncestryCache,
}

impl Assembler {
    /// Creates an assembler with the built-in optimization rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom metric engine.
    pub fn with_engine(mut self, engine: MetricLineageEngine) -> Self {
        self.engine = engine;
        self
    }

    /// The metric engine.
    pub fn engine(&self) -> &MetricLineageEngine {
        &self.engine
    }

    /// Enriches `versions` using the parent ids they declare.
    pub fn enrich(&mut self, project_id: &str, versions: &[VersionNode]) -> Vec<VersionNode> {
        let index = ParentIndex::from_nodes(versions);
        self.enrich_with_index(project_id, versions, &index)
    }

    /// Enriches `versions` using an external parent index.
    ///
    /// Ancestors missing from `versions` contribute no metrics.
    pub fn enrich_with_index(
        &mut self,
        project_id: &str,
        versions: &[VersionNode],
        index: &ParentIndex,
    ) -> Vec<VersionNode> {
        let by_id: HashMap<&str, &VersionNode> =
            versions.iter().map(|v| (v.id.as_str(), v)).collect();
        log::debug!("enriching {} versions of project '{project_id}'", versions.len());

        versions
            .iter()
            .map(|version| {
                let chain = self.cache.chain(project_id, &version.id, index);
                let history: Vec<&[Metric]> = chain
                    .iter()
                    .filter_map(|id| by_id.get(id.as_str()))
                    .map(|v| v.metrics.as_slice())
                    .collect();
                let parent_metrics = chain
                    .last()
                    .and_then(|id| by_id.get(id.as_str()))
                    .map(|v| v.metrics.as_slice())
                    .unwrap_or(&[]);

                let metrics = self.engine.calculate_all_metric_differences(
                    &version.metrics,
                    parent_metrics,
                    &history,
                );
                VersionNode {
                    id: version.id.clone(),
                    parent_id: version.parent_id.clone(),
                    metrics,
                }
            })
            .collect()
    }

    /// Drops cached chains of `project_id`.
    pub fn invalidate_project(&mut self, project_id: &str) {
        self.cache.invalidate_project(project_id);
    }

    /// Drops every cached chain.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Sorts `versions` by a metric, resolving `BestFirst` with this engine's rules.
    pub fn sort_by_metric(&self, versions: &mut [VersionNode], key: &MetricKey, order: SortOrder) {
        let rules = self.engine.rules();
        lineage_metrics::sort_by_metric(versions, |v| v.metrics.as_slice(), key, order, rules);
    }
}

// ============================================================================
// One-shot helpers
// ============================================================================

/// Enriches `versions` without keeping a cache.
pub fn enrich_versions(versions: &[VersionNode]) -> Vec<VersionNode> {
    Assembler::new().enrich("", versions)
}

/// Sorts `versions` by the primary value of a metric; versions lacking it go last.
pub fn sort_versions_by_metric(versions: &mut [VersionNode], key: &MetricKey, order: SortOrder) {
    Assembler::new().sort_by_metric(versions, key, order);
}

/// Lays out `versions` in the given mode.
pub fn layout_versions(
    versions: &[VersionNode],
    config: &LayoutConfig,
    mode: LayoutMode,
) -> Layout {
    lineage_graph::compute_layout(versions, config, mode)
}

/// Versions not flagged in `archives`, in their original order.
pub fn visible_versions(versions: &[VersionNode], archives: &ArchiveMap) -> Vec<VersionNode> {
    versions
        .iter()
        .filter(|v| !archives.is_archived(&v.id))
        .cloned()
        .collect()
}
