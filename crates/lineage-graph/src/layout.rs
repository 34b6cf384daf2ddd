//! Positioned layouts for rendering a version list.
//!
//! Two modes:
//!
//! - **Tree**: a two-pass centered subtree layout. Subtree widths are
//!   computed bottom-up in abstract units (a leaf is one unit, siblings are
//!   separated by one unit), then each node is placed top-down at the center
//!   of the interval its subtree occupies. Independent roots sit side by
//!   side, separated by `root_gap_units`, with the whole forest centered on
//!   `center_x`.
//! - **Linear**: nodes in the given (e.g. metric-sorted) order on a single
//!   line, with edges between consecutive nodes only.
//!
//! Both are pure: same input, same output. Callers recompute the whole
//! layout whenever the version list changes.

use crate::LineageNode;
use lineage_core::VersionId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Units between adjacent sibling subtrees.
const SIBLING_GAP_UNITS: f64 = 1.0;

/// Units occupied by a leaf.
const LEAF_WIDTH_UNITS: f64 = 1.0;

// ============================================================================
// Configuration
// ============================================================================

/// Spacing constants for a layout.
///
/// The algorithm has no other parameters; the detail and miniature views
/// differ only in these values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Pixels between depth rows.
    #[serde(default = "default_vertical_spacing")]
    pub vertical_spacing: f64,
    /// Pixels per horizontal unit.
    #[serde(default = "default_horizontal_spacing")]
    pub horizontal_spacing: f64,
    /// Pixel x the forest is centered on.
    #[serde(default = "default_center_x")]
    pub center_x: f64,
    /// Pixel y of depth 0.
    #[serde(default = "default_start_y")]
    pub start_y: f64,
    /// Units between independent roots.
    #[serde(default = "default_root_gap_units")]
    pub root_gap_units: f64,
}

fn default_vertical_spacing() -> f64 {
    200.0
}

fn default_horizontal_spacing() -> f64 {
    150.0
}

fn default_center_x() -> f64 {
    400.0
}

fn default_start_y() -> f64 {
    50.0
}

fn default_root_gap_units() -> f64 {
    2.0
}

impl LayoutConfig {
    /// Large spacing for the main lineage view.
    pub fn detail() -> Self {
        Self {
            vertical_spacing: default_vertical_spacing(),
            horizontal_spacing: default_horizontal_spacing(),
            center_x: default_center_x(),
            start_y: default_start_y(),
            root_gap_units: default_root_gap_units(),
        }
    }

    /// Compressed spacing for the overview minimap.
    pub fn miniature() -> Self {
        Self {
            vertical_spacing: 60.0,
            horizontal_spacing: 40.0,
            center_x: 150.0,
            start_y: 20.0,
            root_gap_units: default_root_gap_units(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::detail()
    }
}

/// Direction of a linear layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Top to bottom.
    #[default]
    Vertical,
    /// Left to right, centered on `center_x`.
    Horizontal,
}

/// Which layout to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Lineage tree.
    Tree,
    /// Single sequence in input order.
    Linear(Orientation),
}

// ============================================================================
// Output
// ============================================================================

/// Pixel position of a node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

/// A drawn connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEdge {
    /// Upstream node.
    pub source: VersionId,
    /// Downstream node.
    pub target: VersionId,
}

/// Axis-aligned extent of all positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

/// Layout result handed to the renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Position of every laid-out node.
    pub positions: BTreeMap<VersionId, Position>,
    /// Edges to draw.
    pub edges: Vec<LayoutEdge>,
}

impl Layout {
    /// Position of `id`, if it was laid out.
    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Extent of all positions, or `None` for an empty layout.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut iter = self.positions.values();
        let first = iter.next()?;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(iter.fold(init, |b, p| Bounds {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }
}

// ============================================================================
// Layout entry points
// ============================================================================

/// Compute a layout in the requested mode.
pub fn compute_layout<N: LineageNode>(
    nodes: &[N],
    config: &LayoutConfig,
    mode: LayoutMode,
) -> Layout {
    match mode {
        LayoutMode::Tree => tree_layout(nodes, config),
        LayoutMode::Linear(orientation) => linear_layout(nodes, config, orientation),
    }
}

/// Lay out the lineage forest described by `nodes`.
///
/// Input order defines sibling order and root order. A node whose declared
/// parent is not in `nodes` is a root. Nodes caught in a parent cycle are
/// broken open at the first such node in input order, which becomes a root.
/// Duplicate ids after the first occurrence are ignored.
pub fn tree_layout<N: LineageNode>(nodes: &[N], config: &LayoutConfig) -> Layout {
    let forest = Forest::build(nodes);
    let n = forest.ids.len();
    if n == 0 {
        return Layout::default();
    }

    // Pass 1: subtree widths, bottom-up (reverse preorder).
    let mut width = vec![LEAF_WIDTH_UNITS; n];
    for &node in forest.preorder.iter().rev() {
        let kids = &forest.tree_children[node];
        if !kids.is_empty() {
            let gaps = (kids.len() - 1) as f64 * SIBLING_GAP_UNITS;
            width[node] = kids.iter().map(|&c| width[c]).sum::<f64>() + gaps;
        }
    }

    // Pass 2: left edge of each subtree interval, top-down (preorder).
    let roots_width: f64 = forest.roots.iter().map(|&r| width[r]).sum::<f64>()
        + forest.roots.len().saturating_sub(1) as f64 * config.root_gap_units;

    let mut left = vec![0.0; n];
    let mut cursor = -roots_width / 2.0;
    for &root in &forest.roots {
        left[root] = cursor;
        cursor += width[root] + config.root_gap_units;
    }
    for &node in &forest.preorder {
        let mut child_left = left[node];
        for &c in &forest.tree_children[node] {
            left[c] = child_left;
            child_left += width[c] + SIBLING_GAP_UNITS;
        }
    }

    let positions = (0..n)
        .map(|i| {
            let unit_x = left[i] + width[i] / 2.0;
            let position = Position {
                x: config.center_x + unit_x * config.horizontal_spacing,
                y: config.start_y + forest.depth[i] as f64 * config.vertical_spacing,
            };
            (forest.ids[i].to_string(), position)
        })
        .collect();

    let edges = (0..n)
        .filter_map(|i| {
            forest.tree_parent[i].map(|p| LayoutEdge {
                source: forest.ids[p].to_string(),
                target: forest.ids[i].to_string(),
            })
        })
        .collect();

    Layout { positions, edges }
}

/// Lay out `nodes` on one line in the given order.
///
/// Edges join consecutive nodes; parent pointers are ignored.
pub fn linear_layout<N: LineageNode>(
    nodes: &[N],
    config: &LayoutConfig,
    orientation: Orientation,
) -> Layout {
    let mut seen = std::collections::HashSet::new();
    let ids: Vec<&str> = nodes
        .iter()
        .map(|n| n.id())
        .filter(|id| seen.insert(*id))
        .collect();

    let offset = ids.len().saturating_sub(1) as f64 / 2.0;
    let positions = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let position = match orientation {
                Orientation::Vertical => Position {
                    x: config.center_x,
                    y: config.start_y + i as f64 * config.vertical_spacing,
                },
                Orientation::Horizontal => Position {
                    x: config.center_x + (i as f64 - offset) * config.horizontal_spacing,
                    y: config.start_y,
                },
            };
            (id.to_string(), position)
        })
        .collect();

    let edges = ids
        .windows(2)
        .map(|pair| LayoutEdge {
            source: pair[0].to_string(),
            target: pair[1].to_string(),
        })
        .collect();

    Layout { positions, edges }
}

// ============================================================================
// Forest construction
// ============================================================================

/// Index-based spanning forest over the input nodes.
struct Forest<'a> {
    ids: Vec<&'a str>,
    roots: Vec<usize>,
    preorder: Vec<usize>,
    depth: Vec<usize>,
    tree_parent: Vec<Option<usize>>,
    tree_children: Vec<Vec<usize>>,
}

impl<'a> Forest<'a> {
    fn build<N: LineageNode>(nodes: &'a [N]) -> Self {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut ids = Vec::new();
        let mut declared = Vec::new();
        for node in nodes {
            if index.contains_key(node.id()) {
                log::warn!("duplicate version id '{}' in layout input; ignoring", node.id());
                continue;
            }
            index.insert(node.id(), ids.len());
            ids.push(node.id());
            declared.push(node.parent_id());
        }

        let n = ids.len();
        let parent: Vec<Option<usize>> = declared
            .iter()
            .enumerate()
            .map(|(i, p)| p.and_then(|p| index.get(p).copied()).filter(|&pi| pi != i))
            .collect();

        let mut children = vec![Vec::new(); n];
        for (i, p) in parent.iter().enumerate() {
            if let Some(p) = *p {
                children[p].push(i);
            }
        }

        let mut forest = Forest {
            ids,
            roots: Vec::new(),
            preorder: Vec::with_capacity(n),
            depth: vec![0; n],
            tree_parent: vec![None; n],
            tree_children: vec![Vec::new(); n],
        };
        let mut visited = vec![false; n];

        for i in 0..n {
            if parent[i].is_none() {
                forest.walk(i, &children, &mut visited);
            }
        }
        for i in 0..n {
            if !visited[i] {
                log::warn!(
                    "version '{}' is part of a parent cycle; laying it out as a root",
                    forest.ids[i]
                );
                forest.walk(i, &children, &mut visited);
            }
        }

        forest
    }

    /// Iterative preorder walk from `root`, claiming unvisited descendants.
    fn walk(&mut self, root: usize, children: &[Vec<usize>], visited: &mut [bool]) {
        visited[root] = true;
        self.roots.push(root);
        self.depth[root] = 0;

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            self.preorder.push(node);

            let kids: Vec<usize> = children[node]
                .iter()
                .copied()
                .filter(|&c| !visited[c])
                .collect();
            for &c in &kids {
                visited[c] = true;
                self.depth[c] = self.depth[node] + 1;
                self.tree_parent[c] = Some(node);
            }
            stack.extend(kids.iter().rev());
            self.tree_children[node] = kids;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionLink;
    use proptest::prelude::*;

    fn unit_config() -> LayoutConfig {
        LayoutConfig {
            vertical_spacing: 100.0,
            horizontal_spacing: 100.0,
            center_x: 0.0,
            start_y: 0.0,
            root_gap_units: 2.0,
        }
    }

    fn x(layout: &Layout, id: &str) -> f64 {
        layout.position(id).unwrap().x
    }

    fn y(layout: &Layout, id: &str) -> f64 {
        layout.position(id).unwrap().y
    }

    // ------------------------------------------------------------------------
    // Tree layout tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_parent_centered_over_two_leaves() {
        let nodes = vec![
            VersionLink::root("v1"),
            VersionLink::child("v2", "v1"),
            VersionLink::child("v3", "v1"),
        ];
        let layout = tree_layout(&nodes, &unit_config());

        assert_eq!(x(&layout, "v3") - x(&layout, "v2"), 200.0);
        assert_eq!(x(&layout, "v1"), (x(&layout, "v2") + x(&layout, "v3")) / 2.0);
        assert_eq!(y(&layout, "v1"), 0.0);
        assert_eq!(y(&layout, "v2"), 100.0);
    }

    #[test]
    fn test_single_root_sits_on_center_x() {
        let nodes = vec![VersionLink::root("only")];
        let config = LayoutConfig::detail();
        let layout = tree_layout(&nodes, &config);

        assert_eq!(
            layout.position("only"),
            Some(Position {
                x: config.center_x,
                y: config.start_y
            })
        );
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn test_edges_are_parent_to_child_only() {
        let nodes = vec![
            VersionLink::root("v1"),
            VersionLink::child("v2", "v1"),
            VersionLink::child("v3", "v1"),
            VersionLink::child("v4", "v2"),
        ];
        let layout = tree_layout(&nodes, &unit_config());

        assert_eq!(layout.edges.len(), 3);
        assert!(layout.edges.contains(&LayoutEdge {
            source: "v2".into(),
            target: "v4".into()
        }));
        assert!(!layout.edges.iter().any(|e| e.source == "v2" && e.target == "v3"));
    }

    #[test]
    fn test_asymmetric_subtrees_do_not_overlap() {
        // v2 has three leaves, v3 is a leaf.
        let nodes = vec![
            VersionLink::root("v1"),
            VersionLink::child("v2", "v1"),
            VersionLink::child("v3", "v1"),
            VersionLink::child("a", "v2"),
            VersionLink::child("b", "v2"),
            VersionLink::child("c", "v2"),
        ];
        let layout = tree_layout(&nodes, &unit_config());

        // widths: v2 = 5, v3 = 1, v1 = 7 -> v1 interval [-3.5, 3.5]
        assert_eq!(x(&layout, "v1"), 0.0);
        assert_eq!(x(&layout, "v2"), -100.0);
        assert_eq!(x(&layout, "v3"), 300.0);
        assert_eq!(x(&layout, "a"), -300.0);
        assert_eq!(x(&layout, "b"), -100.0);
        assert_eq!(x(&layout, "c"), 100.0);
        assert!(x(&layout, "c") < x(&layout, "v3"));
    }

    #[test]
    fn test_forest_centered_with_root_gap() {
        let nodes = vec![VersionLink::root("r1"), VersionLink::root("r2")];
        let layout = tree_layout(&nodes, &unit_config());

        // total = 1 + 2 + 1 = 4 units -> centers at -1.5 and 1.5
        assert_eq!(x(&layout, "r1"), -150.0);
        assert_eq!(x(&layout, "r2"), 150.0);
    }

    #[test]
    fn test_missing_parent_is_root() {
        let nodes = vec![VersionLink::child("v2", "deleted"), VersionLink::child("v3", "v2")];
        let layout = tree_layout(&nodes, &unit_config());

        assert_eq!(y(&layout, "v2"), 0.0);
        assert_eq!(y(&layout, "v3"), 100.0);
        assert_eq!(layout.edges.len(), 1);
    }

    #[test]
    fn test_parent_cycle_is_broken_open() {
        let nodes = vec![VersionLink::child("a", "b"), VersionLink::child("b", "a")];
        let layout = tree_layout(&nodes, &unit_config());

        assert_eq!(layout.positions.len(), 2);
        assert_eq!(y(&layout, "a"), 0.0);
        assert_eq!(y(&layout, "b"), 100.0);
        assert_eq!(
            layout.edges,
            vec![LayoutEdge {
                source: "a".into(),
                target: "b".into()
            }]
        );
    }

    #[test]
    fn test_duplicate_ids_ignored() {
        let nodes = vec![VersionLink::root("v1"), VersionLink::child("v1", "x")];
        let layout = tree_layout(&nodes, &unit_config());
        assert_eq!(layout.positions.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let nodes: Vec<VersionLink> = Vec::new();
        assert_eq!(tree_layout(&nodes, &unit_config()), Layout::default());
        assert!(tree_layout(&nodes, &unit_config()).bounds().is_none());
    }

    #[test]
    fn test_presets_share_algorithm() {
        let nodes = vec![
            VersionLink::root("v1"),
            VersionLink::child("v2", "v1"),
            VersionLink::child("v3", "v1"),
        ];
        let detail = tree_layout(&nodes, &LayoutConfig::detail());
        let mini = tree_layout(&nodes, &LayoutConfig::miniature());

        let spread =
            |l: &Layout, cfg: &LayoutConfig| (x(l, "v3") - x(l, "v2")) / cfg.horizontal_spacing;
        assert_eq!(
            spread(&detail, &LayoutConfig::detail()),
            spread(&mini, &LayoutConfig::miniature())
        );
        assert_eq!(detail.edges, mini.edges);
    }

    #[test]
    fn test_bounds() {
        let nodes = vec![
            VersionLink::root("v1"),
            VersionLink::child("v2", "v1"),
            VersionLink::child("v3", "v1"),
        ];
        let bounds = tree_layout(&nodes, &unit_config()).bounds().unwrap();
        assert_eq!(bounds.min_x, -100.0);
        assert_eq!(bounds.max_x, 100.0);
        assert_eq!(bounds.min_y, 0.0);
        assert_eq!(bounds.max_y, 100.0);
    }

    // ------------------------------------------------------------------------
    // Linear layout tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_linear_vertical() {
        let nodes = vec![
            VersionLink::root("v3"),
            VersionLink::child("v1", "v3"),
            VersionLink::root("v2"),
        ];
        let layout = linear_layout(&nodes, &unit_config(), Orientation::Vertical);

        assert_eq!(y(&layout, "v3"), 0.0);
        assert_eq!(y(&layout, "v1"), 100.0);
        assert_eq!(y(&layout, "v2"), 200.0);
        assert_eq!(
            layout.edges,
            vec![
                LayoutEdge {
                    source: "v3".into(),
                    target: "v1".into()
                },
                LayoutEdge {
                    source: "v1".into(),
                    target: "v2".into()
                },
            ]
        );
    }

    #[test]
    fn test_linear_horizontal_centered() {
        let nodes = vec![VersionLink::root("a"), VersionLink::root("b"), VersionLink::root("c")];
        let mode = LayoutMode::Linear(Orientation::Horizontal);
        let layout = compute_layout(&nodes, &unit_config(), mode);

        assert_eq!(x(&layout, "a"), -100.0);
        assert_eq!(x(&layout, "b"), 0.0);
        assert_eq!(x(&layout, "c"), 100.0);
        assert_eq!(y(&layout, "b"), 0.0);
    }

    #[test]
    fn test_layout_config_toml_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"horizontal_spacing": 10.0}"#).unwrap();
        assert_eq!(config.horizontal_spacing, 10.0);
        assert_eq!(config.vertical_spacing, LayoutConfig::detail().vertical_spacing);
    }

    // ------------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------------

    /// Random forests: node i picks a parent among 0..i or none.
    fn forest_strategy() -> impl Strategy<Value = Vec<VersionLink>> {
        prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..40).prop_map(
            |parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, parent)| match parent {
                        Some(idx) if i > 0 => {
                            VersionLink::child(format!("v{i}"), format!("v{}", idx.index(i)))
                        }
                        _ => VersionLink::root(format!("v{i}")),
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_every_node_positioned(nodes in forest_strategy()) {
            let layout = tree_layout(&nodes, &unit_config());
            prop_assert_eq!(layout.positions.len(), nodes.len());
            prop_assert_eq!(
                layout.edges.len(),
                nodes.iter().filter(|n| n.parent_id.is_some()).count()
            );
        }

        #[test]
        fn prop_rows_do_not_overlap(nodes in forest_strategy()) {
            let layout = tree_layout(&nodes, &unit_config());
            let mut rows: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
            for p in layout.positions.values() {
                rows.entry(p.y as i64).or_default().push(p.x);
            }
            for xs in rows.values_mut() {
                xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
                for pair in xs.windows(2) {
                    prop_assert!(pair[1] - pair[0] >= 100.0 - 1e-9);
                }
            }
        }

        #[test]
        fn prop_parent_within_children_span(nodes in forest_strategy()) {
            let layout = tree_layout(&nodes, &unit_config());
            for node in &nodes {
                let children: Vec<&VersionLink> = nodes
                    .iter()
                    .filter(|c| c.parent_id.as_deref() == Some(node.id.as_str()))
                    .collect();
                let Some(first) = children.first() else {
                    continue;
                };
                let kids: Vec<f64> = children.iter().map(|c| x(&layout, &c.id)).collect();
                let lo = kids.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = kids.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let px = x(&layout, &node.id);
                prop_assert!(px >= lo - 1e-9 && px <= hi + 1e-9);
                prop_assert!(y(&layout, &node.id) < y(&layout, &first.id));
            }
        }

        #[test]
        fn prop_layout_is_deterministic(nodes in forest_strategy()) {
            let config = unit_config();
            prop_assert_eq!(tree_layout(&nodes, &config), tree_layout(&nodes, &config));
        }
    }
}
