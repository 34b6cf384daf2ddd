//! Read-only integrity checks over a relationship map.
//!
//! Provides:
//! - Root detection (entries never listed as anyone's child)
//! - Orphan detection (child ids without their own entry)
//! - Cycle detection (white/gray/black DFS, cycles canonicalized by rotation)
//! - Multi-parent detection (child ids listed under more than one parent)
//!
//! Nothing here mutates or heals the map: cycles are ambiguous to break and
//! orphans may be the only trace of lost data. `cleanup_orphans` on the
//! store is the explicit remedy.

use crate::RelationshipGraph;
use lineage_core::VersionId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// ============================================================================
// Result types
// ============================================================================

/// Inspector report for one project.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Entries never appearing as a child.
    pub roots: Vec<VersionId>,
    /// Ids listed as a child but missing their own entry.
    pub orphans: Vec<VersionId>,
    /// Distinct cycles, each rotated to its lexicographically smallest form.
    pub cycles: Vec<Vec<VersionId>>,
    /// Ids listed under more than one parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multi_parent: Vec<VersionId>,
}

impl Diagnostics {
    /// Returns `true` if no integrity problem was found.
    pub fn is_healthy(&self) -> bool {
        self.orphans.is_empty() && self.cycles.is_empty() && self.multi_parent.is_empty()
    }
}

// ============================================================================
// Petgraph view
// ============================================================================

/// Petgraph projection of a relationship map.
///
/// Node order follows key order, then first appearance in child lists;
/// edge indices follow child-list order so traversals stay deterministic.
struct IndexedGraph {
    graph: DiGraph<VersionId, ()>,
}

impl IndexedGraph {
    fn build(relationships: &RelationshipGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

        for id in relationships.ids() {
            indices.insert(id, graph.add_node(id.to_string()));
        }
        for (parent, children) in relationships.entries() {
            let from = indices[parent];
            for child in children {
                let to = *indices
                    .entry(child.as_str())
                    .or_insert_with(|| graph.add_node(child.clone()));
                graph.add_edge(from, to, ());
            }
        }

        Self { graph }
    }

    /// Successors in child-list order.
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.target()).collect()
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Entries that never appear in any child list, in key order.
pub fn find_roots(relationships: &RelationshipGraph) -> Vec<VersionId> {
    let listed: HashSet<&str> = relationships
        .entries()
        .flat_map(|(_, children)| children.iter().map(String::as_str))
        .collect();

    relationships
        .ids()
        .filter(|id| !listed.contains(id))
        .map(str::to_string)
        .collect()
}

/// Child ids that have no entry of their own, in first-seen order.
pub fn find_orphans(relationships: &RelationshipGraph) -> Vec<VersionId> {
    let mut seen = HashSet::new();
    let mut orphans = Vec::new();

    for (_, children) in relationships.entries() {
        for child in children {
            if !relationships.contains(child) && seen.insert(child.as_str()) {
                orphans.push(child.clone());
            }
        }
    }
    orphans
}

/// Ids listed under two or more distinct parents, sorted.
pub fn find_multi_parent(relationships: &RelationshipGraph) -> Vec<VersionId> {
    let mut parents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (parent, children) in relationships.entries() {
        for child in children {
            parents.entry(child.as_str()).or_default().insert(parent);
        }
    }

    parents
        .into_iter()
        .filter(|(_, ps)| ps.len() > 1)
        .map(|(child, _)| child.to_string())
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

/// Find every distinct cycle reachable in the map.
///
/// Iterative DFS with white/gray/black coloring. A back-edge into a gray
/// node closes a cycle, read off the current DFS stack. Cycles are rotated
/// to their lexicographically smallest rotation and de-duplicated, and come
/// back in discovery order.
pub fn find_cycles(relationships: &RelationshipGraph) -> Vec<Vec<VersionId>> {
    let indexed = IndexedGraph::build(relationships);
    let graph = &indexed.graph;

    if !petgraph::algo::is_cyclic_directed(graph) {
        return Vec::new();
    }

    let mut color = vec![Color::White; graph.node_count()];
    let mut seen: HashSet<Vec<VersionId>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in graph.node_indices() {
        if color[start.index()] != Color::White {
            continue;
        }

        color[start.index()] = Color::Gray;
        let mut stack = vec![Frame {
            node: start,
            successors: indexed.successors(start),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let next = frame.successors.get(frame.next).copied();
            frame.next += 1;

            let Some(succ) = next else {
                color[node.index()] = Color::Black;
                stack.pop();
                continue;
            };

            match color[succ.index()] {
                Color::White => {
                    color[succ.index()] = Color::Gray;
                    stack.push(Frame {
                        node: succ,
                        successors: indexed.successors(succ),
                        next: 0,
                    });
                }
                Color::Gray => {
                    if let Some(pos) = stack.iter().position(|f| f.node == succ) {
                        let cycle: Vec<VersionId> =
                            stack[pos..].iter().map(|f| graph[f.node].clone()).collect();
                        let canonical = canonical_rotation(&cycle);
                        if seen.insert(canonical.clone()) {
                            cycles.push(canonical);
                        }
                    }
                }
                Color::Black => {}
            }
        }
    }

    cycles
}

/// Rotate a cycle so the lexicographically smallest rotation comes first.
pub fn canonical_rotation(cycle: &[VersionId]) -> Vec<VersionId> {
    (0..cycle.len())
        .map(|k| {
            cycle[k..]
                .iter()
                .chain(&cycle[..k])
                .cloned()
                .collect::<Vec<_>>()
        })
        .min()
        .unwrap_or_default()
}

/// Run every check and assemble the inspector report.
pub fn diagnose(relationships: &RelationshipGraph) -> Diagnostics {
    let report = Diagnostics {
        roots: find_roots(relationships),
        orphans: find_orphans(relationships),
        cycles: find_cycles(relationships),
        multi_parent: find_multi_parent(relationships),
    };

    if !report.is_healthy() {
        log::warn!(
            "relationship integrity issues: {} orphan(s), {} cycle(s), {} multi-parent id(s)",
            report.orphans.len(),
            report.cycles.len(),
            report.multi_parent.len()
        );
    }
    report
}

// ============================================================================
// Tests
// ============================================================================
