//! Ancestor chains with a cycle guard, plus an explicit caller-owned cache.
//!
//! Chains are returned oldest → newest, ending at the direct parent and
//! excluding the version itself. A cycle in the stored relationships cannot
//! cause unbounded walking: the walk stops at the first repeated id.

use crate::{LineageNode, RelationshipGraph};
use lineage_core::VersionId;
use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Child → parent lookup built once from a map or a node list.
#[derive(Clone, Debug)]
pub struct ParentIndex {
    parents: HashMap<VersionId, VersionId>,
    fingerprint: u64,
}

impl Default for ParentIndex {
    fn default() -> Self {
        Self::from_parents(HashMap::new())
    }
}

impl ParentIndex {
    fn from_parents(parents: HashMap<VersionId, VersionId>) -> Self {
        let mut pairs: Vec<_> = parents.iter().collect();
        pairs.sort_unstable();
        let mut hasher = DefaultHasher::new();
        pairs.hash(&mut hasher);
        Self {
            parents,
            fingerprint: hasher.finish(),
        }
    }

    /// Builds the index from a relationship map.
    ///
    /// When a child is listed under several parents the first entry in key
    /// order wins, matching [`RelationshipGraph::parent_of`].
    pub fn from_relationships(relationships: &RelationshipGraph) -> Self {
        let mut parents = HashMap::new();
        for (parent, children) in relationships.entries() {
            for child in children {
                parents
                    .entry(child.clone())
                    .or_insert_with(|| parent.to_string());
            }
        }
        Self::from_parents(parents)
    }

    /// Builds the index from an ordered node list.
    ///
    /// A declared parent that is not itself in the list is ignored, so the
    /// node is treated as a root.
    pub fn from_nodes<N: LineageNode>(nodes: &[N]) -> Self {
        let known: HashSet<&str> = nodes.iter().map(|n| n.id()).collect();
        let parents = nodes
            .iter()
            .filter_map(|node| {
                let parent = node.parent_id()?;
                (known.contains(parent) && parent != node.id())
                    .then(|| (node.id().to_string(), parent.to_string()))
            })
            .collect();
        Self::from_parents(parents)
    }

    /// Direct parent of `id`.
    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Ancestors of `id`, oldest first, ending at the direct parent.
    pub fn ancestor_chain(&self, id: &str) -> Vec<VersionId> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);

        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if !visited.insert(parent) {
                log::warn!("cycle detected while walking ancestors of '{id}' at '{parent}'");
                break;
            }
            chain.push(parent.to_string());
            current = parent;
        }

        chain.reverse();
        chain
    }

    /// Hash of the child → parent pairs. Equal pairs give equal fingerprints.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Number of versions that have a parent.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns `true` if every known version is a root.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Ancestor chains keyed by `(project, version)`.
///
/// Owned by the caller; nothing is shared between unrelated callers. Each
/// project remembers the [`ParentIndex::fingerprint`] its chains were
/// computed from, and [`chain`](Self::chain) drops them when handed an index
/// with different relationships.
#[derive(Clone, Debug, Default)]
pub struct AncestryCache {
    chains: HashMap<(String, VersionId), Vec<VersionId>>,
    sources: HashMap<String, u64>,
}

impl AncestryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached chain, computing it from `index` on a miss.
    ///
    /// Cached chains of `project_id` built from another index are dropped first.
    pub fn chain(
        &mut self,
        project_id: &str,
        version_id: &str,
        index: &ParentIndex,
    ) -> &[VersionId] {
        let fingerprint = index.fingerprint();
        if self.sources.get(project_id) != Some(&fingerprint)
            && self.sources.insert(project_id.to_string(), fingerprint).is_some()
        {
            log::debug!("relationships of project '{project_id}' changed; dropping cached chains");
            self.chains.retain(|(project, _), _| project != project_id);
        }
        self.chains
            .entry((project_id.to_string(), version_id.to_string()))
            .or_insert_with(|| index.ancestor_chain(version_id))
    }

    /// Returns the chain cached from the last index seen for `project_id`.
    pub fn get(&self, project_id: &str, version_id: &str) -> Option<&[VersionId]> {
        self.chains
            .get(&(project_id.to_string(), version_id.to_string()))
            .map(Vec::as_slice)
    }

    /// Drops every chain cached for `project_id`.
    pub fn invalidate_project(&mut self, project_id: &str) {
        self.chains.retain(|(project, _), _| project != project_id);
        self.sources.remove(project_id);
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.chains.clear();
        self.sources.clear();
    }

    /// Number of cached chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
