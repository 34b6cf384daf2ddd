//! Core relationship types for version lineage.
//!
//! A project's lineage is stored as a parent → ordered-children map. Every
//! version that exists owns an entry (possibly with no children); a version
//! that appears in some child list without its own entry is a dangling
//! reference and is reported by the diagnostics, never silently healed.

use lineage_core::VersionId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// LineageNode trait
// ============================================================================

/// Anything that carries a version id and an optional parent pointer.
///
/// The layout engine and the relationship builder consume ordered slices of
/// these; the slice order defines sibling and display order.
pub trait LineageNode {
    /// The version's id.
    fn id(&self) -> &str;

    /// The declared parent, or `None` for a root.
    fn parent_id(&self) -> Option<&str>;
}

/// Minimal `{id, parentId}` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionLink {
    /// Version id.
    pub id: VersionId,
    /// Parent version id, `None` for roots.
    #[serde(default)]
    pub parent_id: Option<VersionId>,
}

impl VersionLink {
    /// Creates a root link.
    pub fn root(id: impl Into<VersionId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
        }
    }

    /// Creates a link under `parent`.
    pub fn child(id: impl Into<VersionId>, parent: impl Into<VersionId>) -> Self {
        Self {
            id: id.into(),
            parent_id: Some(parent.into()),
        }
    }
}

impl LineageNode for VersionLink {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

// ============================================================================
// RelationshipGraph
// ============================================================================

/// Parent → ordered children map for one project.
///
/// Serializes as a plain JSON object `{ "<versionId>": ["<childId>", ...] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipGraph {
    children: BTreeMap<VersionId, Vec<VersionId>>,
}

/// What a single deletion changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deletion {
    /// The deleted version.
    pub version_id: VersionId,
    /// Its parent at the time of deletion, `None` if it was a root.
    pub parent: Option<VersionId>,
    /// Its direct children at the time of deletion.
    pub children: Vec<VersionId>,
    /// Children that were appended to the parent's child list.
    pub reparented: Vec<VersionId>,
    /// References to the deleted id removed from unrelated child lists.
    pub stray_references: usize,
}

impl RelationshipGraph {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of versions with an entry.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if no version has an entry.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if `id` owns an entry.
    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    /// Iterates over ids that own an entry, in key order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Iterates over `(id, children)` entries, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[VersionId])> {
        self.children
            .iter()
            .map(|(id, children)| (id.as_str(), children.as_slice()))
    }

    /// Direct children of `id`; empty if `id` has no entry.
    pub fn children(&self, id: &str) -> &[VersionId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of `id`: the first entry (in key order) whose child list
    /// contains it. `None` for roots and unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|(_, children)| children.iter().any(|c| c == id))
            .map(|(parent, _)| parent.as_str())
    }

    /// Sets the child list of `id` verbatim, creating the entry if needed.
    pub fn set_children(&mut self, id: impl Into<VersionId>, children: Vec<VersionId>) {
        self.children.insert(id.into(), children);
    }

    /// Records a new version and links it under `parent`.
    ///
    /// Creates the version's own (empty) entry if missing, creates the
    /// parent's entry if missing, and appends the id to the parent's list
    /// unless already present. Returns `true` if anything changed.
    pub fn insert_version(&mut self, id: &str, parent: Option<&str>) -> bool {
        let mut changed = false;
        if !self.children.contains_key(id) {
            self.children.insert(id.to_string(), Vec::new());
            changed = true;
        }
        if let Some(parent) = parent.filter(|p| *p != id) {
            let siblings = self.children.entry(parent.to_string()).or_default();
            if !siblings.iter().any(|c| c == id) {
                siblings.push(id.to_string());
                changed = true;
            }
        }
        changed
    }

    /// Deletes a version, re-parenting its children onto its parent.
    ///
    /// - With a parent: children not already listed under the parent are
    ///   appended to the parent's list, then the id is removed from it.
    /// - Without a parent: the children simply become roots.
    ///
    /// The version's own entry is dropped and any remaining reference to
    /// it anywhere in the map is stripped. Returns `None` (no change) if
    /// the version owns no entry.
    pub fn delete_version(&mut self, id: &str) -> Option<Deletion> {
        if !self.children.contains_key(id) {
            return None;
        }

        let parent = self.parent_of(id).map(str::to_string);
        let children = self.children(id).to_vec();
        let mut reparented = Vec::new();

        if let Some(parent_id) = parent.as_deref() {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                for child in &children {
                    if child != parent_id && !siblings.contains(child) {
                        siblings.push(child.clone());
                        reparented.push(child.clone());
                    }
                }
                siblings.retain(|c| c != id);
            }
        }

        self.children.remove(id);

        let mut stray_references = 0;
        for list in self.children.values_mut() {
            let before = list.len();
            list.retain(|c| c != id);
            stray_references += before - list.len();
        }

        Some(Deletion {
            version_id: id.to_string(),
            parent,
            children,
            reparented,
            stray_references,
        })
    }

    /// Drops entries for ids not in `valid` and filters every child list
    /// down to valid ids. Returns the number of removed entries plus
    /// removed child references.
    pub fn retain_valid(&mut self, valid: &HashSet<&str>) -> usize {
        let before = self.children.len();
        self.children.retain(|id, _| valid.contains(id.as_str()));
        let mut removed = before - self.children.len();

        for list in self.children.values_mut() {
            let len = list.len();
            list.retain(|c| valid.contains(c.as_str()));
            removed += len - list.len();
        }
        removed
    }
}

impl FromIterator<(VersionId, Vec<VersionId>)> for RelationshipGraph {
    fn from_iter<I: IntoIterator<Item = (VersionId, Vec<VersionId>)>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// ArchiveMap
// ============================================================================

/// Archive flags for one project. Absence means "not archived".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveMap {
    flags: BTreeMap<VersionId, bool>,
}

impl ArchiveMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is archived.
    pub fn is_archived(&self, id: &str) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    /// Sets the flag for `id`.
    pub fn set(&mut self, id: impl Into<VersionId>, archived: bool) {
        self.flags.insert(id.into(), archived);
    }

    /// Flips the flag for `id` and returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        let next = !self.is_archived(id);
        self.flags.insert(id.to_string(), next);
        next
    }

    /// Forgets the flag for `id`. Returns `true` if one was stored.
    pub fn remove(&mut self, id: &str) -> bool {
        self.flags.remove(id).is_some()
    }

    /// Ids currently archived, in key order.
    pub fn archived_ids(&self) -> Vec<VersionId> {
        self.flags
            .iter()
            .filter(|(_, archived)| **archived)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

// ============================================================================
// Persisted documents
// ============================================================================

/// Whole-document layout of the `version_relationships` key.
pub type RelationshipDocument = BTreeMap<String, RelationshipGraph>;

/// Whole-document layout of the `version_archives` key.
pub type ArchiveDocument = BTreeMap<String, ArchiveMap>;

// ============================================================================
// Tests
// ============================================================================
