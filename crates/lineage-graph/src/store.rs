//! Persistent relationship and archive state for every project.
//!
//! Two independent whole-document JSON blobs live in the injected
//! [`KeyValueStore`]:
//!
//! - `version_relationships`: `{ projectId: { versionId: [childId, ...] } }`
//! - `version_archives`: `{ projectId: { versionId: bool } }`
//!
//! Every mutating operation loads the document, transforms one project's
//! map in memory and writes the whole document back. Malformed persisted
//! data never fails an operation: it is logged and read as an empty map.

use crate::diagnostics::{self, Diagnostics};
use crate::{
    ArchiveDocument, ArchiveMap, Deletion, ParentIndex, RelationshipDocument, RelationshipGraph,
};
use lineage_core::{Error, KeyValueStore, Result, VersionId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Key holding the relationship document.
pub const RELATIONSHIPS_KEY: &str = "version_relationships";

/// Key holding the archive document.
pub const ARCHIVES_KEY: &str = "version_archives";

/// Relationship store over an injected key-value backend.
///
/// Single writer at a time: read-modify-write sequences are not guarded
/// against interleaving.
#[derive(Debug)]
pub struct RelationshipStore<S> {
    kv: S,
}

impl<S: KeyValueStore> RelationshipStore<S> {
    /// Wraps a backend.
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Borrows the backend.
    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Returns the backend.
    pub fn into_inner(self) -> S {
        self.kv
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Relationship map of `project_id`; empty if absent or malformed.
    pub fn relationships(&self, project_id: &str) -> Result<RelationshipGraph> {
        self.load_project(RELATIONSHIPS_KEY, project_id)
    }

    /// Every project's relationship map, skipping malformed projects.
    pub fn relationship_document(&self) -> Result<RelationshipDocument> {
        self.load_all(RELATIONSHIPS_KEY)
    }

    /// Every project's archive map, skipping malformed projects.
    pub fn archive_document(&self) -> Result<ArchiveDocument> {
        self.load_all(ARCHIVES_KEY)
    }

    /// Ids of every project with persisted relationships.
    pub fn projects(&self) -> Result<Vec<String>> {
        Ok(self.relationship_document()?.into_keys().collect())
    }

    /// Parent of `version_id`, or `None` for roots and unknown ids.
    pub fn get_parent(&self, project_id: &str, version_id: &str) -> Result<Option<VersionId>> {
        Ok(self
            .relationships(project_id)?
            .parent_of(version_id)
            .map(str::to_string))
    }

    /// Direct children of `version_id`; empty if it has no entry.
    pub fn get_children(&self, project_id: &str, version_id: &str) -> Result<Vec<VersionId>> {
        Ok(self.relationships(project_id)?.children(version_id).to_vec())
    }

    /// Child → parent index of `project_id`, for repeated ancestor walks.
    pub fn parent_index(&self, project_id: &str) -> Result<ParentIndex> {
        Ok(ParentIndex::from_relationships(&self.relationships(project_id)?))
    }

    /// Ancestors of `version_id`, oldest first, ending at the direct parent.
    pub fn ancestor_chain(&self, project_id: &str, version_id: &str) -> Result<Vec<VersionId>> {
        Ok(self.parent_index(project_id)?.ancestor_chain(version_id))
    }

    /// Inspector report for `project_id`.
    pub fn diagnostics(&self, project_id: &str) -> Result<Diagnostics> {
        Ok(diagnostics::diagnose(&self.relationships(project_id)?))
    }

    // ========================================================================
    // Relationship mutations
    // ========================================================================

    /// Replaces the whole relationship map of `project_id`.
    pub fn replace_relationships(
        &mut self,
        project_id: &str,
        graph: &RelationshipGraph,
    ) -> Result<()> {
        self.save_project(RELATIONSHIPS_KEY, project_id, graph)
    }

    /// Records a new version under `parent` (or as a root).
    ///
    /// Idempotent: returns `false` and writes nothing if the version is
    /// already recorded under that parent.
    pub fn add_version(
        &mut self,
        project_id: &str,
        version_id: &str,
        parent: Option<&str>,
    ) -> Result<bool> {
        let mut graph = self.relationships(project_id)?;
        if !graph.insert_version(version_id, parent) {
            return Ok(false);
        }
        self.replace_relationships(project_id, &graph)?;
        log::debug!(
            "added version '{version_id}' to project '{project_id}' under {}",
            parent.unwrap_or("<root>")
        );
        Ok(true)
    }

    /// Deletes a version, re-parenting its children onto its parent.
    ///
    /// Also drops the version's archive flag. Returns `None` and logs a
    /// warning if the version has no entry.
    pub fn delete_version(
        &mut self,
        project_id: &str,
        version_id: &str,
    ) -> Result<Option<Deletion>> {
        let deletions = self.delete_versions(project_id, &[version_id])?;
        Ok(deletions.into_iter().next())
    }

    /// Deletes several versions in order.
    ///
    /// Each deletion re-resolves parent and children against the map as
    /// left by the previous one, so the end state is order-independent.
    /// Both documents are written at most once.
    pub fn delete_versions<I: AsRef<str>>(
        &mut self,
        project_id: &str,
        version_ids: &[I],
    ) -> Result<Vec<Deletion>> {
        let mut graph = self.relationships(project_id)?;
        let mut deletions = Vec::new();
        for id in version_ids {
            let id = id.as_ref();
            match graph.delete_version(id) {
                Some(deletion) => {
                    log::debug!(
                        "deleted '{id}' from project '{project_id}', reparented {} child(ren)",
                        deletion.reparented.len()
                    );
                    deletions.push(deletion);
                }
                None => {
                    log::warn!("version '{id}' has no relationship entry in project '{project_id}'")
                }
            }
        }

        if deletions.is_empty() {
            return Ok(deletions);
        }
        self.replace_relationships(project_id, &graph)?;

        let mut archives: ArchiveMap = self.load_project(ARCHIVES_KEY, project_id)?;
        let mut archive_changed = false;
        for deletion in &deletions {
            archive_changed |= archives.remove(&deletion.version_id);
        }
        if archive_changed {
            self.save_project(ARCHIVES_KEY, project_id, &archives)?;
        }

        Ok(deletions)
    }

    /// Removes entries for ids not in `valid_ids` and filters every child
    /// list down to valid ids. Returns the number of removed references.
    pub fn cleanup_orphans<I: AsRef<str>>(
        &mut self,
        project_id: &str,
        valid_ids: &[I],
    ) -> Result<usize> {
        let valid: HashSet<&str> = valid_ids.iter().map(|id| id.as_ref()).collect();
        let mut graph = self.relationships(project_id)?;
        let removed = graph.retain_valid(&valid);
        if removed > 0 {
            self.replace_relationships(project_id, &graph)?;
        }
        log::debug!("orphan cleanup in project '{project_id}' removed {removed} reference(s)");
        Ok(removed)
    }

    // ========================================================================
    // Archive flags
    // ========================================================================

    /// Archive map of `project_id`; empty if absent or malformed.
    pub fn archives(&self, project_id: &str) -> Result<ArchiveMap> {
        self.load_project(ARCHIVES_KEY, project_id)
    }

    /// Flips the archive flag and returns the new state.
    pub fn toggle_archive(&mut self, project_id: &str, version_id: &str) -> Result<bool> {
        let mut archives = self.archives(project_id)?;
        let archived = archives.toggle(version_id);
        self.save_project(ARCHIVES_KEY, project_id, &archives)?;
        log::debug!("version '{version_id}' in project '{project_id}' archived={archived}");
        Ok(archived)
    }

    /// Sets the archive flag explicitly.
    pub fn set_archived(
        &mut self,
        project_id: &str,
        version_id: &str,
        archived: bool,
    ) -> Result<()> {
        let mut archives = self.archives(project_id)?;
        if archives.is_archived(version_id) == archived {
            return Ok(());
        }
        archives.set(version_id, archived);
        self.save_project(ARCHIVES_KEY, project_id, &archives)?;
        log::debug!("version '{version_id}' in project '{project_id}' archived={archived}");
        Ok(())
    }

    /// Returns `true` if the version is archived.
    pub fn is_archived(&self, project_id: &str, version_id: &str) -> Result<bool> {
        Ok(self.archives(project_id)?.is_archived(version_id))
    }

    /// Archived version ids of `project_id`, sorted.
    pub fn get_archived_versions(&self, project_id: &str) -> Result<Vec<VersionId>> {
        Ok(self.archives(project_id)?.archived_ids())
    }

    // ========================================================================
    // Document plumbing
    // ========================================================================

    fn load_document(&self, key: &str) -> Result<Map<String, Value>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => {
                let kind = json_kind(&other);
                log::warn!("'{key}' holds a JSON {kind} instead of an object; reading as empty");
                Ok(Map::new())
            }
            Err(e) => {
                let err = Error::parse(format!("'{key}' is not valid JSON: {e}"));
                log::warn!("{err}; reading as empty");
                Ok(Map::new())
            }
        }
    }

    fn load_all<T: DeserializeOwned + Default>(&self, key: &str) -> Result<BTreeMap<String, T>> {
        Ok(self
            .load_document(key)?
            .into_iter()
            .map(|(project, value)| {
                let parsed = parse_project(key, &project, value);
                (project, parsed)
            })
            .collect())
    }

    fn load_project<T>(&self, key: &str, project_id: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let mut document = self.load_document(key)?;
        Ok(document
            .remove(project_id)
            .map(|value| parse_project(key, project_id, value))
            .unwrap_or_default())
    }

    fn save_project<T: Serialize>(&mut self, key: &str, project_id: &str, value: &T) -> Result<()> {
        let mut document = self.load_document(key)?;
        document.insert(project_id.to_string(), serde_json::to_value(value)?);
        let raw = serde_json::to_string(&document)?;
        self.kv.set(key, &raw)
    }
}

fn parse_project<T: DeserializeOwned + Default>(key: &str, project_id: &str, value: Value) -> T {
    try_parse_project(key, project_id, value).unwrap_or_else(|err| {
        log::warn!("{err}; reading as empty");
        T::default()
    })
}

fn try_parse_project<T: DeserializeOwned>(key: &str, project_id: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::parse(format!("'{key}' entry for project '{project_id}' is malformed: {e}"))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{Error, MemoryStore};
    use proptest::prelude::*;

    const P: &str = "project-1";

    /// v1 -> v2 -> {v3, v4}, v1 -> v5
    fn seeded() -> RelationshipStore<MemoryStore> {
        let mut store = RelationshipStore::new(MemoryStore::new());
        store.add_version(P, "v1", None).unwrap();
        store.add_version(P, "v2", Some("v1")).unwrap();
        store.add_version(P, "v3", Some("v2")).unwrap();
        store.add_version(P, "v4", Some("v2")).unwrap();
        store.add_version(P, "v5", Some("v1")).unwrap();
        store
    }

    // ------------------------------------------------------------------------
    // Read tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_parent_and_children() {
        let store = seeded();
        assert_eq!(store.get_parent(P, "v3").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.get_parent(P, "v1").unwrap(), None);
        assert_eq!(store.get_children(P, "v2").unwrap(), ["v3", "v4"]);
        assert!(store.get_children(P, "missing").unwrap().is_empty());
        assert!(store.get_children("other-project", "v2").unwrap().is_empty());
    }

    #[test]
    fn test_add_version_is_idempotent() {
        let mut store = seeded();
        assert!(!store.add_version(P, "v3", Some("v2")).unwrap());
        assert_eq!(store.get_children(P, "v2").unwrap(), ["v3", "v4"]);
        assert!(store.relationships(P).unwrap().contains("v3"));
    }

    #[test]
    fn test_ancestor_chain() {
        let store = seeded();
        assert_eq!(store.ancestor_chain(P, "v4").unwrap(), ["v1", "v2"]);
        assert!(store.ancestor_chain(P, "v1").unwrap().is_empty());
    }

    #[test]
    fn test_projects_are_independent() {
        let mut store = seeded();
        store.add_version("project-2", "a", None).unwrap();
        assert_eq!(store.projects().unwrap(), ["project-1", "project-2"]);
        assert_eq!(store.relationships(P).unwrap().len(), 5);
        assert_eq!(store.relationships("project-2").unwrap().len(), 1);
    }

    // ------------------------------------------------------------------------
    // Deletion tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_delete_non_root_reparents_children() {
        let mut store = seeded();
        let deletion = store.delete_version(P, "v2").unwrap().unwrap();

        assert_eq!(deletion.parent.as_deref(), Some("v1"));
        assert_eq!(store.get_parent(P, "v3").unwrap().as_deref(), Some("v1"));
        assert_eq!(store.get_parent(P, "v4").unwrap().as_deref(), Some("v1"));
        assert!(!store.get_children(P, "v1").unwrap().contains(&"v2".to_string()));
        assert!(!store.relationships(P).unwrap().contains("v2"));
    }

    #[test]
    fn test_delete_root_promotes_children() {
        let mut store = seeded();
        store.delete_version(P, "v1").unwrap().unwrap();

        assert_eq!(store.get_parent(P, "v2").unwrap(), None);
        assert_eq!(store.get_parent(P, "v5").unwrap(), None);
        assert!(store.diagnostics(P).unwrap().is_healthy());
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut store = seeded();
        let before = store.relationships(P).unwrap();
        assert!(store.delete_version(P, "nope").unwrap().is_none());
        assert_eq!(store.relationships(P).unwrap(), before);
    }

    #[test]
    fn test_delete_drops_archive_flag() {
        let mut store = seeded();
        store.set_archived(P, "v3", true).unwrap();
        store.delete_version(P, "v3").unwrap();
        assert!(!store.is_archived(P, "v3").unwrap());
        assert!(store.get_archived_versions(P).unwrap().is_empty());
        assert!(store.archive_document().unwrap()[P].archived_ids().is_empty());
    }

    #[test]
    fn test_delete_versions_order_independent() {
        let mut a = seeded();
        let mut b = seeded();
        a.delete_versions(P, &["v1", "v2"]).unwrap();
        b.delete_versions(P, &["v2", "v1"]).unwrap();

        assert_eq!(a.relationships(P).unwrap(), b.relationships(P).unwrap());
        assert_eq!(a.get_parent(P, "v3").unwrap(), None);
        assert_eq!(a.get_children(P, "v5").unwrap(), Vec::<String>::new());
    }

    // ------------------------------------------------------------------------
    // Archive tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_toggle_archive() {
        let mut store = seeded();
        assert!(store.toggle_archive(P, "v2").unwrap());
        assert!(store.is_archived(P, "v2").unwrap());
        assert_eq!(store.get_archived_versions(P).unwrap(), ["v2"]);

        assert!(!store.toggle_archive(P, "v2").unwrap());
        assert!(!store.is_archived(P, "v2").unwrap());
    }

    #[test]
    fn test_archiving_leaves_graph_untouched() {
        let mut store = seeded();
        let before = store.relationships(P).unwrap();
        store.toggle_archive(P, "v2").unwrap();
        assert_eq!(store.relationships(P).unwrap(), before);
    }

    // ------------------------------------------------------------------------
    // Cleanup and diagnostics tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_cleanup_orphans() {
        let mut store = seeded();
        let removed = store.cleanup_orphans(P, &["v1", "v2", "v3"]).unwrap();

        // entries v4, v5 plus references v2->v4, v1->v5
        assert_eq!(removed, 4);
        assert_eq!(store.get_children(P, "v1").unwrap(), ["v2"]);
        assert_eq!(store.get_children(P, "v2").unwrap(), ["v3"]);
        assert_eq!(store.cleanup_orphans(P, &["v1", "v2", "v3"]).unwrap(), 0);
    }

    #[test]
    fn test_diagnostics_reports_cycle_and_orphan() {
        let mut store = RelationshipStore::new(MemoryStore::new());
        let graph: RelationshipGraph = [
            ("A".to_string(), vec!["B".to_string()]),
            ("B".to_string(), vec!["A".to_string(), "ghost".to_string()]),
        ]
        .into_iter()
        .collect();
        store.replace_relationships(P, &graph).unwrap();

        let report = store.diagnostics(P).unwrap();
        assert_eq!(report.cycles, vec![vec!["A".to_string(), "B".to_string()]]);
        assert_eq!(report.orphans, ["ghost"]);
        assert!(!report.is_healthy());
    }

    // ------------------------------------------------------------------------
    // Persistence tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_persisted_layout() {
        let mut store = RelationshipStore::new(MemoryStore::new());
        store.add_version(P, "v1", None).unwrap();
        store.add_version(P, "v2", Some("v1")).unwrap();
        store.toggle_archive(P, "v2").unwrap();

        let kv = store.into_inner();
        let stored = |key: &str| -> Value {
            serde_json::from_str(&kv.get(key).unwrap().unwrap()).unwrap()
        };
        let relationships = stored(RELATIONSHIPS_KEY);
        let archives = stored(ARCHIVES_KEY);

        assert_eq!(relationships, serde_json::json!({ "project-1": { "v1": ["v2"], "v2": [] } }));
        assert_eq!(archives, serde_json::json!({ "project-1": { "v2": true } }));
    }

    #[test]
    fn test_malformed_document_reads_as_empty() {
        let kv = MemoryStore::new().with_entry(RELATIONSHIPS_KEY, "{not json");
        let mut store = RelationshipStore::new(kv);

        assert!(store.relationships(P).unwrap().is_empty());
        assert_eq!(store.get_parent(P, "v1").unwrap(), None);

        store.add_version(P, "v1", None).unwrap();
        assert!(store.relationships(P).unwrap().contains("v1"));
    }

    #[test]
    fn test_malformed_project_keeps_other_projects() {
        let kv = MemoryStore::new().with_entry(
            RELATIONSHIPS_KEY,
            r#"{"bad": {"v1": 42}, "good": {"v1": ["v2"], "v2": []}}"#,
        );
        let store = RelationshipStore::new(kv);

        assert!(store.relationships("bad").unwrap().is_empty());
        assert_eq!(store.relationship_document().unwrap().len(), 2);
        assert_eq!(store.get_children("good", "v1").unwrap(), ["v2"]);
    }

    #[test]
    fn test_malformed_project_is_a_parse_error() {
        let value = serde_json::json!({ "v1": 42 });
        let err =
            try_parse_project::<RelationshipGraph>(RELATIONSHIPS_KEY, "bad", value).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("project 'bad' is malformed"));
        assert!(!err.is_storage());
    }

    #[test]
    fn test_wrong_shape_reads_as_empty() {
        let kv = MemoryStore::new().with_entry(ARCHIVES_KEY, "[1, 2, 3]");
        let store = RelationshipStore::new(kv);
        assert!(!store.is_archived(P, "v1").unwrap());
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Err(Error::storage(key, "backend offline"))
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            Err(Error::storage(key, "backend offline"))
        }
    }

    #[test]
    fn test_storage_failures_propagate() {
        let mut store = RelationshipStore::new(FailingStore);
        assert!(store.get_parent(P, "v1").unwrap_err().is_storage());
        assert!(store.add_version(P, "v1", None).unwrap_err().is_storage());
    }

    // ------------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------------

    /// Acyclic, well-formed maps: version i hangs under some j < i.
    fn forest_strategy() -> impl Strategy<Value = RelationshipGraph> {
        let parents = prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 0..30);
        parents.prop_map(|parents| {
            let mut graph = RelationshipGraph::new();
            for (i, parent) in parents.into_iter().enumerate() {
                let parent = parent.filter(|_| i > 0).map(|idx| format!("v{}", idx.index(i)));
                graph.insert_version(&format!("v{i}"), parent.as_deref());
            }
            graph
        })
    }

    proptest! {
        #[test]
        fn prop_relationship_map_round_trips(graph in forest_strategy()) {
            let mut store = RelationshipStore::new(MemoryStore::new());
            store.replace_relationships(P, &graph).unwrap();
            prop_assert_eq!(store.relationships(P).unwrap(), graph);
        }

        #[test]
        fn prop_acyclic_maps_have_no_cycles(graph in forest_strategy()) {
            let mut store = RelationshipStore::new(MemoryStore::new());
            store.replace_relationships(P, &graph).unwrap();
            prop_assert!(store.diagnostics(P).unwrap().cycles.is_empty());
        }
    }
}
