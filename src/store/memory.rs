//! In-memory store implementations, used by the CLI and the test suite.
//! Grounded on the teacher's `IndexMap`-backed in-memory schema registries
//! (`src/schema/mod.rs`'s `FederationSchema`) and its use of `petgraph` for
//! the query graph (`src/query_graph/mod.rs`).

use std::collections::VecDeque;

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use tokio::sync::RwLock;

use crate::edge::{Edge, EdgeKey};
use crate::error::StoreError;
use crate::link::Link;
use crate::predicate::{Direction, Predicate};
use crate::store::graph_store::{GraphStore, TraversalStep};
use crate::store::link_store::LinkStore;
use crate::store::term_store::{DeleteManyReport, InsertOutcome, Pagination, TermFilter, TermStore};
use crate::term::{CodeField, Term, TermHandle};

/// Term store backed by an `IndexMap` plus per-namespace secondary indices
/// on `_gid`/`_aid`/`_pid`, matching the "conflict-free lookup set per
/// field" invariant of §3.1.
#[derive(Default)]
pub struct MemoryTermStore {
    inner: RwLock<TermStoreInner>,
}

#[derive(Default)]
struct TermStoreInner {
    terms: IndexMap<TermHandle, Term>,
    /// (namespace, field, value) -> handle
    index: IndexMap<(Option<String>, CodeField, String), TermHandle>,
}

impl TermStoreInner {
    fn index_term(&mut self, term: &Term) {
        let namespace = term.code.nid.clone();
        for field in CodeField::DEFAULT_ORDER {
            for value in term.code.values_for(field) {
                self.index.insert((namespace.clone(), field, value.to_owned()), term.handle());
            }
        }
    }

    fn unindex_term(&mut self, term: &Term) {
        let namespace = term.code.nid.clone();
        for field in CodeField::DEFAULT_ORDER {
            for value in term.code.values_for(field) {
                self.index.remove(&(namespace.clone(), field, value.to_owned()));
            }
        }
    }

    fn collides(&self, term: &Term) -> bool {
        if self.terms.values().any(|t| t.code.gid == term.code.gid) {
            return true;
        }
        let namespace = term.code.nid.clone();
        for field in CodeField::DEFAULT_ORDER {
            for value in term.code.values_for(field) {
                if self.index.contains_key(&(namespace.clone(), field, value.to_owned())) {
                    return true;
                }
            }
        }
        false
    }
}

impl MemoryTermStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TermStore for MemoryTermStore {
    async fn exists(&self, key: &TermHandle) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.terms.contains_key(key))
    }

    async fn get(&self, key: &TermHandle) -> Result<Term, StoreError> {
        self.inner
            .read()
            .await
            .terms
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn get_many(&self, keys: &[TermHandle]) -> Result<Vec<Option<Term>>, StoreError> {
        let inner = self.inner.read().await;
        Ok(keys.iter().map(|k| inner.terms.get(k).cloned()).collect())
    }

    async fn lookup_by_field(&self, field: CodeField, value: &str) -> Result<Vec<Term>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .terms
            .values()
            .filter(|t| t.code.values_for(field).contains(&value))
            .cloned()
            .collect())
    }

    async fn insert(&self, term: Term) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let handle = term.handle();
        if inner.terms.contains_key(&handle) || inner.collides(&term) {
            return Err(StoreError::Duplicate(handle.to_string()));
        }
        inner.index_term(&term);
        inner.terms.insert(handle, term);
        Ok(())
    }

    async fn insert_many(&self, terms: Vec<Term>) -> Result<Vec<InsertOutcome>, StoreError> {
        let mut outcomes = Vec::with_capacity(terms.len());
        for term in terms {
            let handle = term.handle();
            let result = self.insert(term).await;
            outcomes.push(InsertOutcome {
                handle,
                result: result.map_err(|e| e.to_string()),
            });
        }
        Ok(outcomes)
    }

    async fn update(&self, key: &TermHandle, patch: serde_json::Value) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let existing = inner
            .terms
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let mut value = serde_json::to_value(&existing).map_err(|e| StoreError::Other(e.into()))?;
        merge_json(&mut value, &patch);
        let updated: Term = serde_json::from_value(value).map_err(|e| StoreError::Other(e.into()))?;
        inner.unindex_term(&existing);
        inner.index_term(&updated);
        inner.terms.insert(key.clone(), updated);
        Ok(())
    }

    async fn delete(&self, key: &TermHandle) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.terms.shift_remove(key) {
            Some(term) => {
                inner.unindex_term(&term);
                Ok(())
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn delete_many(&self, keys: &[TermHandle]) -> Result<DeleteManyReport, StoreError> {
        let mut report = DeleteManyReport::default();
        for key in keys {
            match self.delete(key).await {
                Ok(()) => report.deleted.push(key.clone()),
                Err(StoreError::NotFound(_)) => report.ignored.push(key.clone()),
                Err(other) => return Err(other),
            }
        }
        Ok(report)
    }

    async fn query(&self, filter: &TermFilter, pagination: Pagination) -> Result<Vec<Term>, StoreError> {
        let inner = self.inner.read().await;
        let matched: Vec<Term> = inner.terms.values().filter(|t| filter(t)).cloned().collect();
        let end = match pagination.limit {
            Some(limit) => (pagination.offset + limit).min(matched.len()),
            None => matched.len(),
        };
        let start = pagination.offset.min(matched.len());
        Ok(matched[start..end].to_vec())
    }
}

fn merge_json(target: &mut serde_json::Value, patch: &serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(target), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge_json(target.entry(key.clone()).or_insert(serde_json::Value::Null), value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Edge store backed by `petgraph::DiGraph` for the traversal primitive plus
/// an `IndexMap` side table from deterministic edge key to `NodeIndex`/edge
/// storage, the way the teacher's query graph layers typed lookups over a
/// bare `petgraph` graph.
#[derive(Default)]
pub struct MemoryGraphStore {
    inner: RwLock<GraphStoreInner>,
}

#[derive(Default)]
struct GraphStoreInner {
    graph: DiGraph<TermHandle, EdgeKey>,
    nodes: IndexMap<TermHandle, NodeIndex>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl GraphStoreInner {
    fn node_index(&mut self, handle: &TermHandle) -> NodeIndex {
        if let Some(idx) = self.nodes.get(handle) {
            return *idx;
        }
        let idx = self.graph.add_node(handle.clone());
        self.nodes.insert(handle.clone(), idx);
        idx
    }

    fn put_edge(&mut self, edge: Edge) {
        let key = edge.key();
        let from = self.node_index(&edge.from);
        let to = self.node_index(&edge.to);
        if !self.edges.contains_key(&key) {
            self.graph.add_edge(from, to, key.clone());
        }
        self.edges.insert(key, edge);
    }

    fn remove_edge_by_key(&mut self, key: &EdgeKey) {
        self.edges.shift_remove(key);
        if let Some(edge_idx) = self.graph.edge_indices().find(|&e| self.graph[e] == *key) {
            self.graph.remove_edge(edge_idx);
        }
    }
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn get_edge(&self, key: &EdgeKey) -> Result<Edge, StoreError> {
        self.inner
            .read()
            .await
            .edges
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn edge_exists(&self, src: &TermHandle, predicate: Predicate, dst: &TermHandle) -> Result<bool, StoreError> {
        let key = crate::edge::edge_key(src, predicate, dst);
        Ok(self.inner.read().await.edges.contains_key(&key))
    }

    async fn insert_edges(&self, edges: Vec<Edge>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for edge in edges {
            let key = edge.key();
            // Idempotent: conflict on the deterministic key resolves to the
            // existing edge (§4.3.1 step 4).
            if !inner.edges.contains_key(&key) {
                inner.put_edge(edge);
            }
        }
        Ok(())
    }

    async fn replace_edges(&self, edges: Vec<Edge>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for edge in edges {
            if edge.is_empty_path() {
                let key = edge.key();
                inner.remove_edge_by_key(&key);
            } else {
                inner.put_edge(edge);
            }
        }
        Ok(())
    }

    async fn delete_edges(&self, keys: &[EdgeKey]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for key in keys {
            inner.remove_edge_by_key(key);
        }
        Ok(())
    }

    async fn traverse(
        &self,
        from: &TermHandle,
        direction: Direction,
        min_depth: usize,
        max_depth: usize,
        predicate_set: &[Predicate],
        prune_predicate: &(dyn Fn(&Edge) -> bool + Send + Sync),
    ) -> Result<Vec<TraversalStep>, StoreError> {
        let inner = self.inner.read().await;
        let mut results = Vec::new();
        let mut queue: VecDeque<(TermHandle, Vec<TermHandle>)> = VecDeque::new();
        queue.push_back((from.clone(), vec![from.clone()]));
        let mut visited_paths: IndexSet<(TermHandle, usize)> = IndexSet::new();

        while let Some((current, path)) = queue.pop_front() {
            let depth = path.len() - 1;
            if depth >= max_depth {
                continue;
            }
            if !visited_paths.insert((current.clone(), depth)) {
                continue;
            }
            for edge in inner.edges.values() {
                // `ChildrenPointToParent`: edge.from is the child, edge.to is the
                // parent; walking outward from `current` means following edges
                // where `current` is the parent side (`edge.to`), landing on the
                // child (`edge.from`). `ParentPointsToChildren` is the mirror.
                let (pivot_matches, next) = match direction {
                    Direction::ChildrenPointToParent => (edge.to == current, edge.from.clone()),
                    Direction::ParentPointsToChildren => (edge.from == current, edge.to.clone()),
                };
                if !pivot_matches {
                    continue;
                }
                if !predicate_set.contains(&edge.predicate) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(next.clone());
                if next_path.len() - 1 >= min_depth {
                    results.push(TraversalStep {
                        vertex: next.clone(),
                        edge: edge.clone(),
                        path: next_path.clone(),
                    });
                }
                if !prune_predicate(edge) {
                    queue.push_back((next, next_path));
                }
            }
        }
        Ok(results)
    }
}

/// Link store backed by a flat `IndexMap` keyed by the same deterministic
/// triple hash edges use (§3.5, §4.3.4).
#[derive(Default)]
pub struct MemoryLinkStore {
    inner: RwLock<IndexMap<EdgeKey, Link>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn get_link(&self, key: &EdgeKey) -> Result<Link, StoreError> {
        self.inner
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put_link(&self, link: Link) -> Result<(), StoreError> {
        self.inner.write().await.insert(link.key(), link);
        Ok(())
    }

    async fn delete_link(&self, key: &EdgeKey) -> Result<(), StoreError> {
        match self.inner.write().await.shift_remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn links_from(&self, handle: &TermHandle, predicate: Predicate) -> Result<Vec<Link>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .filter(|l| &l.from == handle && l.predicate == predicate)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Code, Info};

    fn term(lid: &str, gid: &str) -> Term {
        Term {
            code: Code { lid: lid.into(), gid: gid.into(), ..Default::default() },
            info: Info { title: [("iso_639_3_eng".to_owned(), lid.to_owned())].into_iter().collect(), ..Default::default() },
            data: None,
            rule: None,
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryTermStore::new();
        store.insert(term("test", "test")).await.unwrap();
        let fetched = store.get(&TermHandle::from("test")).await.unwrap();
        assert_eq!(fetched.info.title.get("iso_639_3_eng").unwrap(), "test");
    }

    #[tokio::test]
    async fn insert_rejects_gid_collision() {
        let store = MemoryTermStore::new();
        store.insert(term("a", "shared")).await.unwrap();
        let err = store.insert(term("b", "shared")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn delete_many_reports_deleted_and_ignored() {
        let store = MemoryTermStore::new();
        store.insert(term("test-01", "test-01")).await.unwrap();
        let report = store
            .delete_many(&[TermHandle::from("test-01"), TermHandle::from("test-02"), TermHandle::from("UNKNOWN TERM")])
            .await
            .unwrap();
        assert_eq!(report.deleted, vec![TermHandle::from("test-01")]);
        assert_eq!(report.ignored.len(), 2);
    }
}
