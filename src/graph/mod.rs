//! Graph Engine (component C, §4.3) — the hardest part. Set/update/delete/
//! prune operations over edges and the separate link collection, enforcing
//! the path-set and reachability invariants.

pub mod merge;

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::instrument;

use crate::edge::{edge_key, Edge, EdgeKey, PathData};
use crate::error::{DictionaryError, Result, StoreError};
use crate::link::Link;
use crate::predicate::{reachability_predicates, Direction, Predicate};
use crate::store::graph_store::GraphStore;
use crate::store::link_store::LinkStore;
use crate::store::term_store::TermStore;
use crate::term::TermHandle;

/// Which buckets the caller wants back (§4.3.1's `return_{inserted,updated,
/// existing}`, mirrored for delete's `deleted`/`ignored`). All default to
/// `true`: the common case wants the full report.
#[derive(Debug, Clone, Copy)]
pub struct ResponseFlags {
    pub inserted: bool,
    pub updated: bool,
    pub existing: bool,
    pub deleted: bool,
    pub ignored: bool,
}

impl Default for ResponseFlags {
    fn default() -> Self {
        Self { inserted: true, updated: true, existing: true, deleted: true, ignored: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetEdgesReport {
    pub inserted: Vec<TermHandle>,
    pub updated: Vec<TermHandle>,
    pub existing: Vec<TermHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteEdgesReport {
    pub deleted: Vec<TermHandle>,
    pub updated: Vec<TermHandle>,
    pub ignored: Vec<TermHandle>,
}

/// `child_data` for a given child: either an object patch or the top-level
/// reset sentinel (§4.3.1). `None` here is that sentinel, not "no entry" —
/// every child in `children` gets *some* treatment.
pub type ChildData = Option<PathData>;

pub struct SetEdgesRequest {
    pub root: TermHandle,
    pub parent: TermHandle,
    pub predicate: Predicate,
    pub direction: Direction,
    pub children: IndexMap<TermHandle, ChildData>,
    pub traversal_predicates: Vec<Predicate>,
    pub save: bool,
    pub response: ResponseFlags,
}

pub struct DeleteEdgesRequest {
    pub root: TermHandle,
    pub parent: TermHandle,
    pub predicate: Predicate,
    pub direction: Direction,
    pub children: Vec<TermHandle>,
    pub traversal_predicates: Vec<Predicate>,
    pub save: bool,
    pub prune: bool,
    pub response: ResponseFlags,
}

/// `GraphEngine` owns no state of its own beyond the two stores it
/// coordinates (§4.3.6: no shared mutable state beyond the request-scoped
/// caches the validator keeps separately).
pub struct GraphEngine<T: TermStore, G: GraphStore, L: LinkStore> {
    terms: Arc<T>,
    graph: Arc<G>,
    links: Arc<L>,
    retry_attempts: usize,
}

impl<T: TermStore, G: GraphStore, L: LinkStore> GraphEngine<T, G, L> {
    pub fn new(terms: Arc<T>, graph: Arc<G>, links: Arc<L>) -> Self {
        Self { terms, graph, links, retry_attempts: crate::config::RETRY_ATTEMPTS }
    }

    async fn require_exists(&self, handle: &TermHandle) -> Result<()> {
        if self.terms.exists(handle).await.map_err(DictionaryError::from)? {
            Ok(())
        } else {
            Err(DictionaryError::invalid_reference(handle.to_string()))
        }
    }

    /// The parent must be reachable from, or reach (per direction), `root`
    /// via edges whose predicate is in `{predicate} ∪ traversal_predicates ∪
    /// {section, bridge}` (§4.3.1 step 2, normalized per §9's note: the
    /// functional predicate is always folded into the tolerated set rather
    /// than treated as a separate query parameter).
    async fn check_reachable(
        &self,
        root: &TermHandle,
        parent: &TermHandle,
        predicate: Predicate,
        direction: Direction,
        traversal_predicates: &[Predicate],
    ) -> Result<()> {
        if root == parent {
            return Ok(());
        }
        let allowed = reachability_predicates(predicate, traversal_predicates);
        let steps = self
            .graph
            .traverse(root, direction, 1, crate::config::MAX_DEPTH, &allowed, &|_| false)
            .await
            .map_err(DictionaryError::from)?;
        if steps.iter().any(|step| &step.vertex == parent) {
            Ok(())
        } else {
            Err(DictionaryError::parent_not_in_graph(root, parent))
        }
    }

    fn edge_endpoints(&self, parent: &TermHandle, child: &TermHandle, direction: Direction) -> (TermHandle, TermHandle) {
        match direction {
            Direction::ChildrenPointToParent => (child.clone(), parent.clone()),
            Direction::ParentPointsToChildren => (parent.clone(), child.clone()),
        }
    }

    /// §4.3.1: set-edges.
    #[instrument(skip(self, request), fields(root = %request.root, parent = %request.parent))]
    pub async fn set_edges(&self, request: SetEdgesRequest) -> Result<SetEdgesReport> {
        self.require_exists(&request.root).await?;
        self.require_exists(&request.parent).await?;
        for child in request.children.keys() {
            self.require_exists(child).await?;
        }
        self.check_reachable(
            &request.root,
            &request.parent,
            request.predicate,
            request.direction,
            &request.traversal_predicates,
        )
        .await?;

        let mut report = SetEdgesReport::default();
        let mut to_insert = Vec::new();
        let mut to_replace = Vec::new();

        for (child, child_data) in &request.children {
            let (src, dst) = self.edge_endpoints(&request.parent, child, request.direction);
            let key = edge_key(&src, request.predicate, &dst);
            let existing = self.fetch_edge_with_retry(&key).await?;

            match existing {
                None => {
                    let mut data = PathData::new();
                    merge::merge_path_data(&mut data, child_data.as_ref());
                    let edge = Edge {
                        from: src,
                        to: dst,
                        predicate: request.predicate,
                        path: vec![request.root.clone()],
                        data,
                    };
                    to_insert.push(edge);
                    if request.response.inserted {
                        report.inserted.push(child.clone());
                    }
                }
                Some(mut edge) => {
                    let root_added = edge.add_root(&request.root);
                    let data_changed = merge::merge_path_data(&mut edge.data, child_data.as_ref());
                    if root_added || data_changed {
                        to_replace.push(edge);
                        if request.response.updated {
                            report.updated.push(child.clone());
                        }
                    } else if request.response.existing {
                        report.existing.push(child.clone());
                    }
                }
            }
        }

        if request.save {
            if !to_insert.is_empty() {
                self.graph.insert_edges(to_insert).await.map_err(DictionaryError::from)?;
            }
            if !to_replace.is_empty() {
                self.graph.replace_edges(to_replace).await.map_err(DictionaryError::from)?;
            }
        }

        Ok(report)
    }

    /// §4.3.2: delete-edges, with optional §4.3.2 step 4 prune.
    #[instrument(skip(self, request), fields(root = %request.root, parent = %request.parent))]
    pub async fn delete_edges(&self, request: DeleteEdgesRequest) -> Result<DeleteEdgesReport> {
        let mut report = DeleteEdgesReport::default();
        let mut to_delete = Vec::new();
        let mut to_replace = Vec::new();
        let mut pruned_children = Vec::new();

        for child in &request.children {
            let (src, dst) = self.edge_endpoints(&request.parent, child, request.direction);
            let key = edge_key(&src, request.predicate, &dst);
            let Some(mut edge) = self.fetch_edge_with_retry(&key).await? else {
                if request.response.ignored {
                    report.ignored.push(child.clone());
                }
                continue;
            };
            if !edge.contains_root(&request.root) {
                if request.response.ignored {
                    report.ignored.push(child.clone());
                }
                continue;
            }
            edge.remove_root(&request.root);
            if edge.is_empty_path() {
                to_delete.push(key);
                if request.response.deleted {
                    report.deleted.push(child.clone());
                }
                pruned_children.push(child.clone());
            } else {
                to_replace.push(edge);
                if request.response.updated {
                    report.updated.push(child.clone());
                }
            }
        }

        if request.save {
            if !to_delete.is_empty() {
                self.graph.delete_edges(&to_delete).await.map_err(DictionaryError::from)?;
            }
            if !to_replace.is_empty() {
                self.graph.replace_edges(to_replace).await.map_err(DictionaryError::from)?;
            }
        }

        if request.save && request.prune {
            for child in pruned_children {
                self.prune_from(&request.root, &child, request.predicate, request.direction, &request.traversal_predicates)
                    .await?;
            }
        }

        Ok(report)
    }

    /// §4.3.2 step 4: walk outward from `child`, further along the *same*
    /// direction as the triggering delete, with predicate set `{predicate}
    /// ∪ traversal_predicates`, pruning expansion at edges that no longer
    /// carry `root`. Every visited edge that still carries `root` has `root`
    /// removed and is then deleted or replaced exactly as in the main loop.
    ///
    /// `direction` describes how edges are laid out (e.g.
    /// `ChildrenPointToParent` means every edge in this tree points from
    /// child to parent), not which way to walk — continuing to descend from
    /// `child` towards its own children means following the *same* edge
    /// layout outward from `child`, not its mirror.
    async fn prune_from(
        &self,
        root: &TermHandle,
        child: &TermHandle,
        predicate: Predicate,
        direction: Direction,
        traversal_predicates: &[Predicate],
    ) -> Result<()> {
        let mut allowed = vec![predicate];
        for p in traversal_predicates {
            if !allowed.contains(p) {
                allowed.push(*p);
            }
        }

        let root_for_prune = root.clone();
        let steps = self
            .graph
            .traverse(
                child,
                direction,
                1,
                crate::config::MAX_DEPTH,
                &allowed,
                &move |edge| !edge.contains_root(&root_for_prune),
            )
            .await
            .map_err(DictionaryError::from)?;

        let mut seen: IndexSet<EdgeKey> = IndexSet::new();
        let mut to_delete = Vec::new();
        let mut to_replace = Vec::new();
        for step in &steps {
            let key = step.edge.key();
            if !seen.insert(key.clone()) {
                continue;
            }
            if !step.edge.contains_root(root) {
                continue;
            }
            let mut edge = step.edge.clone();
            edge.remove_root(root);
            if edge.is_empty_path() {
                to_delete.push(key);
            } else {
                to_replace.push(edge);
            }
        }
        if !to_delete.is_empty() {
            self.graph.delete_edges(&to_delete).await.map_err(DictionaryError::from)?;
        }
        if !to_replace.is_empty() {
            self.graph.replace_edges(to_replace).await.map_err(DictionaryError::from)?;
        }
        Ok(())
    }

    /// Reads an edge, tolerating `NotFound` as "absent" rather than an
    /// error, retrying the read on `Conflict` up to `retry_attempts` (§4.3.6,
    /// §9). Surfaces `WriteConflict` once the budget is exhausted.
    async fn fetch_edge_with_retry(&self, key: &EdgeKey) -> Result<Option<Edge>> {
        let mut attempts = 0;
        loop {
            match self.graph.get_edge(key).await {
                Ok(edge) => return Ok(Some(edge)),
                Err(StoreError::NotFound(_)) => return Ok(None),
                Err(StoreError::Conflict(_)) if attempts < self.retry_attempts => {
                    attempts += 1;
                    continue;
                }
                Err(StoreError::Conflict(_)) => {
                    return Err(DictionaryError::WriteConflict { handle: key.to_string() })
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// §4.3.4: the flat link variant. `existing`/`updated` is by data-blob
    /// comparison only, there being no path set to consult.
    #[instrument(skip(self, data))]
    pub async fn set_link(
        &self,
        from: &TermHandle,
        predicate: Predicate,
        to: &TermHandle,
        data: PathData,
        require_descriptors: bool,
        save: bool,
    ) -> Result<EdgeOutcome> {
        self.require_exists(from).await?;
        self.require_exists(to).await?;
        if require_descriptors {
            for handle in [from, to] {
                let term = self.terms.get(handle).await.map_err(DictionaryError::from)?;
                if !term.is_descriptor() {
                    return Err(DictionaryError::NotDescriptor { handle: handle.to_string() });
                }
            }
        }

        let key = edge_key(from, predicate, to);
        match self.fetch_link(&key).await? {
            None => {
                if save {
                    self.links
                        .put_link(Link { from: from.clone(), to: to.clone(), predicate, data })
                        .await
                        .map_err(DictionaryError::from)?;
                }
                Ok(EdgeOutcome::Inserted)
            }
            Some(existing) if existing.data == data => Ok(EdgeOutcome::Existing),
            Some(_) => {
                if save {
                    self.links
                        .put_link(Link { from: from.clone(), to: to.clone(), predicate, data })
                        .await
                        .map_err(DictionaryError::from)?;
                }
                Ok(EdgeOutcome::Updated)
            }
        }
    }

    pub async fn delete_link(&self, from: &TermHandle, predicate: Predicate, to: &TermHandle, save: bool) -> Result<DeleteOutcome> {
        let key = edge_key(from, predicate, to);
        if self.fetch_link(&key).await?.is_none() {
            return Ok(DeleteOutcome::Ignored);
        }
        if save {
            self.links.delete_link(&key).await.map_err(DictionaryError::from)?;
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn fetch_link(&self, key: &EdgeKey) -> Result<Option<Link>> {
        match self.links.get_link(key).await {
            Ok(link) => Ok(Some(link)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Inserted,
    Updated,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Ignored,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::*;
    use crate::store::memory::{MemoryGraphStore, MemoryLinkStore, MemoryTermStore};
    use crate::term::{Code, Info, Term};

    fn term(lid: &str) -> Term {
        Term {
            code: Code { lid: lid.into(), gid: lid.into(), ..Default::default() },
            info: Info::default(),
            data: None,
            rule: None,
        }
    }

    fn engine() -> GraphEngine<MemoryTermStore, MemoryGraphStore, MemoryLinkStore> {
        GraphEngine::new(Arc::new(MemoryTermStore::new()), Arc::new(MemoryGraphStore::new()), Arc::new(MemoryLinkStore::new()))
    }

    /// §8.1 invariant 5 / §4.3.2 step 4: deleting `root`'s only edge to `C`
    /// must prune the whole dangling branch below `C`, including edges two
    /// levels down that never touched `root` directly.
    #[tokio::test]
    async fn prune_removes_a_two_level_dangling_branch() {
        let graph = engine();
        for lid in ["R", "C", "GC"] {
            graph.terms.insert(term(lid)).await.unwrap();
        }
        let root = TermHandle::from("R");
        let mid = TermHandle::from("C");
        let leaf = TermHandle::from("GC");

        let mut children: IndexMap<TermHandle, ChildData> = IndexMap::new();
        children.insert(mid.clone(), None);
        graph
            .set_edges(SetEdgesRequest {
                root: root.clone(),
                parent: root.clone(),
                predicate: Predicate::EnumOf,
                direction: Direction::ChildrenPointToParent,
                children,
                traversal_predicates: vec![],
                save: true,
                response: ResponseFlags::default(),
            })
            .await
            .unwrap();

        let mut grandchildren: IndexMap<TermHandle, ChildData> = IndexMap::new();
        grandchildren.insert(leaf.clone(), None);
        graph
            .set_edges(SetEdgesRequest {
                root: root.clone(),
                parent: mid.clone(),
                predicate: Predicate::EnumOf,
                direction: Direction::ChildrenPointToParent,
                children: grandchildren,
                traversal_predicates: vec![],
                save: true,
                response: ResponseFlags::default(),
            })
            .await
            .unwrap();

        assert!(graph.graph.edge_exists(&mid, Predicate::EnumOf, &root).await.unwrap());
        assert!(graph.graph.edge_exists(&leaf, Predicate::EnumOf, &mid).await.unwrap());

        graph
            .delete_edges(DeleteEdgesRequest {
                root: root.clone(),
                parent: root.clone(),
                predicate: Predicate::EnumOf,
                direction: Direction::ChildrenPointToParent,
                children: vec![mid.clone()],
                traversal_predicates: vec![],
                save: true,
                prune: true,
                response: ResponseFlags::default(),
            })
            .await
            .unwrap();

        assert!(!graph.graph.edge_exists(&mid, Predicate::EnumOf, &root).await.unwrap());
        assert!(
            !graph.graph.edge_exists(&leaf, Predicate::EnumOf, &mid).await.unwrap(),
            "grandchild edge should have been pruned along with its parent's branch"
        );
    }
}
