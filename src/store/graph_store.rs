//! Graph Store (component B, §4.2): edge store keyed by the deterministic
//! `(src, pred, dst)` key, plus the traversal primitive the graph engine and
//! the dictionary resolver build on.

use async_trait::async_trait;

use crate::edge::{Edge, EdgeKey};
use crate::error::StoreError;
use crate::predicate::{Direction, Predicate};
use crate::term::TermHandle;

/// Defaults to 10 per §4.2; callers needing a different bound pass it
/// explicitly rather than relying on a mutable global.
pub const DEFAULT_MAX_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct TraversalStep {
    pub vertex: TermHandle,
    pub edge: Edge,
    /// The path of vertices from the traversal origin to `vertex`,
    /// inclusive of both ends.
    pub path: Vec<TermHandle>,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn get_edge(&self, key: &EdgeKey) -> Result<Edge, StoreError>;
    async fn edge_exists(&self, src: &TermHandle, predicate: Predicate, dst: &TermHandle) -> Result<bool, StoreError>;

    async fn insert_edges(&self, edges: Vec<Edge>) -> Result<(), StoreError>;
    async fn replace_edges(&self, edges: Vec<Edge>) -> Result<(), StoreError>;
    async fn delete_edges(&self, keys: &[EdgeKey]) -> Result<(), StoreError>;

    /// Traverses outward (or inward, per `direction`) from `from`, following
    /// only edges whose predicate is in `predicate_set`, down to
    /// `max_depth`. `prune_predicate`, when it returns `true` for a given
    /// edge, halts further expansion past that edge but the edge itself is
    /// still emitted (§4.2).
    ///
    /// Eagerly materialized rather than a true async stream: every consumer
    /// in this crate (enumeration, prune, reachability) walks the whole
    /// result anyway, and depth is bounded, so nothing is gained from
    /// pulling in a streaming-combinator dependency the teacher doesn't use.
    async fn traverse(
        &self,
        from: &TermHandle,
        direction: Direction,
        min_depth: usize,
        max_depth: usize,
        predicate_set: &[Predicate],
        prune_predicate: &(dyn Fn(&Edge) -> bool + Send + Sync),
    ) -> Result<Vec<TraversalStep>, StoreError>;
}
