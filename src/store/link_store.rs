//! Link Store: the flat, path-set-free collection backing §3.5 links
//! (`property-of`, `required-indicator`, `required-metadata`). Kept as its
//! own trait/collection rather than folded into `GraphStore`, matching
//! §6.4's separate `collectionLink` configuration key.

use async_trait::async_trait;

use crate::edge::EdgeKey;
use crate::error::StoreError;
use crate::link::Link;

#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn get_link(&self, key: &EdgeKey) -> Result<Link, StoreError>;
    async fn put_link(&self, link: Link) -> Result<(), StoreError>;
    async fn delete_link(&self, key: &EdgeKey) -> Result<(), StoreError>;

    /// All links with the given predicate whose `from` (or `to`, depending
    /// on how the caller models direction) matches `handle` — used by the
    /// dictionary resolver's `required_closure` breadth-first expansion.
    async fn links_from(&self, handle: &crate::term::TermHandle, predicate: crate::predicate::Predicate) -> Result<Vec<Link>, StoreError>;
}
