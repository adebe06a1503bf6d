//! Term Store (component A, §4.1): document store of terms keyed by local
//! identifier, with a secondary index on the four code fields.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::term::{CodeField, Term, TermHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination {
    pub offset: usize,
    pub limit: Option<usize>,
}

/// A filter predicate over terms, evaluated in-process by the default
/// `query` implementations; a real backend would push this down.
pub type TermFilter = dyn Fn(&Term) -> bool + Send + Sync;

#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub handle: TermHandle,
    pub result: Result<(), String>,
}

#[async_trait]
pub trait TermStore: Send + Sync {
    async fn exists(&self, key: &TermHandle) -> Result<bool, StoreError>;
    async fn get(&self, key: &TermHandle) -> Result<Term, StoreError>;
    async fn get_many(&self, keys: &[TermHandle]) -> Result<Vec<Option<Term>>, StoreError>;

    /// `field` ∈ {`_lid`, `_gid`, `_aid`, `_pid`}. Returns every term whose
    /// code section carries `value` under that field.
    async fn lookup_by_field(&self, field: CodeField, value: &str) -> Result<Vec<Term>, StoreError>;

    async fn insert(&self, term: Term) -> Result<(), StoreError>;

    /// All-or-nothing per item (§4.1): a failure on one term never partially
    /// applies that term, but does not roll back terms already inserted.
    async fn insert_many(&self, terms: Vec<Term>) -> Result<Vec<InsertOutcome>, StoreError>;

    async fn update(&self, key: &TermHandle, patch: serde_json::Value) -> Result<(), StoreError>;
    async fn delete(&self, key: &TermHandle) -> Result<(), StoreError>;
    async fn delete_many(&self, keys: &[TermHandle]) -> Result<DeleteManyReport, StoreError>;

    async fn query(
        &self,
        filter: &TermFilter,
        pagination: Pagination,
    ) -> Result<Vec<Term>, StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteManyReport {
    pub deleted: Vec<TermHandle>,
    pub ignored: Vec<TermHandle>,
}
