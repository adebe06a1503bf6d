//! The per-request term cache (§4.5.3 `use_cache`/`cache_missed`, §9
//! "Validator state is kept purely on the stack plus a per-request term
//! cache"). Owned by a single validation call, never shared across tasks, so
//! a plain map is enough — no locking.

use indexmap::IndexMap;

use crate::error::{DictionaryError, Result};
use crate::store::term_store::TermStore;
use crate::term::{CodeField, Term};

pub struct Cache<'a, T: TermStore> {
    terms: &'a T,
    use_cache: bool,
    cache_missed: bool,
    entries: IndexMap<(CodeField, String), Option<Term>>,
}

impl<'a, T: TermStore> Cache<'a, T> {
    pub fn new(terms: &'a T, use_cache: bool, cache_missed: bool) -> Self {
        Self { terms, use_cache, cache_missed, entries: IndexMap::new() }
    }

    /// Looks up exactly one term by `field = value`. `Ok(None)` means zero
    /// matches; more than one match is surfaced as `AmbiguousResolution`.
    pub async fn resolve_one(&mut self, field: CodeField, value: &str) -> Result<Option<Term>> {
        let key = (field, value.to_owned());
        if self.use_cache {
            if let Some(cached) = self.entries.get(&key) {
                return Ok(cached.clone());
            }
        }
        let mut candidates = self.terms.lookup_by_field(field, value).await.map_err(DictionaryError::from)?;
        let result = match candidates.len() {
            0 => None,
            1 => Some(candidates.remove(0)),
            n => return Err(DictionaryError::AmbiguousResolution { path: value.to_owned(), count: n }),
        };
        if self.use_cache && (result.is_some() || self.cache_missed) {
            self.entries.insert(key, result.clone());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryTermStore;
    use crate::term::{Code, Info};

    fn term(lid: &str, gid: &str) -> Term {
        Term { code: Code { lid: lid.into(), gid: gid.into(), ..Default::default() }, info: Info::default(), data: None, rule: None }
    }

    #[tokio::test]
    async fn caches_a_hit() {
        let store = MemoryTermStore::new();
        crate::store::term_store::TermStore::insert(&store, term("test", "test-gid")).await.unwrap();
        let mut cache = Cache::new(&store, true, true);
        let first = cache.resolve_one(CodeField::Gid, "test-gid").await.unwrap();
        assert!(first.is_some());
        let second = cache.resolve_one(CodeField::Gid, "test-gid").await.unwrap();
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn does_not_cache_misses_when_disabled() {
        let store = MemoryTermStore::new();
        let mut cache = Cache::new(&store, true, false);
        assert!(cache.resolve_one(CodeField::Gid, "missing").await.unwrap().is_none());
        assert!(cache.entries.is_empty());
    }
}
