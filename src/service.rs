//! The service facade (§6.2): composes the term store, graph engine,
//! dictionary resolver, and validator into the single operation surface an
//! external transport layer would call into. Every operation here is a thin
//! delegation — the components above hold all the actual logic.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::config::{DictionaryConfig, ValidatorOptions};
use crate::dictionary::{CheckReport, DictionaryResolver, EnumerationNode, ResolveResult};
use crate::edge::PathData;
use crate::error::{DictionaryError, Result};
use crate::graph::{DeleteEdgesReport, GraphEngine, SetEdgesReport};
use crate::lang::{self, LanguageTag};
use crate::predicate::{Direction, Predicate};
use crate::store::graph_store::GraphStore;
use crate::store::link_store::LinkStore;
use crate::store::term_store::{DeleteManyReport, InsertOutcome, Pagination, TermFilter, TermStore};
use crate::term::{Code, CodeField, Rule, Term, TermHandle};
use crate::validator::report::FinishedReport;
use crate::validator::Validator;

pub use crate::graph::{DeleteEdgesRequest, ResponseFlags, SetEdgesRequest};

pub struct DictionaryService<T: TermStore, G: GraphStore, L: LinkStore> {
    pub config: DictionaryConfig,
    terms: Arc<T>,
    graph_store: Arc<G>,
    graph: GraphEngine<T, G, L>,
    dictionary: Arc<DictionaryResolver<T, G, L>>,
    validator: Validator<T, G, L>,
}

impl<T: TermStore, G: GraphStore, L: LinkStore> DictionaryService<T, G, L> {
    pub fn new(config: DictionaryConfig, terms: Arc<T>, graph_store: Arc<G>, link_store: Arc<L>) -> Self {
        let graph = GraphEngine::new(terms.clone(), graph_store.clone(), link_store.clone());
        let dictionary = Arc::new(DictionaryResolver::new(terms.clone(), graph_store.clone(), link_store));
        let validator = Validator::new(terms.clone(), dictionary.clone());
        Self { config, terms, graph_store, graph, dictionary, validator }
    }

    /// Picks one language out of an `_info` mapping per §6.3's fallback
    /// chain: requested tag, any-language, the configured default.
    pub fn localize<'a>(&self, text: &'a lang::LocalizedText, language: &LanguageTag) -> Option<&'a str> {
        lang::select(text, language, &self.config.language)
    }

    // ---- Terms -----------------------------------------------------

    pub async fn insert_term(&self, term: Term) -> Result<()> {
        self.terms.insert(term).await.map_err(DictionaryError::from)
    }

    pub async fn insert_many_terms(&self, terms: Vec<Term>) -> Result<Vec<InsertOutcome>> {
        self.terms.insert_many(terms).await.map_err(DictionaryError::from)
    }

    pub async fn update_term(&self, key: &TermHandle, patch: serde_json::Value) -> Result<()> {
        self.terms.update(key, patch).await.map_err(DictionaryError::from)
    }

    pub async fn delete_term(&self, key: &TermHandle) -> Result<()> {
        self.terms.delete(key).await.map_err(DictionaryError::from)
    }

    pub async fn delete_many_terms(&self, keys: &[TermHandle]) -> Result<DeleteManyReport> {
        self.terms.delete_many(keys).await.map_err(DictionaryError::from)
    }

    pub async fn get_term(&self, key: &TermHandle) -> Result<Term> {
        self.terms.get(key).await.map_err(DictionaryError::from)
    }

    pub async fn get_many_terms(&self, keys: &[TermHandle]) -> Result<Vec<Option<Term>>> {
        self.terms.get_many(keys).await.map_err(DictionaryError::from)
    }

    pub async fn query_terms(&self, filter: &TermFilter, pagination: Pagination) -> Result<Vec<Term>> {
        self.terms.query(filter, pagination).await.map_err(DictionaryError::from)
    }

    pub async fn query_keys(&self, filter: &TermFilter, pagination: Pagination) -> Result<Vec<TermHandle>> {
        Ok(self.query_terms(filter, pagination).await?.into_iter().map(|t| t.handle()).collect())
    }

    // ---- Graph: path-scoped edges -----------------------------------

    pub async fn set_edges(&self, request: SetEdgesRequest) -> Result<SetEdgesReport> {
        self.graph.set_edges(request).await
    }

    pub async fn delete_edges(&self, request: DeleteEdgesRequest) -> Result<DeleteEdgesReport> {
        self.graph.delete_edges(request).await
    }

    /// §4.3.3: a section edge is a set/delete-edges call with the predicate
    /// pinned to `section-of`.
    pub async fn set_section(&self, mut request: SetEdgesRequest) -> Result<SetEdgesReport> {
        request.predicate = Predicate::SectionOf;
        self.graph.set_edges(request).await
    }

    pub async fn delete_section(&self, mut request: DeleteEdgesRequest) -> Result<DeleteEdgesReport> {
        request.predicate = Predicate::SectionOf;
        self.graph.delete_edges(request).await
    }

    /// §4.3.3: a bridge edge connects a new root to an already-bridged node.
    pub async fn set_bridge(&self, mut request: SetEdgesRequest) -> Result<SetEdgesReport> {
        request.predicate = Predicate::BridgeOf;
        self.graph.set_edges(request).await
    }

    pub async fn delete_bridge(&self, mut request: DeleteEdgesRequest) -> Result<DeleteEdgesReport> {
        request.predicate = Predicate::BridgeOf;
        self.graph.delete_edges(request).await
    }

    // ---- Graph: flat links --------------------------------------------

    pub async fn set_link(
        &self,
        from: &TermHandle,
        predicate: Predicate,
        to: &TermHandle,
        data: PathData,
        require_descriptors: bool,
        save: bool,
    ) -> Result<crate::graph::EdgeOutcome> {
        self.graph.set_link(from, predicate, to, data, require_descriptors, save).await
    }

    pub async fn delete_link(&self, from: &TermHandle, predicate: Predicate, to: &TermHandle, save: bool) -> Result<crate::graph::DeleteOutcome> {
        self.graph.delete_link(from, predicate, to, save).await
    }

    pub async fn set_property(&self, from: &TermHandle, to: &TermHandle, data: PathData, save: bool) -> Result<crate::graph::EdgeOutcome> {
        self.graph.set_link(from, Predicate::PropertyOf, to, data, true, save).await
    }

    pub async fn delete_property(&self, from: &TermHandle, to: &TermHandle, save: bool) -> Result<crate::graph::DeleteOutcome> {
        self.graph.delete_link(from, Predicate::PropertyOf, to, save).await
    }

    pub async fn set_required_indicator(&self, from: &TermHandle, to: &TermHandle, data: PathData, save: bool) -> Result<crate::graph::EdgeOutcome> {
        self.graph.set_link(from, Predicate::RequiredIndicator, to, data, true, save).await
    }

    pub async fn delete_required_indicator(&self, from: &TermHandle, to: &TermHandle, save: bool) -> Result<crate::graph::DeleteOutcome> {
        self.graph.delete_link(from, Predicate::RequiredIndicator, to, save).await
    }

    pub async fn set_required_metadata(&self, from: &TermHandle, to: &TermHandle, data: PathData, save: bool) -> Result<crate::graph::EdgeOutcome> {
        self.graph.set_link(from, Predicate::RequiredMetadata, to, data, true, save).await
    }

    pub async fn delete_required_metadata(&self, from: &TermHandle, to: &TermHandle, save: bool) -> Result<crate::graph::DeleteOutcome> {
        self.graph.delete_link(from, Predicate::RequiredMetadata, to, save).await
    }

    // ---- Enumeration ----------------------------------------------

    pub async fn all_keys(&self, root: &TermHandle) -> Result<Vec<TermHandle>> {
        self.dictionary.enumeration_keys(root).await
    }

    pub async fn all_terms(&self, root: &TermHandle) -> Result<Vec<Term>> {
        self.dictionary.enumeration_terms(root).await
    }

    pub async fn tree_of_keys(&self, root: &TermHandle, max_levels: usize) -> Result<EnumerationNode> {
        self.dictionary.enumeration_tree(root, max_levels).await
    }

    pub async fn match_by_field(&self, reference: &str, fields: &[CodeField], namespace: Option<&str>) -> Result<ResolveResult> {
        self.dictionary.resolve_term(reference, fields, namespace).await
    }

    /// Walks from `handle` up through `enum-of` parents to the enumeration
    /// root, returning the longest such path (leaf-to-root, inclusive of
    /// both ends) found by the underlying traversal.
    pub async fn traverse_path(&self, handle: &TermHandle) -> Result<Vec<TermHandle>> {
        let allowed = [Predicate::EnumOf, Predicate::SectionOf, Predicate::BridgeOf];
        let steps = self
            .graph_store
            .traverse(handle, Direction::ChildrenPointToParent, 1, crate::config::MAX_DEPTH, &allowed, &|_| false)
            .await
            .map_err(DictionaryError::from)?;
        let deepest = steps.into_iter().max_by_key(|step| step.path.len());
        Ok(deepest.map(|step| step.path).unwrap_or_else(|| vec![handle.clone()]))
    }

    pub async fn path_by_lid(&self, lid: &str) -> Result<Vec<TermHandle>> {
        self.traverse_path(&TermHandle::from(lid)).await
    }

    pub async fn path_by_gid(&self, gid: &str) -> Result<Vec<TermHandle>> {
        let result = self.dictionary.resolve_term(gid, &[CodeField::Gid], None).await?;
        let Some(term) = result.term else {
            return Err(DictionaryError::invalid_reference(gid));
        };
        self.traverse_path(&term.handle()).await
    }

    pub async fn check_keys(&self, root: &TermHandle, keys: &[String]) -> Result<CheckReport> {
        self.dictionary.check_enum(root, keys).await
    }

    pub async fn check_codes(&self, root: &TermHandle, field: CodeField, codes: &[String]) -> Result<CheckReport> {
        self.dictionary.check_codes(root, field, codes).await
    }

    // ---- Dictionary -------------------------------------------------

    pub async fn required_keys(&self, descriptors: &[TermHandle]) -> Result<Vec<TermHandle>> {
        let closure: IndexSet<TermHandle> = self.dictionary.required_closure(descriptors).await?;
        Ok(closure.into_iter().collect())
    }

    pub async fn required_terms(&self, descriptors: &[TermHandle]) -> Result<Vec<Term>> {
        let keys = self.required_keys(descriptors).await?;
        let mut terms = Vec::with_capacity(keys.len());
        for key in keys {
            terms.push(self.terms.get(&key).await.map_err(DictionaryError::from)?);
        }
        Ok(terms)
    }

    pub async fn descriptor_enum_keys(&self, root: &TermHandle) -> Result<Vec<TermHandle>> {
        self.all_keys(root).await
    }

    pub async fn descriptor_enum_terms(&self, root: &TermHandle) -> Result<Vec<Term>> {
        self.all_terms(root).await
    }

    pub async fn descriptor_enum_tree(&self, root: &TermHandle, max_levels: usize) -> Result<EnumerationNode> {
        self.tree_of_keys(root, max_levels).await
    }

    /// The `_rule` qualifications (`_required`/`_banned`/`_computed`/
    /// `_locked`) of an object-type descriptor.
    pub async fn descriptor_qualifications(&self, descriptor_gid: &str) -> Result<Rule> {
        let Some(term) = self.dictionary.descriptor_by_gid(descriptor_gid).await? else {
            return Err(DictionaryError::invalid_reference(descriptor_gid));
        };
        Ok(term.rule.unwrap_or_default())
    }

    // ---- Validation ---------------------------------------------------

    pub async fn validate_descriptor(
        &self,
        descriptor_gid: &str,
        value: &serde_json::Value,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<FinishedReport> {
        self.validator.validate_descriptor(descriptor_gid, value, language, options).await
    }

    pub async fn validate_definition(
        &self,
        definition: &crate::definition::DataDefinition,
        value: &serde_json::Value,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<FinishedReport> {
        self.validator.validate_definition(definition, value, language, options).await
    }

    pub async fn validate_object(&self, object: &serde_json::Value, language: &LanguageTag, options: &ValidatorOptions) -> Result<FinishedReport> {
        self.validator.validate_object(object, language, options).await
    }

    pub async fn validate_objects(&self, objects: &[serde_json::Value], language: &LanguageTag, options: &ValidatorOptions) -> Result<Vec<FinishedReport>> {
        self.validator.validate_objects(objects, language, options).await
    }
}

/// A minimal term builder used by the CLI and test fixtures, grounded on the
/// same "plain struct, no staged construction" idiom as `DictionaryConfig`.
pub fn namespace_term(lid: &str, gid: &str, title: &str, language: &LanguageTag) -> Term {
    Term {
        code: Code { lid: lid.to_owned(), gid: gid.to_owned(), ..Default::default() },
        info: crate::term::Info {
            title: [(language.to_string(), title.to_owned())].into_iter().collect(),
            ..Default::default()
        },
        data: None,
        rule: None,
    }
}
