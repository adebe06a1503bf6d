//! Enumerated configuration (§6.4) and validator options (§4.5.3). Grounded
//! on the teacher's `ApiSchemaOptions`: a plain struct of fields with a
//! `Default` impl, rather than a builder — every field here is a simple
//! scalar or string and there is no staged construction to justify one.

use crate::lang::LanguageTag;

/// Default bound for graph traversal depth (§4.2, §4.4) and, by
/// construction, for validator recursion (§5 — data definitions cannot be
/// self-referential, so this bound is never actually hit by the validator,
/// but the dictionary resolver's traversals do hit it on cyclic or
/// pathological graphs).
pub const MAX_DEPTH: usize = 10;

/// Optimistic-concurrency retry bound for edge read-modify-write cycles
/// (§4.3.6, §9).
pub const RETRY_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    pub language: LanguageTag,
    pub collection_term: String,
    pub collection_edge: String,
    pub collection_link: String,
    pub section_data: String,
    pub section_path: String,
    pub section_path_data: String,
    pub predicate: String,
    pub predicate_enumeration: String,
    pub predicate_field: String,
    pub predicate_property: String,
    pub predicate_section: String,
    pub predicate_bridge: String,
    pub predicate_required_indicator: String,
    pub predicate_required_metadata: String,
    pub local_identifier: String,
    pub default_namespace: String,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            language: LanguageTag::Iso6393("eng".to_owned()),
            collection_term: "terms".to_owned(),
            collection_edge: "edges".to_owned(),
            collection_link: "links".to_owned(),
            section_data: "_data".to_owned(),
            section_path: "_path".to_owned(),
            section_path_data: "_data".to_owned(),
            predicate: "_predicate".to_owned(),
            predicate_enumeration: "enum-of".to_owned(),
            predicate_field: "field-of".to_owned(),
            predicate_property: "property-of".to_owned(),
            predicate_section: "section-of".to_owned(),
            predicate_bridge: "bridge-of".to_owned(),
            predicate_required_indicator: "required-indicator".to_owned(),
            predicate_required_metadata: "required-metadata".to_owned(),
            local_identifier: "_lid".to_owned(),
            default_namespace: "_".to_owned(),
        }
    }
}

/// Recognized validator options (§4.5.3), with the defaults from the table.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    pub use_cache: bool,
    pub cache_missed: bool,
    pub expect_terms: bool,
    pub expect_types: bool,
    pub allow_default_namespace: bool,
    pub resolve: bool,
    pub resolve_field: String,
    pub save_term: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_missed: true,
            expect_terms: true,
            expect_types: false,
            allow_default_namespace: false,
            resolve: false,
            resolve_field: "_lid".to_owned(),
            save_term: true,
        }
    }
}
