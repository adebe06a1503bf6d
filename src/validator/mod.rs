//! Validator (component E, §4.5): the recursive value-vs-definition checker.
//! By far the largest component (§2's "~45% of the implementation"), but the
//! recursion itself stays small — most of the weight is the scalar-type
//! constraint table and the object-rule checks.

pub mod cache;
pub mod report;

use std::sync::Arc;

use regex::Regex;
use time::macros::format_description;
use time::Date;
use tracing::instrument;

use crate::config::ValidatorOptions;
use crate::definition::{ArrayDefinition, DataDefinition, DateKind, DictDefinition, ObjectDefinition, ScalarDefinition, ScalarType};
use crate::dictionary::DictionaryResolver;
use crate::error::{DictionaryError, Result};
use crate::lang::LanguageTag;
use crate::store::graph_store::GraphStore;
use crate::store::link_store::LinkStore;
use crate::store::term_store::TermStore;
use crate::term::CodeField;

use self::cache::Cache;
use self::report::{Collector, FinishedReport, ValuePath};

/// The four sections every term-shaped value is expected to carry (§3.1);
/// anything else at the top level is a candidate object property (§4.5.1's
/// `validate_object`).
const TERM_SECTIONS: [&str; 4] = ["_code", "_info", "_data", "_rule"];

pub struct Validator<T: TermStore, G: GraphStore, L: LinkStore> {
    terms: Arc<T>,
    dictionary: Arc<DictionaryResolver<T, G, L>>,
}

impl<T: TermStore, G: GraphStore, L: LinkStore> Validator<T, G, L> {
    pub fn new(terms: Arc<T>, dictionary: Arc<DictionaryResolver<T, G, L>>) -> Self {
        Self { terms, dictionary }
    }

    /// §4.5.1: locate the descriptor by `_gid`, then validate against its
    /// data definition.
    #[instrument(skip(self, value, options))]
    pub async fn validate_descriptor(
        &self,
        descriptor_gid: &str,
        value: &serde_json::Value,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<FinishedReport> {
        let mut candidates = self.terms.lookup_by_field(CodeField::Gid, descriptor_gid).await.map_err(DictionaryError::from)?;
        let term = match candidates.len() {
            0 => return Err(DictionaryError::invalid_reference(descriptor_gid)),
            1 => candidates.remove(0),
            n => return Err(DictionaryError::AmbiguousResolution { path: descriptor_gid.to_owned(), count: n }),
        };
        let Some(definition) = term.data.clone() else {
            return Err(DictionaryError::NotDescriptor { handle: descriptor_gid.to_owned() });
        };
        self.validate_definition(&definition, value, language, options).await
    }

    /// §4.5.1: validate a bare value against a definition, no term wrapper.
    #[instrument(skip(self, definition, value, options))]
    pub async fn validate_definition(
        &self,
        definition: &DataDefinition,
        value: &serde_json::Value,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<FinishedReport> {
        let mut collector = Collector::default();
        let mut cache = Cache::new(self.terms.as_ref(), options.use_cache, options.cache_missed);
        self.validate_node(definition, value, &ValuePath::new(), &mut collector, &mut cache, language, options).await?;
        Ok(collector.into_report().finish())
    }

    /// §4.5.1: validate a full term-shaped value — its fixed sections plus,
    /// per `expect_terms`, every additional top-level key as an object
    /// property needing a matching descriptor.
    #[instrument(skip(self, object, options))]
    pub async fn validate_object(
        &self,
        object: &serde_json::Value,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<FinishedReport> {
        let mut collector = Collector::default();
        let mut cache = Cache::new(self.terms.as_ref(), options.use_cache, options.cache_missed);
        let Some(map) = object.as_object() else {
            collector.record_error(DictionaryError::KindMismatch { path: ValuePath::new().render(), expected: "mapping" });
            return Ok(collector.into_report().finish());
        };

        match map.get("_code").and_then(|c| c.get("_lid")).and_then(|v| v.as_str()) {
            Some(_) => {}
            None => collector.record_error(DictionaryError::DefinitionError {
                path: "_code._lid".to_owned(),
                reason: "term is missing a local identifier".to_owned(),
            }),
        }
        if map.get("_info").and_then(|i| i.get("_title")).is_none() {
            collector.record_error(DictionaryError::DefinitionError {
                path: "_info._title".to_owned(),
                reason: "term is missing a title".to_owned(),
            });
        }
        if let Some(data_value) = map.get("_data") {
            if let Err(err) = serde_json::from_value::<DataDefinition>(data_value.clone()) {
                collector.record_error(DictionaryError::DefinitionError {
                    path: "_data".to_owned(),
                    reason: err.to_string(),
                });
            }
        }

        for (key, val) in map {
            if TERM_SECTIONS.contains(&key.as_str()) {
                continue;
            }
            let path = ValuePath::new().push_field(key);
            if !options.expect_terms {
                continue;
            }
            match self.dictionary.descriptor_by_gid(key).await? {
                Some(descriptor) => {
                    if let Some(definition) = &descriptor.data {
                        self.validate_node(definition, val, &path, &mut collector, &mut cache, language, options).await?;
                    }
                }
                None => collector.record_error(DictionaryError::UnknownProperty { path: path.render(), property: key.clone() }),
            }
        }

        Ok(collector.into_report().finish())
    }

    pub async fn validate_objects(
        &self,
        objects: &[serde_json::Value],
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<Vec<FinishedReport>> {
        let mut reports = Vec::with_capacity(objects.len());
        for object in objects {
            reports.push(self.validate_object(object, language, options).await?);
        }
        Ok(reports)
    }

    /// §4.5.2: the recursive walk. A `DefinitionError` is fatal only for the
    /// current node (it returns immediately, recording the error); every
    /// other failure is recorded and the walk continues into sibling
    /// elements, so `changes` still accumulates across the whole value.
    #[allow(clippy::too_many_arguments)]
    async fn validate_node(
        &self,
        definition: &DataDefinition,
        value: &serde_json::Value,
        path: &ValuePath,
        collector: &mut Collector,
        cache: &mut Cache<'_, T>,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<()> {
        match definition {
            DataDefinition::Scalar { scalar, .. } => {
                if value.is_array() || value.is_object() {
                    collector.record_error(DictionaryError::KindMismatch { path: path.render(), expected: "primitive" });
                    return Ok(());
                }
                self.validate_scalar(scalar, value, path, collector, cache, options).await?;
            }
            DataDefinition::Array { array, .. } | DataDefinition::Set { array, .. } => {
                let is_set = matches!(definition, DataDefinition::Set { .. });
                let Some(items) = value.as_array() else {
                    collector.record_error(DictionaryError::KindMismatch { path: path.render(), expected: "sequence" });
                    return Ok(());
                };
                self.validate_array(array, items, is_set, path, collector, cache, language, options).await?;
            }
            DataDefinition::Dict { dict, .. } => {
                let Some(map) = value.as_object() else {
                    collector.record_error(DictionaryError::KindMismatch { path: path.render(), expected: "mapping" });
                    return Ok(());
                };
                self.validate_dict(dict, map, path, collector, cache, language, options).await?;
            }
            DataDefinition::Object { object, .. } => {
                let Some(map) = value.as_object() else {
                    collector.record_error(DictionaryError::KindMismatch { path: path.render(), expected: "mapping" });
                    return Ok(());
                };
                self.validate_object_value(object, map, path, collector, cache, language, options).await?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn validate_scalar(
        &self,
        scalar: &ScalarDefinition,
        value: &serde_json::Value,
        path: &ValuePath,
        collector: &mut Collector,
        cache: &mut Cache<'_, T>,
        options: &ValidatorOptions,
    ) -> Result<()> {
        let Some(scalar_type) = scalar.r#type else {
            if options.expect_types {
                collector.record_error(DictionaryError::DefinitionError {
                    path: path.render(),
                    reason: "scalar definition is missing _type".to_owned(),
                });
            }
            return Ok(());
        };

        match scalar_type {
            ScalarType::Boolean => {
                if !value.is_boolean() {
                    collector.record_error(type_mismatch(path, scalar_type));
                }
            }
            ScalarType::Integer => {
                if value.as_i64().is_none() && value.as_u64().is_none() {
                    collector.record_error(type_mismatch(path, scalar_type));
                } else {
                    self.check_numeric_range(scalar, value, path, collector);
                }
            }
            ScalarType::Number => {
                if value.as_f64().is_none() {
                    collector.record_error(type_mismatch(path, scalar_type));
                } else {
                    self.check_numeric_range(scalar, value, path, collector);
                }
            }
            ScalarType::Timestamp => {
                let Some(text) = value.as_str() else {
                    collector.record_error(type_mismatch(path, scalar_type));
                    return Ok(());
                };
                if !check_timestamp(text, scalar.constraints.dkind) {
                    collector.record_error(DictionaryError::FormatError { path: path.render() });
                }
            }
            ScalarType::String => {
                let Some(text) = value.as_str() else {
                    collector.record_error(type_mismatch(path, scalar_type));
                    return Ok(());
                };
                self.check_string_constraints(scalar, text, path, collector);
            }
            ScalarType::StringEnum => {
                let Some(text) = value.as_str() else {
                    collector.record_error(type_mismatch(path, scalar_type));
                    return Ok(());
                };
                self.check_string_enum(scalar, text, path, collector, cache, options).await?;
            }
            ScalarType::StringKey => {
                let Some(text) = value.as_str() else {
                    collector.record_error(type_mismatch(path, scalar_type));
                    return Ok(());
                };
                if cache.resolve_one(CodeField::Gid, text).await?.is_none() {
                    collector.record_error(DictionaryError::invalid_reference(text));
                }
            }
            ScalarType::StringHandle => {
                let Some(text) = value.as_str() else {
                    collector.record_error(type_mismatch(path, scalar_type));
                    return Ok(());
                };
                if !self.terms.exists(&text.into()).await.map_err(DictionaryError::from)? {
                    collector.record_error(DictionaryError::invalid_reference(text));
                }
            }
            ScalarType::Object => {
                if !value.is_object() {
                    collector.record_error(type_mismatch(path, scalar_type));
                }
            }
            ScalarType::Geojson => {
                let valid = value.get("type").and_then(|v| v.as_str()).is_some() && value.get("coordinates").is_some();
                if !valid {
                    collector.record_error(DictionaryError::FormatError { path: path.render() });
                }
            }
        }
        Ok(())
    }

    fn check_numeric_range(&self, scalar: &ScalarDefinition, value: &serde_json::Value, path: &ValuePath, collector: &mut Collector) {
        let Some(number) = value.as_f64() else { return };
        if let Some(range) = &scalar.constraints.mrange {
            if !range.contains(number) {
                collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                return;
            }
        }
        if let Some(range) = &scalar.constraints.nrange {
            if !range.contains(number) {
                collector.record_error(DictionaryError::RangeViolation { path: path.render() });
            }
        }
    }

    fn check_string_constraints(&self, scalar: &ScalarDefinition, text: &str, path: &ValuePath, collector: &mut Collector) {
        if let Some(pattern) = &scalar.constraints.regex {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(text) => {}
                Ok(_) => {
                    collector.record_error(DictionaryError::PatternMismatch { path: path.render() });
                    return;
                }
                Err(_) => {
                    collector.record_error(DictionaryError::DefinitionError {
                        path: path.render(),
                        reason: "invalid _regex pattern".to_owned(),
                    });
                    return;
                }
            }
        }
        if let Some(format) = &scalar.constraints.format {
            if format == "email" && !text.contains('@') {
                collector.record_error(DictionaryError::FormatError { path: path.render() });
            }
        }
    }

    async fn check_string_enum(
        &self,
        scalar: &ScalarDefinition,
        text: &str,
        path: &ValuePath,
        collector: &mut Collector,
        cache: &mut Cache<'_, T>,
        options: &ValidatorOptions,
    ) -> Result<()> {
        if self.is_enum_member(&scalar.kind, text).await? {
            return Ok(());
        }
        if options.resolve {
            let resolve_field = parse_code_field(&options.resolve_field);
            if let Some(term) = cache.resolve_one(resolve_field, text).await? {
                if self.is_enum_member(&scalar.kind, &term.code.gid).await? {
                    collector.record_change(path, serde_json::Value::String(text.to_owned()), serde_json::Value::String(term.code.gid.clone()));
                    return Ok(());
                }
            }
        }
        collector.record_error(DictionaryError::EnumNotMember {
            path: path.render(),
            root: scalar.kind.join(","),
        });
        Ok(())
    }

    /// Whether `gid` is one of the roots in `kind`, or a descendant of one
    /// of them under `enum-of` (tolerating section/bridge).
    async fn is_enum_member(&self, kind: &[String], gid: &str) -> Result<bool> {
        for root_gid in kind {
            let mut roots = self.terms.lookup_by_field(CodeField::Gid, root_gid).await.map_err(DictionaryError::from)?;
            let Some(root_term) = roots.pop() else { continue };
            let report = self.dictionary.check_codes(&root_term.handle(), CodeField::Gid, &[gid.to_owned()]).await?;
            if !report.valid.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    #[allow(clippy::too_many_arguments)]
    async fn validate_array(
        &self,
        array: &ArrayDefinition,
        items: &[serde_json::Value],
        is_set: bool,
        path: &ValuePath,
        collector: &mut Collector,
        cache: &mut Cache<'_, T>,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<()> {
        if let Some(min) = array.min_items {
            if items.len() < min {
                collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                return Ok(());
            }
        }
        if let Some(max) = array.max_items {
            if items.len() > max {
                collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                return Ok(());
            }
        }
        if is_set {
            let mut seen = std::collections::HashSet::new();
            for item in items {
                if !seen.insert(item.to_string()) {
                    collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                    return Ok(());
                }
            }
        }
        if let Some(elements) = &array.elements {
            for (index, item) in items.iter().enumerate() {
                let item_path = path.push_index(index);
                Box::pin(self.validate_node(elements, item, &item_path, collector, cache, language, options)).await?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn validate_dict(
        &self,
        dict: &DictDefinition,
        map: &serde_json::Map<String, serde_json::Value>,
        path: &ValuePath,
        collector: &mut Collector,
        cache: &mut Cache<'_, T>,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<()> {
        for (key, value) in map {
            let entry_path = path.push_field(key);
            let key_value = serde_json::Value::String(key.clone());
            Box::pin(self.validate_node(&dict.key, &key_value, &entry_path, collector, cache, language, options)).await?;
            Box::pin(self.validate_node(&dict.value, value, &entry_path, collector, cache, language, options)).await?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn validate_object_value(
        &self,
        object: &ObjectDefinition,
        map: &serde_json::Map<String, serde_json::Value>,
        path: &ValuePath,
        collector: &mut Collector,
        cache: &mut Cache<'_, T>,
        language: &LanguageTag,
        options: &ValidatorOptions,
    ) -> Result<()> {
        let type_gid = object
            .fixed_type
            .clone()
            .or_else(|| map.get("_type").and_then(|v| v.as_str().map(str::to_owned)));
        let Some(type_gid) = type_gid else {
            collector.record_error(DictionaryError::DefinitionError {
                path: path.render(),
                reason: "object value has no fixed type and no _type property".to_owned(),
            });
            return Ok(());
        };
        let mut candidates = self.terms.lookup_by_field(CodeField::Gid, &type_gid).await.map_err(DictionaryError::from)?;
        let term = match candidates.len() {
            0 => {
                collector.record_error(DictionaryError::invalid_reference(&type_gid));
                return Ok(());
            }
            1 => candidates.remove(0),
            n => {
                collector.record_error(DictionaryError::AmbiguousResolution { path: path.render(), count: n });
                return Ok(());
            }
        };

        if let Some(rule) = &term.rule {
            self.check_rule(rule, map, path, collector);
        }

        for (key, value) in map {
            if key == "_type" {
                continue;
            }
            let property_path = path.push_field(key);
            if !options.expect_terms {
                continue;
            }
            match self.dictionary.descriptor_by_gid(key).await? {
                Some(descriptor) => {
                    if let Some(definition) = &descriptor.data {
                        Box::pin(self.validate_node(definition, value, &property_path, collector, cache, language, options)).await?;
                    } else {
                        collector.record_error(DictionaryError::NotDescriptor { handle: key.clone() });
                    }
                }
                None => collector.record_error(DictionaryError::UnknownProperty { path: property_path.render(), property: key.clone() }),
            }
        }
        Ok(())
    }

    /// §3.3: `_required` all-of/one-of/any-of, `_banned` presence.
    fn check_rule(&self, rule: &crate::term::Rule, map: &serde_json::Map<String, serde_json::Value>, path: &ValuePath, collector: &mut Collector) {
        let present = |property: &str| map.contains_key(property);

        for banned in &rule.banned {
            if present(banned) {
                collector.record_error(DictionaryError::RangeViolation { path: path.push_field(banned).render() });
                return;
            }
        }
        if let Some(required) = &rule.required {
            for set in &required.all_of {
                if !set.iter().all(|p| present(p)) {
                    collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                    return;
                }
            }
            for set in &required.one_of {
                if set.iter().filter(|p| present(p)).count() != 1 {
                    collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                    return;
                }
            }
            for set in &required.any_of {
                if !set.iter().any(|p| present(p)) {
                    collector.record_error(DictionaryError::RangeViolation { path: path.render() });
                    return;
                }
            }
        }
    }
}

fn type_mismatch(path: &ValuePath, scalar_type: ScalarType) -> DictionaryError {
    DictionaryError::TypeMismatch { path: path.render(), expected: scalar_type.to_string() }
}

fn parse_code_field(field: &str) -> CodeField {
    match field {
        "_gid" => CodeField::Gid,
        "_aid" => CodeField::Aid,
        "_pid" => CodeField::Pid,
        _ => CodeField::Lid,
    }
}

fn check_timestamp(text: &str, dkind: Option<DateKind>) -> bool {
    match dkind.unwrap_or(DateKind::Time) {
        DateKind::Year => text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()),
        DateKind::Month => Date::parse(&format!("{text}-01"), &format_description!("[year]-[month]-[day]")).is_ok(),
        DateKind::Day => Date::parse(text, &format_description!("[year]-[month]-[day]")).is_ok(),
        DateKind::Time => time::OffsetDateTime::parse(text, &time::format_description::well_known::Rfc3339).is_ok(),
    }
}
