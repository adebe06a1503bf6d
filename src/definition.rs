//! The recursive data definition (§3.2) and its constraint fields. This is
//! the `DataDefinition` design note of spec.md §9: a tagged union over
//! `Scalar | Array | Set | Dict | Object`, with `Object` carrying a term
//! `_gid` resolved lazily against the term store rather than embedded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Category,
    Quantity,
    Identifier,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    #[strum(to_string = "boolean")]
    Boolean,
    #[strum(to_string = "integer")]
    Integer,
    #[strum(to_string = "number")]
    Number,
    #[strum(to_string = "timestamp")]
    Timestamp,
    #[strum(to_string = "string")]
    String,
    #[strum(to_string = "string_enum")]
    StringEnum,
    #[strum(to_string = "string_key")]
    StringKey,
    #[strum(to_string = "string_handle")]
    StringHandle,
    #[strum(to_string = "object")]
    Object,
    #[strum(to_string = "geojson")]
    Geojson,
}

/// Date granularity for `timestamp` values (`_dkind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    Year,
    Month,
    Day,
    Time,
}

/// Inclusive numeric range (`_mrange`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct InclusiveRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl InclusiveRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Exclusive numeric range (`_nrange`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ExclusiveRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ExclusiveRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value > min) && self.max.map_or(true, |max| value < max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Constraints {
    #[serde(rename = "_mrange", default, skip_serializing_if = "Option::is_none")]
    pub mrange: Option<InclusiveRange>,
    #[serde(rename = "_nrange", default, skip_serializing_if = "Option::is_none")]
    pub nrange: Option<ExclusiveRange>,
    #[serde(rename = "_dkind", default, skip_serializing_if = "Option::is_none")]
    pub dkind: Option<DateKind>,
    #[serde(rename = "_regex", default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(rename = "_format", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "_unit", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarDefinition {
    #[serde(rename = "_type")]
    pub r#type: Option<ScalarType>,
    /// Enumeration graph roots, for `_type = string_enum`.
    #[serde(rename = "_kind", default, skip_serializing_if = "Vec::is_empty")]
    pub kind: Vec<String>,
    #[serde(flatten)]
    pub constraints: Constraints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayDefinition {
    #[serde(rename = "_elements", default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Box<DataDefinition>>,
    #[serde(rename = "_min_items", default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(rename = "_max_items", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictDefinition {
    #[serde(rename = "_key")]
    pub key: Box<DataDefinition>,
    #[serde(rename = "_value")]
    pub value: Box<DataDefinition>,
}

/// Object descriptor reference (§3.3). Resolved lazily: only the `_gid` is
/// stored here, the term store supplies the `_rule` at validation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDefinition {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub fixed_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataDefinition {
    #[serde(rename = "_scalar")]
    Scalar {
        #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
        class: Option<Category>,
        #[serde(flatten)]
        scalar: ScalarDefinition,
    },
    #[serde(rename = "_array")]
    Array {
        #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
        class: Option<Category>,
        #[serde(flatten)]
        array: ArrayDefinition,
    },
    #[serde(rename = "_set")]
    Set {
        #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
        class: Option<Category>,
        #[serde(flatten)]
        array: ArrayDefinition,
    },
    #[serde(rename = "_dict")]
    Dict {
        #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
        class: Option<Category>,
        #[serde(flatten)]
        dict: DictDefinition,
    },
    #[serde(rename = "_object")]
    Object {
        #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
        class: Option<Category>,
        #[serde(flatten)]
        object: ObjectDefinition,
    },
}

impl DataDefinition {
    pub fn class(&self) -> Option<Category> {
        match self {
            DataDefinition::Scalar { class, .. }
            | DataDefinition::Array { class, .. }
            | DataDefinition::Set { class, .. }
            | DataDefinition::Dict { class, .. }
            | DataDefinition::Object { class, .. } => *class,
        }
    }

    pub fn container_name(&self) -> &'static str {
        match self {
            DataDefinition::Scalar { .. } => "_scalar",
            DataDefinition::Array { .. } => "_array",
            DataDefinition::Set { .. } => "_set",
            DataDefinition::Dict { .. } => "_dict",
            DataDefinition::Object { .. } => "_object",
        }
    }
}
