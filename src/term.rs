//! The term document (§3.1) and its four sections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::definition::DataDefinition;
use crate::lang::LocalizedText;

/// A handle identifying a term document in the store — whatever the backing
/// store uses as its primary key (an ArangoDB-style `_key` in the system
/// this crate's domain is modeled on). Newtype so call sites can't
/// accidentally pass a `_gid` where a primary handle is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::From, derive_more::Into)]
pub struct TermHandle(pub String);

impl fmt::Display for TermHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TermHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TermHandle {
    fn from(value: &str) -> Self {
        TermHandle(value.to_owned())
    }
}

/// The four code fields a term may be looked up by (§3.1, §4.1, §4.4). Order
/// matters: it is the default candidate-field iteration order used by
/// `DictionaryResolver::resolve_term`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum CodeField {
    #[strum(to_string = "_gid")]
    Gid,
    #[strum(to_string = "_aid")]
    Aid,
    #[strum(to_string = "_pid")]
    Pid,
    #[strum(to_string = "_lid")]
    Lid,
}

impl CodeField {
    /// The order `resolve_term` iterates candidate fields in by default.
    pub const DEFAULT_ORDER: [CodeField; 4] =
        [CodeField::Gid, CodeField::Aid, CodeField::Pid, CodeField::Lid];
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Code {
    #[serde(rename = "_lid")]
    pub lid: String,
    #[serde(rename = "_gid")]
    pub gid: String,
    #[serde(rename = "_aid", default, skip_serializing_if = "Vec::is_empty")]
    pub aid: Vec<String>,
    #[serde(rename = "_pid", default, skip_serializing_if = "Vec::is_empty")]
    pub pid: Vec<String>,
    #[serde(rename = "_nid", default, skip_serializing_if = "Option::is_none")]
    pub nid: Option<String>,
    #[serde(rename = "_name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Code {
    /// All values present for a given code field, used by the term store's
    /// secondary index and by `resolve_term`'s candidate scan.
    pub fn values_for(&self, field: CodeField) -> Vec<&str> {
        match field {
            CodeField::Gid => vec![self.gid.as_str()],
            CodeField::Aid => self.aid.iter().map(String::as_str).collect(),
            CodeField::Pid => self.pid.iter().map(String::as_str).collect(),
            CodeField::Lid => vec![self.lid.as_str()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Info {
    #[serde(rename = "_title")]
    pub title: LocalizedText,
    #[serde(rename = "_definition", default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<LocalizedText>,
    #[serde(rename = "_description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(rename = "_examples", default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<LocalizedText>,
    #[serde(rename = "_notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<LocalizedText>,
    #[serde(rename = "_provider", default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<LocalizedText>,
}

/// Object-shape constraints (§3.3), present only on terms used as an object
/// type. `_required`/`_banned`/`_computed`/`_locked` all reference
/// descriptor `_gid`s rather than embedding the descriptors themselves —
/// membership in "part of the object" is resolved against the term store at
/// validation time, not baked in here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Rule {
    #[serde(rename = "_required", default, skip_serializing_if = "Option::is_none")]
    pub required: Option<RequiredRule>,
    #[serde(rename = "_banned", default, skip_serializing_if = "Vec::is_empty")]
    pub banned: Vec<String>,
    #[serde(rename = "_computed", default, skip_serializing_if = "Vec::is_empty")]
    pub computed: Vec<String>,
    #[serde(rename = "_locked", default, skip_serializing_if = "Vec::is_empty")]
    pub locked: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequiredRule {
    /// Every set here must be fully satisfied.
    #[serde(rename = "_all_of", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Vec<String>>,
    /// Every list here must have exactly one property present.
    #[serde(rename = "_one_of", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Vec<String>>,
    /// Every list here must have at least one property present.
    #[serde(rename = "_any_of", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "_code")]
    pub code: Code,
    #[serde(rename = "_info")]
    pub info: Info,
    #[serde(rename = "_data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataDefinition>,
    #[serde(rename = "_rule", default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
}

impl Term {
    pub fn handle(&self) -> TermHandle {
        TermHandle(self.code.lid.clone())
    }

    /// A term with a data section is a descriptor (§3.2); one without is a
    /// namespace term.
    pub fn is_descriptor(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(lid: &str, gid: &str) -> Term {
        Term {
            code: Code { lid: lid.into(), gid: gid.into(), ..Default::default() },
            info: Info::default(),
            data: None,
            rule: None,
        }
    }

    #[test]
    fn namespace_term_is_not_a_descriptor() {
        assert!(!term("test", "test").is_descriptor());
    }

    #[test]
    fn code_field_order_matches_spec() {
        assert_eq!(
            CodeField::DEFAULT_ORDER,
            [CodeField::Gid, CodeField::Aid, CodeField::Pid, CodeField::Lid]
        );
    }
}
