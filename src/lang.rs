//! Language tag parsing (§6.3) and the `_info` mapping-selection rules that
//! every read path (term store, service facade) applies before handing a
//! title/definition/description back to a caller.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The literal forms a caller may pass as `language`. `All` means "skip
/// selection, return the whole mapping" and is handled by callers directly
/// rather than by `LanguageTag::select`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Iso6393(String),
    Iso6391(String),
    /// `iso_639_3_@` — "any language".
    Any,
    /// `all` — return the full mapping, unselected.
    All,
}

pub const ANY_LANGUAGE_KEY: &str = "iso_639_3_@";

impl LanguageTag {
    /// The literal key used inside an `_info` mapping for this tag, when one
    /// exists (`All` has no single key).
    pub fn mapping_key(&self) -> Option<String> {
        match self {
            LanguageTag::Iso6393(code) => Some(format!("iso_639_3_{code}")),
            LanguageTag::Iso6391(code) => Some(format!("iso_639_1_{code}")),
            LanguageTag::Any => Some(ANY_LANGUAGE_KEY.to_owned()),
            LanguageTag::All => None,
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageTag::All => write!(f, "all"),
            other => write!(f, "{}", other.mapping_key().unwrap()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0} is not a recognized language tag")]
pub struct LanguageTagParseError(String);

impl FromStr for LanguageTag {
    type Err = LanguageTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(LanguageTag::All);
        }
        if s == ANY_LANGUAGE_KEY {
            return Ok(LanguageTag::Any);
        }
        if let Some(code) = s.strip_prefix("iso_639_3_") {
            return Ok(LanguageTag::Iso6393(code.to_owned()));
        }
        if let Some(code) = s.strip_prefix("iso_639_1_") {
            return Ok(LanguageTag::Iso6391(code.to_owned()));
        }
        Err(LanguageTagParseError(s.to_owned()))
    }
}

/// A `_title`/`_definition`/... field: a mapping from language-tag key to
/// string. `BTreeMap` keeps serialization order deterministic, which matters
/// for report hashing and for test fixtures.
pub type LocalizedText = BTreeMap<String, String>;

/// Select the best match for `tag` out of a localized mapping, following the
/// fallback chain of §6.2: requested tag, then "any language", then the
/// configured default tag. Returns `None` only if none of the three keys are
/// present in `text`.
pub fn select<'a>(text: &'a LocalizedText, tag: &LanguageTag, default_tag: &LanguageTag) -> Option<&'a str> {
    if let Some(key) = tag.mapping_key() {
        if let Some(value) = text.get(&key) {
            return Some(value.as_str());
        }
    }
    if let Some(value) = text.get(ANY_LANGUAGE_KEY) {
        return Some(value.as_str());
    }
    if let Some(key) = default_tag.mapping_key() {
        if let Some(value) = text.get(&key) {
            return Some(value.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_four_forms() {
        assert_eq!("iso_639_3_eng".parse::<LanguageTag>().unwrap(), LanguageTag::Iso6393("eng".into()));
        assert_eq!("iso_639_1_en".parse::<LanguageTag>().unwrap(), LanguageTag::Iso6391("en".into()));
        assert_eq!("iso_639_3_@".parse::<LanguageTag>().unwrap(), LanguageTag::Any);
        assert_eq!("all".parse::<LanguageTag>().unwrap(), LanguageTag::All);
        assert!("bogus".parse::<LanguageTag>().is_err());
    }

    #[test]
    fn select_falls_back_to_any_language_then_default() {
        let mut text = LocalizedText::new();
        text.insert(ANY_LANGUAGE_KEY.to_owned(), "generic".to_owned());
        let requested = LanguageTag::Iso6393("fra".into());
        let default = LanguageTag::Iso6393("eng".into());
        assert_eq!(select(&text, &requested, &default), Some("generic"));

        text.insert("iso_639_3_eng".to_owned(), "Test term".to_owned());
        text.remove(ANY_LANGUAGE_KEY);
        assert_eq!(select(&text, &requested, &default), Some("Test term"));
    }
}
