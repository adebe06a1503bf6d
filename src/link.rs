//! The link document (§3.5): a relationship resembling an edge but without
//! a path set, used for relationships that are global rather than
//! path-scoped (`property-of`, `required-indicator`, `required-metadata`).

use serde::{Deserialize, Serialize};

use crate::edge::{edge_key, EdgeKey, PathData};
use crate::predicate::Predicate;
use crate::term::TermHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "_from")]
    pub from: TermHandle,
    #[serde(rename = "_to")]
    pub to: TermHandle,
    #[serde(rename = "_predicate")]
    pub predicate: Predicate,
    #[serde(rename = "_data", default)]
    pub data: PathData,
}

impl Link {
    /// Links reuse the edge key derivation: it is a pure function of the
    /// triple and links are keyed by the same triple uniqueness rule.
    pub fn key(&self) -> EdgeKey {
        edge_key(&self.from, self.predicate, &self.to)
    }
}
