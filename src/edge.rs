//! The edge document (§3.4) and its deterministic key derivation (§4.2).

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::predicate::Predicate;
use crate::term::TermHandle;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::From, derive_more::Into)]
pub struct EdgeKey(pub String);

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `hash = sha256(src || 0x00 || pred || 0x00 || dst)`, hex-encoded (§4.2).
/// Pure function of the triple: concurrent callers computing the key for
/// the same `(src, pred, dst)` always agree.
pub fn edge_key(src: &TermHandle, predicate: Predicate, dst: &TermHandle) -> EdgeKey {
    let mut hasher = Sha256::new();
    hasher.update(src.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(predicate.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(dst.as_str().as_bytes());
    EdgeKey(hex::encode(hasher.finalize()))
}



/// Path-data blob attached to an edge (§3.4 `_data`), an arbitrary JSON
/// object merged per the recursive rules of §4.3.1.
pub type PathData = serde_json::Map<String, serde_json::Value>;

/// An edge document. `_path` is kept sorted for deterministic equality and
/// cheap duplicate checks (§9's design note); `_path` is never empty while
/// the edge exists (§3.4, §4.3.5) — emptying it is the same code path as
/// deleting the document, never an intermediate state a reader can observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "_from")]
    pub from: TermHandle,
    #[serde(rename = "_to")]
    pub to: TermHandle,
    #[serde(rename = "_predicate")]
    pub predicate: Predicate,
    #[serde(rename = "_path")]
    pub path: Vec<TermHandle>,
    #[serde(rename = "_data", default)]
    pub data: PathData,
}

impl Edge {
    pub fn key(&self) -> EdgeKey {
        edge_key(&self.from, self.predicate, &self.to)
    }

    pub fn contains_root(&self, root: &TermHandle) -> bool {
        self.path.contains(root)
    }

    /// Insert `root` into the path set, preserving sorted-and-deduplicated
    /// order. Returns whether the set actually changed.
    pub fn add_root(&mut self, root: &TermHandle) -> bool {
        if self.path.contains(root) {
            return false;
        }
        let idx = self.path.partition_point(|h| h < root);
        self.path.insert(idx, root.clone());
        true
    }

    /// Remove `root` from the path set. Returns whether it was present.
    pub fn remove_root(&mut self, root: &TermHandle) -> bool {
        if let Some(idx) = self.path.iter().position(|h| h == root) {
            self.path.remove(idx);
            true
        } else {
            false
        }
    }

    pub fn is_empty_path(&self) -> bool {
        self.path.is_empty()
    }

    pub fn path_set(&self) -> IndexSet<TermHandle> {
        self.path.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_is_deterministic() {
        let src = TermHandle::from("a");
        let dst = TermHandle::from("b");
        let k1 = edge_key(&src, Predicate::EnumOf, &dst);
        let k2 = edge_key(&src, Predicate::EnumOf, &dst);
        assert_eq!(k1, k2);
    }

    #[test]
    fn edge_key_distinguishes_predicate() {
        let src = TermHandle::from("a");
        let dst = TermHandle::from("b");
        let k1 = edge_key(&src, Predicate::EnumOf, &dst);
        let k2 = edge_key(&src, Predicate::SectionOf, &dst);
        assert_ne!(k1, k2);
    }

    #[test]
    fn add_root_keeps_sorted_order_and_is_idempotent() {
        let mut edge = Edge {
            from: TermHandle::from("a"),
            to: TermHandle::from("b"),
            predicate: Predicate::EnumOf,
            path: vec![TermHandle::from("m")],
            data: Default::default(),
        };
        assert!(edge.add_root(&TermHandle::from("z")));
        assert!(edge.add_root(&TermHandle::from("a")));
        assert!(!edge.add_root(&TermHandle::from("a")));
        assert_eq!(edge.path, vec![TermHandle::from("a"), TermHandle::from("m"), TermHandle::from("z")]);
    }
}
