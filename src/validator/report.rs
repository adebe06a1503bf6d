//! The validation report (§4.5.4): a single status plus a map of recorded
//! resolutions, keyed by a hash of the value's position in the document.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::error::DictionaryError;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self { code: 0, message: "ok".to_owned() }
    }
}

/// A single resolved reference (§4.5.2 step 3, `string_enum`/`resolve`):
/// `original` is what the caller supplied, `resolved` is the canonical
/// `_gid` it was resolved to.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Change {
    pub field: String,
    pub original: serde_json::Value,
    pub resolved: serde_json::Value,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Report {
    pub status: Option<Status>,
    pub changes: IndexMap<String, Change>,
}

impl Report {
    pub fn finish(self) -> FinishedReport {
        FinishedReport { status: self.status.unwrap_or_else(Status::ok), changes: self.changes }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FinishedReport {
    pub status: Status,
    pub changes: IndexMap<String, Change>,
}

impl FinishedReport {
    pub fn is_success(&self) -> bool {
        self.status.code == 0
    }
}

/// Joins path segments with `.` for objects and `[n]` for array indices, the
/// addressing scheme named in §9 (a stable "where in the value" key).
#[derive(Debug, Clone, Default)]
pub struct ValuePath(Vec<String>);

impl ValuePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_field(&self, field: &str) -> Self {
        let mut next = self.0.clone();
        next.push(field.to_owned());
        Self(next)
    }

    pub fn push_index(&self, index: usize) -> Self {
        let mut next = self.0.clone();
        match next.last_mut() {
            Some(last) => last.push_str(&format!("[{index}]")),
            None => next.push(format!("[{index}]")),
        }
        Self(next)
    }

    pub fn render(&self) -> String {
        self.0.join(".")
    }

    /// Stable hash of the rendered path, used as the `changes` map key so
    /// the same concrete value appearing at two positions gets two entries.
    pub fn hash_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.render().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Collects the walk's outcome: the first validation error encountered (§7's
/// propagation policy — one status per report, not a list) and every
/// resolution `change` recorded along the way, regardless of where errors
/// occurred in sibling subtrees.
#[derive(Debug, Default)]
pub struct Collector {
    first_error: Option<DictionaryError>,
    pub changes: IndexMap<String, Change>,
}

impl Collector {
    pub fn record_error(&mut self, error: DictionaryError) {
        if self.first_error.is_none() {
            self.first_error = Some(error);
        }
    }

    pub fn record_change(&mut self, path: &ValuePath, original: serde_json::Value, resolved: serde_json::Value) {
        self.changes.insert(
            path.hash_key(),
            Change { field: path.render(), original, resolved },
        );
    }

    pub fn into_report(self) -> Report {
        let status = self.first_error.map(|e| Status { code: status_code(&e), message: e.to_string() });
        Report { status, changes: self.changes }
    }
}

/// Stable numeric codes for the §7 taxonomy. 0 is reserved for success and
/// never produced here.
pub fn status_code(error: &DictionaryError) -> i32 {
    use DictionaryError::*;
    match error {
        InvalidReference { .. } => 1,
        ParentNotInGraph { .. } => 2,
        NotDescriptor { .. } => 3,
        KindMismatch { .. } => 4,
        TypeMismatch { .. } => 5,
        RangeViolation { .. } => 6,
        PatternMismatch { .. } => 7,
        FormatError { .. } => 8,
        UnitMismatch { .. } => 9,
        EnumNotMember { .. } => 10,
        AmbiguousResolution { .. } => 11,
        UnknownProperty { .. } => 12,
        DefinitionError { .. } => 13,
        DuplicateKey { .. } => 14,
        WriteConflict { .. } => 15,
        DepthExceeded { .. } => 16,
        Unauthorized => 17,
        Forbidden => 18,
        Store(_) => 19,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_renders_field_and_index_segments() {
        let path = ValuePath::new().push_field("items").push_index(2).push_field("name");
        assert_eq!(path.render(), "items[2].name");
    }

    #[test]
    fn collector_keeps_first_error_only() {
        let mut collector = Collector::default();
        collector.record_error(DictionaryError::TypeMismatch { path: "a".into(), expected: "string".into() });
        collector.record_error(DictionaryError::TypeMismatch { path: "b".into(), expected: "integer".into() });
        let report = collector.into_report().finish();
        assert!(report.status.message.contains("a"));
    }

    #[test]
    fn empty_collector_reports_success() {
        let report = Collector::default().into_report().finish();
        assert!(report.is_success());
    }
}
