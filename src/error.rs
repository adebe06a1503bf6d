//! The error taxonomy shared by every component. Store-level failures and
//! validator-level failures are deliberately kept as separate enums (see
//! `StoreError`) and folded into `DictionaryError` at the boundary, mirroring
//! how a transport layer would want one exhaustive type to match on.

use crate::term::TermHandle;

pub type Result<T> = std::result::Result<T, DictionaryError>;

/// Errors raised by the abstract document/graph store (§6.1). `NotFound` is
/// not itself an application error — callers treat a missing edge as a
/// normal "absent" signal — but it is still a distinct store-level outcome
/// from `Conflict`, which triggers the retry loop in the graph engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(String),
    #[error("document {0} already exists")]
    Duplicate(String),
    #[error("optimistic concurrency conflict on {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The taxonomy of §7. Variant names are semantic, not bound to any
/// particular transport's status codes.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("invalid reference: {handle} does not resolve to an existing document")]
    InvalidReference { handle: String },

    #[error("parent {parent} is not reachable from root {root}")]
    ParentNotInGraph { root: String, parent: String },

    #[error("{handle} is not a descriptor term")]
    NotDescriptor { handle: String },

    #[error("expected a {expected} at {path}, found a different shape")]
    KindMismatch { path: String, expected: &'static str },

    #[error("value at {path} does not match declared type {expected}")]
    TypeMismatch { path: String, expected: String },

    #[error("value at {path} is outside of the allowed range")]
    RangeViolation { path: String },

    #[error("value at {path} does not match the required pattern")]
    PatternMismatch { path: String },

    #[error("value at {path} is not in the declared format")]
    FormatError { path: String },

    #[error("value at {path} carries an unexpected unit")]
    UnitMismatch { path: String },

    #[error("value at {path} is not a member of enumeration {root}")]
    EnumNotMember { path: String, root: String },

    #[error("value at {path} resolved to {count} candidate terms, expected exactly one")]
    AmbiguousResolution { path: String, count: usize },

    #[error("property {property} at {path} has no matching descriptor term")]
    UnknownProperty { path: String, property: String },

    #[error("malformed data definition at {path}: {reason}")]
    DefinitionError { path: String, reason: String },

    #[error("insert of {handle} would collide with an existing document")]
    DuplicateKey { handle: String },

    #[error("write conflict on {handle} persisted past the retry budget")]
    WriteConflict { handle: String },

    #[error("traversal from {from} exceeded the configured depth limit of {limit}")]
    DepthExceeded { from: String, limit: usize },

    /// Never constructed by this crate; declared so that a caller matching
    /// on `DictionaryError` exhaustively can still fold in the session
    /// layer's own errors without a second enum.
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DictionaryError {
    pub fn invalid_reference(handle: impl Into<String>) -> Self {
        Self::InvalidReference { handle: handle.into() }
    }

    pub fn parent_not_in_graph(root: &TermHandle, parent: &TermHandle) -> Self {
        Self::ParentNotInGraph {
            root: root.to_string(),
            parent: parent.to_string(),
        }
    }

    /// Stable string code for this error, for callers that need to render a
    /// wire-level error code without matching on every variant themselves.
    pub fn code(&self) -> &'static str {
        use DictionaryError::*;
        match self {
            InvalidReference { .. } => "INVALID_REFERENCE",
            ParentNotInGraph { .. } => "PARENT_NOT_IN_GRAPH",
            NotDescriptor { .. } => "NOT_DESCRIPTOR",
            KindMismatch { .. } => "KIND_MISMATCH",
            TypeMismatch { .. } => "TYPE_MISMATCH",
            RangeViolation { .. } => "RANGE_VIOLATION",
            PatternMismatch { .. } => "PATTERN_MISMATCH",
            FormatError { .. } => "FORMAT_ERROR",
            UnitMismatch { .. } => "UNIT_MISMATCH",
            EnumNotMember { .. } => "ENUM_NOT_MEMBER",
            AmbiguousResolution { .. } => "AMBIGUOUS_RESOLUTION",
            UnknownProperty { .. } => "UNKNOWN_PROPERTY",
            DefinitionError { .. } => "DEFINITION_ERROR",
            DuplicateKey { .. } => "DUPLICATE_KEY",
            WriteConflict { .. } => "WRITE_CONFLICT",
            DepthExceeded { .. } => "DEPTH_EXCEEDED",
            Unauthorized => "UNAUTHORIZED",
            Forbidden => "FORBIDDEN",
            Store(_) => "STORE_ERROR",
        }
    }
}
