//! Query compilation and execution errors.

/// What went wrong, without the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Malformed pattern text (bad token, unbalanced parentheses,
    /// unterminated string).
    Syntax,
    /// A node kind the language does not define.
    NodeType,
    /// A field name the language does not define.
    Field,
    /// A predicate refers to a capture the pattern never binds.
    Capture,
    /// Structurally invalid pattern (empty node, stray anchor, predicate
    /// outside a pattern).
    Structure,
    /// The query was compiled for a different language than the tree.
    LanguageMismatch,
}

impl std::fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryErrorKind::Syntax => "syntax error",
            QueryErrorKind::NodeType => "unknown node type",
            QueryErrorKind::Field => "unknown field",
            QueryErrorKind::Capture => "undefined capture",
            QueryErrorKind::Structure => "malformed pattern structure",
            QueryErrorKind::LanguageMismatch => "language mismatch",
        };
        f.write_str(s)
    }
}

/// A query error with the byte offset into the pattern source where it was
/// detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at byte {offset}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub offset: u32,
}

impl QueryError {
    pub(crate) fn new(kind: QueryErrorKind, offset: u32) -> QueryError {
        QueryError { kind, offset }
    }
}
