//! Compiled pattern representation.
//!
//! Each top-level pattern in the query source compiles to a [`Pattern`]: a
//! tree of [`PatternStep`]s mirroring the node shape to match, plus the raw
//! predicates attached to it. Symbol and field names are resolved against the
//! language at compile time, so execution compares ids only.

use stolyar_core::{FieldId, SymbolId};

/// What a step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepKind {
    /// `_` — any node, named or not.
    Any,
    /// `(_)` — any named node.
    AnyNamed,
    /// A concrete node kind, named (`(number)`) or anonymous (`"+"`).
    Symbol(SymbolId),
}

#[derive(Debug, Clone)]
pub(crate) struct PatternStep {
    pub kind: StepKind,
    /// Capture indexes bound to the matched node, in source order.
    pub captures: Vec<u32>,
    /// Fields the matched node must not have a child for.
    pub negated_fields: Vec<FieldId>,
    pub children: Vec<ChildPattern>,
}

impl PatternStep {
    pub fn new(kind: StepKind) -> PatternStep {
        PatternStep {
            kind,
            captures: Vec::new(),
            negated_fields: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// One child position inside a node pattern.
#[derive(Debug, Clone)]
pub(crate) struct ChildPattern {
    /// Required field on the matched child.
    pub field: Option<FieldId>,
    /// `.` before this pattern: no named sibling between it and the previous
    /// match (or the parent's start).
    pub anchored_before: bool,
    /// `.` after this pattern as the last item: no named sibling after it.
    pub anchored_after: bool,
    pub step: PatternStep,
}

/// One top-level pattern with its predicates.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub root: PatternStep,
    pub predicates: Vec<QueryPredicate>,
}

/// One argument of a predicate: a capture reference or a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPredicateStep {
    /// Index into the query's capture names.
    Capture(u32),
    Literal(String),
}

/// A `(#operator ...)` predicate, surfaced raw for the caller to evaluate.
///
/// The engine never interprets predicates itself: their semantics are
/// caller-extensible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPredicate {
    /// Operator without the leading `#`, e.g. `"eq?"`.
    pub operator: String,
    pub args: Vec<QueryPredicateStep>,
}
