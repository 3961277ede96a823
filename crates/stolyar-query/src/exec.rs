//! Query execution: a reusable cursor and lazy match iterators.

use std::collections::VecDeque;

use stolyar_core::{Language, Point};
use stolyar_parser::Node;
use tracing::trace;

use crate::error::{QueryError, QueryErrorKind};
use crate::pattern::{ChildPattern, PatternStep, StepKind};
use crate::query::Query;

/// Default match limit: effectively unlimited.
const NO_MATCH_LIMIT: u32 = u32::MAX;

/// Runs queries against trees.
///
/// A cursor carries the execution knobs (byte and point windows, match
/// limit, start depth) and is reused across runs; each run borrows it
/// mutably, so at most one iterator is live per cursor.
#[derive(Debug)]
pub struct QueryCursor {
    byte_range: Option<std::ops::Range<u32>>,
    point_range: Option<(Point, Point)>,
    match_limit: u32,
    max_start_depth: Option<u32>,
    exceeded: bool,
}

impl Default for QueryCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCursor {
    pub fn new() -> QueryCursor {
        QueryCursor {
            byte_range: None,
            point_range: None,
            match_limit: NO_MATCH_LIMIT,
            max_start_depth: None,
            exceeded: false,
        }
    }

    /// Only yield matches whose root node overlaps `range`.
    pub fn set_byte_range(&mut self, range: std::ops::Range<u32>) -> &mut Self {
        self.byte_range = Some(range);
        self
    }

    /// Only yield matches whose root node overlaps `[start, end)`.
    pub fn set_point_range(&mut self, start: Point, end: Point) -> &mut Self {
        self.point_range = Some((start, end));
        self
    }

    /// Stop after this many matches. When the limit cuts a run short,
    /// [`QueryCursor::did_exceed_match_limit`] reports it.
    pub fn set_match_limit(&mut self, limit: u32) -> &mut Self {
        self.match_limit = limit;
        self
    }

    /// Do not start matches below this depth (the run's root is depth 0).
    pub fn set_max_start_depth(&mut self, depth: Option<u32>) -> &mut Self {
        self.max_start_depth = depth;
        self
    }

    /// Whether the last run stopped early because of the match limit.
    pub fn did_exceed_match_limit(&self) -> bool {
        self.exceeded
    }

    /// Run `query` over `node` and its descendants. Matches come out
    /// lazily in document order of their root nodes.
    pub fn matches<'c, 'q, 't>(
        &'c mut self,
        query: &'q Query,
        node: Node<'t>,
    ) -> Result<QueryMatches<'c, 'q, 't>, QueryError> {
        if !Language::same(query.language(), node.language()) {
            return Err(QueryError::new(QueryErrorKind::LanguageMismatch, 0));
        }
        self.exceeded = false;
        Ok(QueryMatches {
            cursor: self,
            query,
            stack: vec![(node, 0)],
            pending: VecDeque::new(),
            next_id: 0,
            matched: 0,
        })
    }

    /// Like [`QueryCursor::matches`], but flattened to one item per
    /// capture, still ordered by the match's root node.
    pub fn captures<'c, 'q, 't>(
        &'c mut self,
        query: &'q Query,
        node: Node<'t>,
    ) -> Result<QueryCaptures<'c, 'q, 't>, QueryError> {
        Ok(QueryCaptures {
            matches: self.matches(query, node)?,
            current: None,
        })
    }

    fn admits<'t>(&self, node: &Node<'t>) -> bool {
        if let Some(range) = &self.byte_range
            && (node.end_byte() <= range.start || node.start_byte() >= range.end)
        {
            return false;
        }
        if let Some((start, end)) = &self.point_range
            && (node.end_position() <= *start || node.start_position() >= *end)
        {
            return false;
        }
        true
    }
}

/// One captured node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCapture<'t> {
    pub node: Node<'t>,
    /// Index into the query's capture names.
    pub index: u32,
}

/// One successful pattern match.
#[derive(Debug, Clone)]
pub struct QueryMatch<'t> {
    /// Sequence number within the run.
    pub id: u32,
    /// Which of the query's patterns matched.
    pub pattern_index: usize,
    /// Captured nodes, in pattern preorder.
    pub captures: Vec<QueryCapture<'t>>,
}

impl<'t> QueryMatch<'t> {
    pub fn nodes_for_capture_index(
        &self,
        index: u32,
    ) -> impl Iterator<Item = Node<'t>> + '_ {
        self.captures
            .iter()
            .filter(move |c| c.index == index)
            .map(|c| c.node)
    }
}

/// Lazy match iterator. Walks the tree in preorder and tries every
/// pattern at every admitted node; matching does not consume nodes, so
/// overlapping matches all surface.
pub struct QueryMatches<'c, 'q, 't> {
    cursor: &'c mut QueryCursor,
    query: &'q Query,
    /// Preorder walk stack: (node, depth).
    stack: Vec<(Node<'t>, u32)>,
    /// Matches found at the current node, ready to yield.
    pending: VecDeque<QueryMatch<'t>>,
    next_id: u32,
    matched: u32,
}

impl<'t> Iterator for QueryMatches<'_, '_, 't> {
    type Item = QueryMatch<'t>;

    fn next(&mut self) -> Option<QueryMatch<'t>> {
        loop {
            if let Some(found) = self.pending.pop_front() {
                if self.matched >= self.cursor.match_limit {
                    trace!(limit = self.cursor.match_limit, "match limit reached");
                    self.cursor.exceeded = true;
                    self.pending.clear();
                    self.stack.clear();
                    return None;
                }
                self.matched += 1;
                return Some(found);
            }

            let (node, depth) = self.stack.pop()?;
            if !self.cursor.admits(&node) {
                // Children never extend past the parent, so the whole
                // subtree is outside the window.
                continue;
            }

            for (pattern_index, pattern) in self.query.patterns().iter().enumerate() {
                let mut captures = Vec::new();
                if match_step(&pattern.root, node, &mut captures) {
                    self.pending.push_back(QueryMatch {
                        id: self.next_id,
                        pattern_index,
                        captures,
                    });
                    self.next_id += 1;
                }
            }

            if self.cursor.max_start_depth.is_none_or(|max| depth < max) {
                let children: Vec<Node<'t>> = node.children().collect();
                for child in children.into_iter().rev() {
                    self.stack.push((child, depth + 1));
                }
            }
        }
    }
}

/// Flattened capture iterator: one item per capture, paired with a clone
/// of the match it came from.
pub struct QueryCaptures<'c, 'q, 't> {
    matches: QueryMatches<'c, 'q, 't>,
    current: Option<(QueryMatch<'t>, usize)>,
}

impl<'t> Iterator for QueryCaptures<'_, '_, 't> {
    type Item = (QueryMatch<'t>, usize);

    fn next(&mut self) -> Option<(QueryMatch<'t>, usize)> {
        loop {
            if let Some((m, index)) = self.current.take() {
                if index < m.captures.len() {
                    self.current = Some((m.clone(), index + 1));
                    return Some((m, index));
                }
            }
            let m = self.matches.next()?;
            self.current = Some((m, 0));
        }
    }
}

/// Does `node` match `step`? Captures are appended on success and left
/// untouched on failure.
fn match_step<'t>(
    step: &PatternStep,
    node: Node<'t>,
    captures: &mut Vec<QueryCapture<'t>>,
) -> bool {
    let kind_ok = match step.kind {
        StepKind::Any => true,
        StepKind::AnyNamed => node.is_named(),
        StepKind::Symbol(symbol) => node.symbol() == symbol,
    };
    if !kind_ok {
        return false;
    }
    for field in &step.negated_fields {
        if node.child_by_field_id(*field).is_some() {
            return false;
        }
    }

    let mark = captures.len();
    for index in &step.captures {
        captures.push(QueryCapture {
            node,
            index: *index,
        });
    }
    if step.children.is_empty() {
        return true;
    }
    let children: Vec<Node<'t>> = node.children().collect();
    if match_children(&step.children, &children, 0, 0, captures) {
        true
    } else {
        captures.truncate(mark);
        false
    }
}

/// Backtracking subsequence match of `patterns[pi..]` against
/// `children[ci..]`. Child patterns bind in order but need not be
/// adjacent unless anchored; anchors forbid skipping named siblings.
fn match_children<'t>(
    patterns: &[ChildPattern],
    children: &[Node<'t>],
    pi: usize,
    ci: usize,
    captures: &mut Vec<QueryCapture<'t>>,
) -> bool {
    let Some(pattern) = patterns.get(pi) else {
        return true;
    };
    let mut seen_named = false;
    for (offset, child) in children[ci..].iter().enumerate() {
        if pattern.anchored_before && seen_named {
            return false;
        }
        let index = ci + offset;
        let field_ok = match pattern.field {
            Some(field) => child.field_id() == Some(field),
            None => true,
        };
        if field_ok {
            let mark = captures.len();
            if match_step(&pattern.step, *child, captures) {
                let after_ok = !pattern.anchored_after
                    || children[index + 1..].iter().all(|c| !c.is_named());
                if after_ok && match_children(patterns, children, pi + 1, index + 1, captures) {
                    return true;
                }
                captures.truncate(mark);
            }
        }
        if child.is_named() {
            seen_named = true;
        }
    }
    false
}
