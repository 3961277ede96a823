//! Immutable, reference-counted subtrees.
//!
//! Subtrees store *relative* extents ([`Length`]) rather than absolute
//! positions, so an edited or reparsed tree can share unchanged subtrees with
//! its predecessor wholesale. Absolute positions are recomputed during
//! descent by [`Node`](crate::Node) and [`TreeCursor`](crate::TreeCursor).
//!
//! Each subtree carries a `padding` ahead of its visible content: the bytes
//! the lexer skipped to reach it, which is only non-zero at the boundaries of
//! included ranges. An internal node's padding equals its first child's, and
//! its size runs from there to the end of its last child, interior gaps
//! included.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use stolyar_core::{FieldId, Length, SymbolId};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a node identity. Ids are process-unique and monotonic; a reused
/// subtree keeps its id across reparses, a rebuilt one gets a fresh id.
pub(crate) fn fresh_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) type Subtree = Arc<SubtreeData>;

/// A child position within its parent: the subtree plus the grammar field
/// the enclosing production assigned to it, if any.
#[derive(Debug, Clone)]
pub(crate) struct ChildSlot {
    pub field: Option<FieldId>,
    pub subtree: Subtree,
}

#[derive(Debug)]
pub(crate) struct SubtreeData {
    pub id: u64,
    pub symbol: SymbolId,
    /// Skipped gap before the node's visible content.
    pub padding: Length,
    /// Visible extent, children (and interior gaps) included.
    pub size: Length,
    pub children: Vec<ChildSlot>,
    pub named: bool,
    pub extra: bool,
    /// Hidden rule node: spliced into its parent when a reduction consumes it.
    pub hidden: bool,
    /// Zero-width leaf inserted by error recovery.
    pub missing: bool,
    /// ERROR node, or a garbage leaf the lexer could not tokenize.
    pub is_error: bool,
    /// True when this node or any descendant is an error or missing node.
    pub has_error: bool,
    /// Set by [`Tree::edit`](crate::Tree::edit) on every node whose extent
    /// was touched; bars the node from incremental reuse.
    pub has_changes: bool,
}

impl SubtreeData {
    /// Full footprint: padding plus visible size.
    pub fn total(&self) -> Length {
        self.padding + self.size
    }

    pub fn leaf(
        symbol: SymbolId,
        padding: Length,
        size: Length,
        named: bool,
        extra: bool,
    ) -> Subtree {
        Arc::new(SubtreeData {
            id: fresh_id(),
            symbol,
            padding,
            size,
            children: Vec::new(),
            named,
            extra,
            hidden: false,
            missing: false,
            is_error: false,
            has_error: false,
            has_changes: false,
        })
    }

    /// Zero-width placeholder for a terminal the input is missing.
    pub fn missing_leaf(symbol: SymbolId) -> Subtree {
        Arc::new(SubtreeData {
            id: fresh_id(),
            symbol,
            padding: Length::ZERO,
            size: Length::ZERO,
            children: Vec::new(),
            named: true,
            extra: false,
            hidden: false,
            missing: true,
            is_error: true,
            has_error: true,
            has_changes: false,
        })
    }

    /// A leaf covering bytes the lexer could not tokenize. Unnamed, so it
    /// stays out of S-expressions; its enclosing ERROR node is the visible
    /// marker.
    pub fn garbage_leaf(error_symbol: SymbolId, padding: Length, size: Length) -> Subtree {
        Arc::new(SubtreeData {
            id: fresh_id(),
            symbol: error_symbol,
            padding,
            size,
            children: Vec::new(),
            named: false,
            extra: false,
            hidden: false,
            missing: false,
            is_error: true,
            has_error: true,
            has_changes: false,
        })
    }

    pub fn internal(
        symbol: SymbolId,
        children: Vec<ChildSlot>,
        named: bool,
        hidden: bool,
    ) -> Subtree {
        let (padding, size) = assemble(&children);
        let has_error = children.iter().any(|c| c.subtree.has_error);
        Arc::new(SubtreeData {
            id: fresh_id(),
            symbol,
            padding,
            size,
            children,
            named,
            extra: false,
            hidden,
            missing: false,
            is_error: false,
            has_error,
            has_changes: false,
        })
    }

    /// An ERROR node wrapping tokens skipped during recovery.
    pub fn error_node(error_symbol: SymbolId, children: Vec<ChildSlot>) -> Subtree {
        let (padding, size) = assemble(&children);
        Arc::new(SubtreeData {
            id: fresh_id(),
            symbol: error_symbol,
            padding,
            size,
            children,
            named: true,
            extra: false,
            hidden: false,
            missing: false,
            is_error: true,
            has_error: true,
            has_changes: false,
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Dropping a tree must not recurse once per level: expression grammars
/// nest linearly in the input, so a recursive drop overflows the stack on
/// large documents. Children are detached into a worklist instead; subtrees
/// still shared with another tree are left to their remaining owners.
impl Drop for SubtreeData {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut worklist = std::mem::take(&mut self.children);
        while let Some(slot) = worklist.pop() {
            if let Ok(mut data) = Arc::try_unwrap(slot.subtree) {
                worklist.append(&mut data.children);
            }
        }
    }
}

/// Padding and size of a node assembled from `children`: the first child's
/// padding is hoisted, everything after it counts toward the size.
pub(crate) fn assemble(children: &[ChildSlot]) -> (Length, Length) {
    let Some((first, rest)) = children.split_first() else {
        return (Length::ZERO, Length::ZERO);
    };
    let mut size = first.subtree.size;
    for c in rest {
        size += c.subtree.total();
    }
    (first.subtree.padding, size)
}
