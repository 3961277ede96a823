//! Stateful tree traversal.

use stolyar_core::{FieldId, Point};

use crate::node::{Node, child_offsets};
use crate::subtree::SubtreeData;
use crate::tree::Tree;

/// Seeking a child at an offset the current node does not cover.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("no child at the requested offset")]
    NoChild,
}

#[derive(Debug, Clone, Copy)]
struct Entry<'t> {
    subtree: &'t SubtreeData,
    /// Index of this node within its parent's children. Zero for the root.
    index: usize,
    /// Footprint start (before the node's padding).
    offset_byte: u32,
    offset_point: Point,
    field: Option<FieldId>,
}

/// A cursor over a [`Tree`].
///
/// The cursor keeps the path from the root to the current node, so every
/// move is O(1) or O(depth) without re-deriving parents by search. Cloning a
/// cursor yields an independent cursor at the same position.
#[derive(Debug, Clone)]
pub struct TreeCursor<'t> {
    tree: &'t Tree,
    /// Path from the root (index 0) to the current node. Never empty.
    stack: Vec<Entry<'t>>,
}

impl<'t> TreeCursor<'t> {
    pub(crate) fn new(tree: &'t Tree) -> TreeCursor<'t> {
        TreeCursor {
            tree,
            stack: vec![Entry {
                subtree: tree.root_subtree(),
                index: 0,
                offset_byte: 0,
                offset_point: Point::ZERO,
                field: None,
            }],
        }
    }

    fn top(&self) -> &Entry<'t> {
        self.stack.last().expect("cursor stack is never empty")
    }

    fn top_mut(&mut self) -> &mut Entry<'t> {
        self.stack.last_mut().expect("cursor stack is never empty")
    }

    /// The node the cursor currently points at.
    pub fn node(&self) -> Node<'t> {
        let e = self.top();
        Node::new(self.tree, e.subtree, e.offset_byte, e.offset_point, e.field)
    }

    /// The field of the current node within its parent, if any.
    pub fn field_id(&self) -> Option<FieldId> {
        self.top().field
    }

    pub fn field_name(&self) -> Option<&'t str> {
        self.tree.language().field_name(self.field_id()?)
    }

    /// Distance from the root: zero at the root.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Move the cursor back to the root.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
    }

    pub fn goto_first_child(&mut self) -> bool {
        let e = *self.top();
        let Some(slot) = e.subtree.children.first() else {
            return false;
        };
        self.stack.push(Entry {
            subtree: &slot.subtree,
            index: 0,
            offset_byte: e.offset_byte,
            offset_point: e.offset_point,
            field: slot.field,
        });
        true
    }

    pub fn goto_last_child(&mut self) -> bool {
        let e = *self.top();
        if e.subtree.children.is_empty() {
            return false;
        }
        let offsets = child_offsets(e.subtree, e.offset_byte, e.offset_point);
        let index = e.subtree.children.len() - 1;
        let slot = &e.subtree.children[index];
        self.stack.push(Entry {
            subtree: &slot.subtree,
            index,
            offset_byte: offsets[index].0,
            offset_point: offsets[index].1,
            field: slot.field,
        });
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() == 1 {
            return false;
        }
        self.stack.pop();
        true
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.stack.len() == 1 {
            return false;
        }
        let e = *self.top();
        let parent = self.stack[self.stack.len() - 2];
        let Some(slot) = parent.subtree.children.get(e.index + 1) else {
            return false;
        };
        *self.top_mut() = Entry {
            subtree: &slot.subtree,
            index: e.index + 1,
            offset_byte: e.offset_byte + e.subtree.total().bytes,
            offset_point: e.offset_point.advanced_by(e.subtree.total()),
            field: slot.field,
        };
        true
    }

    pub fn goto_previous_sibling(&mut self) -> bool {
        if self.stack.len() == 1 {
            return false;
        }
        let e = *self.top();
        if e.index == 0 {
            return false;
        }
        let parent = self.stack[self.stack.len() - 2];
        let offsets = child_offsets(parent.subtree, parent.offset_byte, parent.offset_point);
        let index = e.index - 1;
        let slot = &parent.subtree.children[index];
        *self.top_mut() = Entry {
            subtree: &slot.subtree,
            index,
            offset_byte: offsets[index].0,
            offset_point: offsets[index].1,
            field: slot.field,
        };
        true
    }

    /// Descend to the first child whose end is after `byte`, returning its
    /// index. Fails when the current node has no child past that byte.
    pub fn goto_first_child_for_byte(&mut self, byte: u32) -> Result<usize, CursorError> {
        let e = *self.top();
        let offsets = child_offsets(e.subtree, e.offset_byte, e.offset_point);
        // Child ends are monotone, so the first end past `byte` is found by
        // binary search over the offsets.
        let index = offsets
            .iter()
            .zip(&e.subtree.children)
            .collect::<Vec<_>>()
            .partition_point(|((start, _), slot)| start + slot.subtree.total().bytes <= byte);
        self.descend_to(index, &offsets)
    }

    /// Point-addressed variant of
    /// [`goto_first_child_for_byte`](TreeCursor::goto_first_child_for_byte).
    pub fn goto_first_child_for_point(&mut self, point: Point) -> Result<usize, CursorError> {
        let e = *self.top();
        let offsets = child_offsets(e.subtree, e.offset_byte, e.offset_point);
        let index = offsets
            .iter()
            .zip(&e.subtree.children)
            .collect::<Vec<_>>()
            .partition_point(|((_, start), slot)| start.advanced_by(slot.subtree.total()) <= point);
        self.descend_to(index, &offsets)
    }

    fn descend_to(&mut self, index: usize, offsets: &[(u32, Point)]) -> Result<usize, CursorError> {
        let e = *self.top();
        let slot = e.subtree.children.get(index).ok_or(CursorError::NoChild)?;
        self.stack.push(Entry {
            subtree: &slot.subtree,
            index,
            offset_byte: offsets[index].0,
            offset_point: offsets[index].1,
            field: slot.field,
        });
        Ok(index)
    }
}
