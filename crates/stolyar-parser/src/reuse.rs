//! Incremental machinery: edit application, token reuse and change
//! reporting.

use std::sync::Arc;

use stolyar_core::{InputEdit, Length, Point, Range};

use crate::subtree::{ChildSlot, Subtree, SubtreeData, assemble};
use crate::tree::Tree;

/// Path-copy `root` for a source edit.
///
/// Nodes outside the edited region are shared untouched; their absolute
/// positions shift implicitly because extents are relative. Nodes overlapping
/// the region are copied with adjusted extents and `has_changes` set, which
/// bars them from reuse in the next parse.
pub(crate) fn apply_edit(
    root: &Subtree,
    start_point: Point,
    start_byte: u32,
    edit: &InputEdit,
) -> Subtree {
    // The inserted text is charged to exactly one leaf: the first affected
    // one in document order.
    let mut insertion_claimed = false;
    edit_subtree(root, start_byte, start_point, edit, &mut insertion_claimed)
}

fn edit_subtree(
    subtree: &Subtree,
    start_byte: u32,
    start_point: Point,
    edit: &InputEdit,
    insertion_claimed: &mut bool,
) -> Subtree {
    let end_byte = start_byte + subtree.total().bytes;
    let affected = if edit.start_byte == edit.old_end_byte {
        // A pure insertion at a node boundary touches both neighbors.
        start_byte <= edit.start_byte && edit.start_byte <= end_byte
    } else {
        start_byte < edit.old_end_byte && end_byte > edit.start_byte
    };
    if !affected {
        return Arc::clone(subtree);
    }

    if subtree.children.is_empty() {
        let (padding, size) =
            edited_leaf_extents(subtree, start_byte, start_point, edit, insertion_claimed);
        return Arc::new(SubtreeData {
            id: subtree.id,
            symbol: subtree.symbol,
            padding,
            size,
            children: Vec::new(),
            named: subtree.named,
            extra: subtree.extra,
            hidden: subtree.hidden,
            missing: subtree.missing,
            is_error: subtree.is_error,
            has_error: subtree.has_error,
            has_changes: true,
        });
    }

    let mut children = Vec::with_capacity(subtree.children.len());
    let mut byte = start_byte;
    let mut point = start_point;
    let mut has_error = false;
    for slot in &subtree.children {
        let child = edit_subtree(&slot.subtree, byte, point, edit, insertion_claimed);
        // Traversal positions stay in pre-edit coordinates.
        byte += slot.subtree.total().bytes;
        point = point.advanced_by(slot.subtree.total());
        has_error |= child.has_error;
        children.push(ChildSlot {
            field: slot.field,
            subtree: child,
        });
    }
    let (padding, size) = assemble(&children);
    Arc::new(SubtreeData {
        id: subtree.id,
        symbol: subtree.symbol,
        padding,
        size,
        children,
        named: subtree.named,
        extra: subtree.extra,
        hidden: subtree.hidden,
        missing: subtree.missing,
        is_error: subtree.is_error,
        has_error,
        has_changes: true,
    })
}

/// New padding and size of an edited leaf. The gap and the token text are
/// adjusted independently.
fn edited_leaf_extents(
    leaf: &SubtreeData,
    offset_byte: u32,
    offset_point: Point,
    edit: &InputEdit,
    insertion_claimed: &mut bool,
) -> (Length, Length) {
    let visible_byte = offset_byte + leaf.padding.bytes;
    let visible_point = offset_point.advanced_by(leaf.padding);
    let padding = edited_span(offset_byte, offset_point, leaf.padding, edit, insertion_claimed);
    let size = edited_span(visible_byte, visible_point, leaf.size, edit, insertion_claimed);
    (padding, size)
}

/// New extent of an edited span: the part before the edit, plus the inserted
/// text if this span is the first affected one, plus the part after the old
/// edit end. Zero-width spans never absorb anything.
fn edited_span(
    start_byte: u32,
    start_point: Point,
    len: Length,
    edit: &InputEdit,
    insertion_claimed: &mut bool,
) -> Length {
    if len.bytes == 0 {
        return len;
    }
    let end_byte = start_byte + len.bytes;
    let end_point = start_point.advanced_by(len);
    let affected = if edit.start_byte == edit.old_end_byte {
        start_byte <= edit.start_byte && edit.start_byte <= end_byte
    } else {
        start_byte < edit.old_end_byte && end_byte > edit.start_byte
    };
    if !affected {
        return len;
    }

    let prefix = if edit.start_byte > start_byte {
        Length::new(
            edit.start_byte - start_byte,
            extent_between(start_point, edit.start_point),
        )
    } else {
        Length::ZERO
    };
    let inserted = if !*insertion_claimed {
        *insertion_claimed = true;
        Length::new(
            edit.new_end_byte - edit.start_byte,
            extent_between(edit.start_point, edit.new_end_point),
        )
    } else {
        Length::ZERO
    };
    let suffix = if end_byte > edit.old_end_byte {
        Length::new(
            end_byte - edit.old_end_byte,
            extent_between(edit.old_end_point, end_point),
        )
    } else {
        Length::ZERO
    };
    prefix + inserted + suffix
}

/// Relative extent from `a` to `b`, with `a <= b`.
pub(crate) fn extent_between(a: Point, b: Point) -> Point {
    if b.row == a.row {
        Point::new(0, b.column.saturating_sub(a.column))
    } else {
        Point::new(b.row.saturating_sub(a.row), b.column)
    }
}

/// Translate an included range across an edit.
pub(crate) fn shift_range(range: &mut Range, edit: &InputEdit) {
    range.start_byte = shift_byte(range.start_byte, edit);
    range.end_byte = shift_byte(range.end_byte, edit);
    range.start_point = shift_point(range.start_point, edit);
    range.end_point = shift_point(range.end_point, edit);
}

fn shift_byte(byte: u32, edit: &InputEdit) -> u32 {
    if byte <= edit.start_byte {
        byte
    } else if byte >= edit.old_end_byte {
        (byte as i64 + edit.byte_delta()) as u32
    } else {
        edit.new_end_byte
    }
}

fn shift_point(point: Point, edit: &InputEdit) -> Point {
    if point <= edit.start_point {
        point
    } else if point >= edit.old_end_point {
        if point.row == edit.old_end_point.row {
            Point::new(
                edit.new_end_point.row,
                edit.new_end_point.column + (point.column - edit.old_end_point.column),
            )
        } else {
            Point::new(
                point.row + edit.new_end_point.row - edit.old_end_point.row,
                point.column,
            )
        }
    } else {
        edit.new_end_point
    }
}

/// Ranges where `new` structurally differs from `old`, in `new` coordinates.
///
/// Subtrees shared between the two trees (the reused ones) are identical by
/// construction and are skipped without descending. Where structure diverges
/// the whole new span is reported; overlapping and adjacent reports merge.
pub(crate) fn changed_ranges(old: &Subtree, new: &Subtree) -> Vec<Range> {
    let mut out = Vec::new();
    diff_subtrees(old, new, 0, Point::ZERO, &mut out);
    merge_ranges(&mut out);
    out
}

fn diff_subtrees(old: &Subtree, new: &Subtree, byte: u32, point: Point, out: &mut Vec<Range>) {
    if Arc::ptr_eq(old, new) {
        return;
    }
    let comparable = old.symbol == new.symbol
        && old.children.len() == new.children.len()
        && !new.children.is_empty();
    if !comparable {
        out.push(Range::new(
            byte + new.padding.bytes,
            byte + new.total().bytes,
            point.advanced_by(new.padding),
            point.advanced_by(new.total()),
        ));
        return;
    }
    let mut b = byte;
    let mut p = point;
    for (o, n) in old.children.iter().zip(&new.children) {
        diff_subtrees(&o.subtree, &n.subtree, b, p, out);
        b += n.subtree.total().bytes;
        p = p.advanced_by(n.subtree.total());
    }
}

fn merge_ranges(ranges: &mut Vec<Range>) {
    ranges.sort_by_key(|r| (r.start_byte, r.end_byte));
    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        match merged.last_mut() {
            Some(last) if r.start_byte <= last.end_byte => {
                if r.end_byte > last.end_byte {
                    last.end_byte = r.end_byte;
                    last.end_point = r.end_point;
                }
            }
            _ => merged.push(r),
        }
    }
    *ranges = merged;
}

#[derive(Debug)]
struct ReuseEntry {
    subtree: Subtree,
    /// Index of this node within its parent's children. Zero for the root.
    index: usize,
    start_byte: u32,
}

/// Preorder walk over the edited previous tree, yielding the unchanged
/// tokens the parser may feed into the new parse in place of lexing.
#[derive(Debug)]
pub(crate) struct ReuseCursor {
    stack: Vec<ReuseEntry>,
}

impl ReuseCursor {
    pub fn new(tree: &Tree) -> ReuseCursor {
        ReuseCursor {
            stack: vec![ReuseEntry {
                subtree: Arc::clone(tree.root_subtree()),
                index: 0,
                start_byte: 0,
            }],
        }
    }

    fn current(&self) -> Option<&ReuseEntry> {
        self.stack.last()
    }

    /// Step into the current node's first child. False at a leaf.
    fn descend(&mut self) -> bool {
        let Some(top) = self.stack.last() else {
            return false;
        };
        let Some(slot) = top.subtree.children.first() else {
            return false;
        };
        let entry = ReuseEntry {
            subtree: Arc::clone(&slot.subtree),
            index: 0,
            start_byte: top.start_byte,
        };
        self.stack.push(entry);
        true
    }

    /// Step past the current node without visiting its children.
    fn advance_past(&mut self) {
        while let Some(done) = self.stack.pop() {
            let Some(parent) = self.stack.last() else {
                return;
            };
            let next_index = done.index + 1;
            if let Some(slot) = parent.subtree.children.get(next_index) {
                self.stack.push(ReuseEntry {
                    subtree: Arc::clone(&slot.subtree),
                    index: next_index,
                    start_byte: done.start_byte + done.subtree.total().bytes,
                });
                return;
            }
        }
    }

    /// The reusable token starting exactly at `byte`, if any.
    ///
    /// Nodes behind `byte` are skipped; nodes overlapping it are broken down
    /// into their children. `accept` decides whether a candidate may stand in
    /// for a lexed token; on refusal the candidate is broken down as well.
    /// Changed or erroneous nodes never qualify.
    pub fn reusable_at(
        &mut self,
        byte: u32,
        mut accept: impl FnMut(&Subtree) -> bool,
    ) -> Option<Subtree> {
        loop {
            let entry = self.current()?;
            let start = entry.start_byte;
            let end = start + entry.subtree.total().bytes;
            if end <= byte {
                self.advance_past();
                continue;
            }
            if start > byte {
                return None;
            }
            if start < byte {
                if !self.descend() {
                    self.advance_past();
                }
                continue;
            }
            let subtree = &entry.subtree;
            let blocked = subtree.has_changes
                || subtree.has_error
                || subtree.total().bytes == 0
                || !accept(subtree);
            if blocked {
                if !self.descend() {
                    self.advance_past();
                }
                continue;
            }
            let reused = Arc::clone(subtree);
            self.advance_past();
            return Some(reused);
        }
    }
}
