//! Lightweight node views over a [`Tree`].

use std::fmt::Write as _;

use stolyar_core::{FieldId, Language, Point, Range, SymbolId};

use crate::subtree::SubtreeData;
use crate::tree::Tree;

/// A view of one node in a [`Tree`].
///
/// `Node` is a copyable handle: the subtree reference plus the absolute
/// position reconstructed during descent. Two nodes are equal when they have
/// the same identity and the same start byte, which holds across incremental
/// reparses for reused tokens.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    subtree: &'t SubtreeData,
    /// Where the subtree's footprint begins; the visible start follows the
    /// node's padding.
    offset_byte: u32,
    offset_point: Point,
    field: Option<FieldId>,
}

impl<'t> Node<'t> {
    pub(crate) fn root(tree: &'t Tree) -> Node<'t> {
        Node {
            tree,
            subtree: tree.root_subtree(),
            offset_byte: 0,
            offset_point: Point::ZERO,
            field: None,
        }
    }

    pub(crate) fn new(
        tree: &'t Tree,
        subtree: &'t SubtreeData,
        offset_byte: u32,
        offset_point: Point,
        field: Option<FieldId>,
    ) -> Node<'t> {
        Node {
            tree,
            subtree,
            offset_byte,
            offset_point,
            field,
        }
    }

    /// Stable identity. Preserved when a reparse reuses this subtree.
    pub fn id(&self) -> u64 {
        self.subtree.id
    }

    pub fn symbol(&self) -> SymbolId {
        self.subtree.symbol
    }

    /// The language of the tree this node belongs to.
    pub fn language(&self) -> &'t Language {
        self.tree.language()
    }

    /// The node's kind name, e.g. `"binary_expression"` or `"+"`.
    pub fn kind(&self) -> &'t str {
        self.tree.language().symbol_name(self.subtree.symbol)
    }

    pub fn is_named(&self) -> bool {
        self.subtree.named
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.extra
    }

    pub fn is_missing(&self) -> bool {
        self.subtree.missing
    }

    /// True for ERROR nodes themselves (not for nodes containing one).
    pub fn is_error(&self) -> bool {
        self.subtree.symbol == self.tree.language().error_symbol()
    }

    /// True when this node or any descendant is an ERROR or missing node.
    pub fn has_error(&self) -> bool {
        self.subtree.has_error
    }

    pub fn has_changes(&self) -> bool {
        self.subtree.has_changes
    }

    pub fn start_byte(&self) -> u32 {
        self.offset_byte + self.subtree.padding.bytes
    }

    pub fn end_byte(&self) -> u32 {
        self.offset_byte + self.subtree.total().bytes
    }

    pub fn start_position(&self) -> Point {
        self.offset_point.advanced_by(self.subtree.padding)
    }

    pub fn end_position(&self) -> Point {
        self.offset_point.advanced_by(self.subtree.total())
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte() as usize..self.end_byte() as usize
    }

    pub fn range(&self) -> Range {
        Range::new(
            self.start_byte(),
            self.end_byte(),
            self.start_position(),
            self.end_position(),
        )
    }

    /// The text this node spans. `source` must be the text the tree was
    /// parsed from.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.byte_range()]
    }

    /// The field name the parent's production assigned to this node.
    pub fn field_name(&self) -> Option<&'t str> {
        self.tree.language().field_name(self.field?)
    }

    pub fn field_id(&self) -> Option<FieldId> {
        self.field
    }

    pub fn child_count(&self) -> usize {
        self.subtree.children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.children().nth(index)
    }

    pub fn named_child_count(&self) -> usize {
        self.children().filter(|c| c.is_named()).count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'t>> {
        self.children().filter(|c| c.is_named()).nth(index)
    }

    pub fn children(&self) -> Children<'t> {
        Children {
            node: *self,
            index: 0,
            byte: self.offset_byte,
            point: self.offset_point,
        }
    }

    pub fn child_by_field_id(&self, field: FieldId) -> Option<Node<'t>> {
        self.children().find(|c| c.field == Some(field))
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'t>> {
        let field = self.tree.language().field_for_name(name)?;
        self.child_by_field_id(field)
    }

    /// The parent node, found by descending from the root. `None` for the
    /// root itself.
    pub fn parent(&self) -> Option<Node<'t>> {
        let root = Node::root(self.tree);
        if self.subtree.id == root.subtree.id {
            return None;
        }
        root.find_parent_of(self.subtree.id, self.start_byte(), self.end_byte())
    }

    fn find_parent_of(&self, id: u64, target_start: u32, target_end: u32) -> Option<Node<'t>> {
        for child in self.children() {
            if child.subtree.id == id && child.start_byte() == target_start {
                return Some(*self);
            }
            if child.start_byte() <= target_start
                && target_end <= child.end_byte()
                && !child.subtree.is_leaf()
                && let Some(found) = child.find_parent_of(id, target_start, target_end)
            {
                return Some(found);
            }
        }
        None
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let parent = self.parent()?;
        let index = parent
            .children()
            .position(|c| c.subtree.id == self.subtree.id)?;
        parent.child(index + 1)
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let parent = self.parent()?;
        let index = parent
            .children()
            .position(|c| c.subtree.id == self.subtree.id)?;
        index.checked_sub(1).and_then(|i| parent.child(i))
    }

    /// The smallest node spanning the byte range `[start, end)`.
    pub fn descendant_for_byte_range(&self, start: u32, end: u32) -> Option<Node<'t>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut current = *self;
        'descend: loop {
            for child in current.children() {
                if child.start_byte() <= start && end <= child.end_byte() {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Compact S-expression of the named structure, e.g.
    /// `(binary_expression left: (number) right: (number))`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        if self.is_missing() {
            let _ = write!(out, "(MISSING {})", self.kind());
            return;
        }
        let _ = write!(out, "({}", self.kind());
        for child in self.children() {
            if !child.is_named() {
                continue;
            }
            out.push(' ');
            if let Some(field) = child.field_name() {
                let _ = write!(out, "{field}: ");
            }
            child.write_sexp(out);
        }
        out.push(')');
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.subtree.id == other.subtree.id && self.start_byte() == other.start_byte()
    }
}

impl Eq for Node<'_> {}

impl std::hash::Hash for Node<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.subtree.id.hash(state);
        self.start_byte().hash(state);
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("range", &(self.start_byte()..self.end_byte()))
            .field("id", &self.subtree.id)
            .finish()
    }
}

/// Iterator over a node's direct children, accumulating absolute positions.
pub struct Children<'t> {
    node: Node<'t>,
    index: usize,
    byte: u32,
    point: Point,
}

impl<'t> Iterator for Children<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        let slot = self.node.subtree.children.get(self.index)?;
        let child = Node {
            tree: self.node.tree,
            subtree: &slot.subtree,
            offset_byte: self.byte,
            offset_point: self.point,
            field: slot.field,
        };
        self.index += 1;
        self.byte += slot.subtree.total().bytes;
        self.point = self.point.advanced_by(slot.subtree.total());
        Some(child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.node.subtree.children.len() - self.index;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Footprint start offsets of each child of `subtree`, in order. The cursor
/// binary-searches these when seeking a child by byte or point.
pub(crate) fn child_offsets(
    subtree: &SubtreeData,
    offset_byte: u32,
    offset_point: Point,
) -> Vec<(u32, Point)> {
    let mut offsets = Vec::with_capacity(subtree.children.len());
    let mut byte = offset_byte;
    let mut point = offset_point;
    for slot in &subtree.children {
        offsets.push((byte, point));
        byte += slot.subtree.total().bytes;
        point = point.advanced_by(slot.subtree.total());
    }
    offsets
}
