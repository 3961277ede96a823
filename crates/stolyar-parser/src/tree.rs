//! The syntax tree handle.

use stolyar_core::{InputEdit, Language, Point, Range};

use crate::cursor::TreeCursor;
use crate::node::Node;
use crate::reuse;
use crate::subtree::Subtree;

/// An immutable syntax tree.
///
/// Cloning is cheap: all subtrees are reference-counted and shared. An
/// incremental reparse keeps the identities of every unchanged token of the
/// tree it was seeded from, and a reparse without edits returns the same
/// tree.
#[derive(Debug, Clone)]
pub struct Tree {
    language: Language,
    root: Subtree,
    included_ranges: Vec<Range>,
}

impl Tree {
    pub(crate) fn new(language: Language, root: Subtree, included_ranges: Vec<Range>) -> Tree {
        Tree {
            language,
            root,
            included_ranges,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::root(self)
    }

    pub(crate) fn root_subtree(&self) -> &Subtree {
        &self.root
    }

    /// The ranges of text the tree was parsed from. A single range covering
    /// the whole document unless the parser was given included ranges.
    pub fn included_ranges(&self) -> &[Range] {
        &self.included_ranges
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self)
    }

    /// Adjust the tree for a source edit.
    ///
    /// Subtrees overlapping the edited region are path-copied with updated
    /// extents and marked changed; everything else stays shared. The result
    /// still describes the *old* parse and exists to seed the next call to
    /// [`Parser::parse`](crate::Parser::parse). Positions inside edited
    /// regions are approximate until then.
    pub fn edit(&mut self, edit: &InputEdit) {
        self.root = reuse::apply_edit(&self.root, Point::ZERO, 0, edit);
        for range in &mut self.included_ranges {
            reuse::shift_range(range, edit);
        }
    }

    /// Ranges whose syntactic structure differs between `self` and `other`.
    ///
    /// Call on the *old* tree (after [`edit`](Tree::edit)) with the freshly
    /// reparsed tree. Ranges are reported in the new tree's coordinates,
    /// merged and ordered.
    pub fn changed_ranges(&self, other: &Tree) -> Vec<Range> {
        reuse::changed_ranges(&self.root, &other.root)
    }
}
