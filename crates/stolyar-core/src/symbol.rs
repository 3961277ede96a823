//! Grammar symbols and fields.

use serde::{Deserialize, Serialize};

/// Symbol id into a language's symbol table. Terminal and nonterminal ids
/// share one namespace.
pub type SymbolId = u16;

/// Field id. Non-zero so `Option<FieldId>` stays two bytes.
pub type FieldId = std::num::NonZeroU16;

/// Reserved terminal for end-of-input.
pub const EOF_SYMBOL: SymbolId = 0;

/// How a symbol appears in trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Named node visible in the tree (`binary_expression`, `number`).
    Regular,
    /// Unnamed node visible in the tree (`"+"`, `"("`).
    Anonymous,
    /// Internal symbol that never appears in trees (hidden rules, EOF).
    Auxiliary,
}

/// Per-symbol metadata stored on a [`Language`](crate::Language).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// True for lexer-produced symbols (including externals), false for rules.
    pub terminal: bool,
    /// Extra symbols (comments, whitespace) may appear anywhere in a tree.
    pub extra: bool,
}

impl SymbolInfo {
    /// Named nodes are the ones addressable by kind in queries.
    pub fn is_named(&self) -> bool {
        self.kind == SymbolKind::Regular
    }

    pub fn is_visible(&self) -> bool {
        self.kind != SymbolKind::Auxiliary
    }
}
