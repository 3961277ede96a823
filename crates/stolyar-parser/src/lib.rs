//! Incremental GLR parsing over compiled [`stolyar_core`] languages.
//!
//! The runtime half of the system: [`Parser`] drives the lex DFA and the
//! action/goto tables, forking parse stacks on conflicts and merging them
//! back, and produces an immutable [`Tree`] of shared subtrees. Feeding an
//! edited previous tree back into [`Parser::parse`] reuses every unchanged
//! token, so lexing cost tracks the size of the edit, not the document.
//!
//! ```
//! use stolyar_core::{GrammarBuilder, Production};
//! use stolyar_parser::Parser;
//!
//! let language = GrammarBuilder::new("list")
//!     .token("word", "[a-z]+")
//!     .extra_anon("whitespace", "[ \\t\\n]+")
//!     .production(Production::new("list").sym("word"))
//!     .production(Production::new("list").sym("list").sym("word"))
//!     .build()
//!     .unwrap();
//!
//! let mut parser = Parser::new(language);
//! let tree = parser.parse("one two three", None).tree().unwrap();
//! assert_eq!(tree.root_node().kind(), "list");
//! assert!(!tree.root_node().has_error());
//! ```

mod cursor;
mod glr;
mod lexer;
mod lookahead;
mod node;
mod options;
mod parser;
mod recovery;
mod reuse;
mod subtree;
mod tree;

#[cfg(test)]
mod node_tests;
#[cfg(test)]
mod parser_tests;

pub use cursor::{CursorError, TreeCursor};
pub use lexer::{ExternalScanner, ExternalToken};
pub use lookahead::LookaheadIterator;
pub use node::{Children, Node};
pub use options::{DEFAULT_MAX_FORKS, IncludedRangesError, ParseOptions};
pub use parser::{ParseOutcome, Parser};
pub use tree::Tree;
