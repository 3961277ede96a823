//! Core data model for Stolyar.
//!
//! Two layers:
//! - **Description layer**: [`GrammarDef`] is a plain, serializable account of a
//!   grammar (terminals, productions, precedence). It carries no derived state.
//! - **Compiled layer**: [`Language`] is the immutable, `Arc`-shared artifact the
//!   parser and query engines run against: symbol table, lex DFA, action/goto
//!   tables.
//!
//! Grammar compilation from a DSL is out of scope; grammars are constructed
//! in memory via [`GrammarBuilder`] and compiled once into a [`Language`].

mod grammar;
mod language;
mod symbol;
mod tables;
mod text;

#[cfg(test)]
mod tables_tests;

pub use grammar::{Assoc, Elem, GrammarBuilder, GrammarDef, Production, TerminalDef, TokenPattern};
pub use language::{Language, LanguageError, LexScan, LexTable};
pub use symbol::{EOF_SYMBOL, FieldId, SymbolId, SymbolInfo, SymbolKind};
pub use tables::{Action, ParseState, ParseTable, ProdId, ProdRule, StateId};
pub use text::{InputEdit, Length, Point, Range};
