//! Tree pattern queries.
//!
//! A [`Query`] compiles S-expression patterns against a
//! [`Language`](stolyar_core::Language); a [`QueryCursor`] runs it over a
//! parsed tree and yields matches lazily, in document order.
//!
//! ```
//! use stolyar_core::{GrammarBuilder, Production};
//! use stolyar_parser::Parser;
//! use stolyar_query::{Query, QueryCursor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let language = GrammarBuilder::new("arith")
//!     .token("number", "[0-9]+")
//!     .literal("+")
//!     .production(Production::new("program").sym("_expression"))
//!     .production(
//!         Production::new("binary_expression")
//!             .field("left", "_expression")
//!             .sym("+")
//!             .field("right", "_expression")
//!             .prec_left(1),
//!     )
//!     .production(Production::new("_expression").sym("binary_expression"))
//!     .production(Production::new("_expression").sym("number"))
//!     .build()?;
//!
//! let mut parser = Parser::new(language.clone());
//! let tree = parser.parse("1+2", None).tree().ok_or("interrupted")?;
//!
//! let query = Query::compile(&language, "(binary_expression left: (_) @l right: (_) @r)")?;
//! let mut cursor = QueryCursor::new();
//! let matches: Vec<_> = cursor.matches(&query, tree.root_node())?.collect();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].captures.len(), 2);
//! assert_eq!(matches[0].captures[0].node.text("1+2"), "1");
//! assert_eq!(matches[0].captures[1].node.text("1+2"), "2");
//! # Ok(())
//! # }
//! ```
//!
//! Predicates like `(#eq? @n "1")` are parsed and surfaced through
//! [`Query::predicates`] but never evaluated; their meaning is up to the
//! caller.

mod error;
mod exec;
mod lexer;
mod parser;
mod pattern;
mod query;

#[cfg(test)]
mod exec_tests;
#[cfg(test)]
mod parser_tests;

pub use error::{QueryError, QueryErrorKind};
pub use exec::{QueryCapture, QueryCaptures, QueryCursor, QueryMatch, QueryMatches};
pub use pattern::{QueryPredicate, QueryPredicateStep};
pub use query::Query;
