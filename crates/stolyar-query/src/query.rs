//! Compiled queries.

use indexmap::IndexSet;
use stolyar_core::Language;
use tracing::debug;

use crate::error::QueryError;
use crate::parser;
use crate::pattern::{Pattern, QueryPredicate};

/// A set of patterns compiled against one language.
///
/// Compilation resolves every node kind and field name to its id and
/// interns capture names, so execution never touches strings. A `Query`
/// is immutable and may be run any number of times, by any number of
/// cursors.
#[derive(Debug, Clone)]
pub struct Query {
    language: Language,
    patterns: Vec<Pattern>,
    capture_names: IndexSet<String>,
}

impl Query {
    /// Compile `source` against `language`. All name resolution happens
    /// here; errors carry the byte offset of the offending token.
    pub fn compile(language: &Language, source: &str) -> Result<Query, QueryError> {
        let (patterns, capture_names) = parser::parse(language, source)?;
        debug!(
            language = language.name(),
            patterns = patterns.len(),
            captures = capture_names.len(),
            "compiled query"
        );
        Ok(Query {
            language: language.clone(),
            patterns,
            capture_names,
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Capture names in first-appearance order; a capture's index is its
    /// position here.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.capture_names.iter().map(String::as_str)
    }

    pub fn capture_name(&self, index: u32) -> Option<&str> {
        self.capture_names
            .get_index(index as usize)
            .map(String::as_str)
    }

    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_names.get_index_of(name).map(|i| i as u32)
    }

    /// The unevaluated predicates attached to a pattern. Evaluating them
    /// is the caller's business.
    pub fn predicates(&self, pattern_index: usize) -> &[QueryPredicate] {
        &self.patterns[pattern_index].predicates
    }

    pub(crate) fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}
