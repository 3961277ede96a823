//! Enumeration of the terminals valid in a parse state.
//!
//! Useful for completion engines and for diagnosing syntax errors: given the
//! state a parse got stuck in, the iterator names every terminal that would
//! have been accepted there.

use stolyar_core::{Language, StateId, SymbolId};

#[derive(Debug, Clone)]
pub struct LookaheadIterator {
    language: Language,
    symbols: std::vec::IntoIter<SymbolId>,
}

impl LookaheadIterator {
    /// `None` when `state` is out of range for the language's tables.
    pub fn new(language: Language, state: StateId) -> Option<LookaheadIterator> {
        if state as usize >= language.parse_table().state_count() {
            return None;
        }
        let symbols: Vec<SymbolId> = language
            .parse_table()
            .state(state)
            .expected_terminals()
            .collect();
        Some(LookaheadIterator {
            language,
            symbols: symbols.into_iter(),
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The remaining terminals as kind names.
    pub fn names(self) -> Vec<String> {
        let language = self.language.clone();
        self.symbols
            .map(|s| language.symbol_name(s).to_string())
            .collect()
    }
}

impl Iterator for LookaheadIterator {
    type Item = SymbolId;

    fn next(&mut self) -> Option<SymbolId> {
        self.symbols.next()
    }
}
