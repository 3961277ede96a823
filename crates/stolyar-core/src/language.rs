//! Compiled, immutable, shareable grammar artifacts.

use std::sync::Arc;

use indexmap::IndexMap;
use regex_automata::dfa::dense;
use regex_automata::dfa::{Automaton, StartKind};
use regex_automata::util::primitives::StateID;
use regex_automata::{Anchored, Input, MatchKind};

use crate::grammar::{GrammarDef, TokenPattern};
use crate::symbol::{EOF_SYMBOL, FieldId, SymbolId, SymbolInfo, SymbolKind};
use crate::tables::{ParseTable, ProdRule, build_parse_table};

/// Errors produced while compiling a [`GrammarDef`] into a [`Language`].
#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    #[error("grammar has no productions")]
    EmptyGrammar,

    #[error("duplicate symbol name `{0}`")]
    DuplicateSymbol(String),

    #[error("unknown symbol `{0}` referenced in a production")]
    UnknownSymbol(String),

    #[error("too many symbols ({0}); symbol ids are u16")]
    TooManySymbols(usize),

    #[error("invalid token pattern for `{name}`")]
    InvalidPattern {
        name: String,
        #[source]
        source: Box<dense::BuildError>,
    },
}

/// Longest match found by [`LexTable::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexScan {
    pub symbol: SymbolId,
    pub len: u32,
}

/// Table-driven scanner state machine: one anchored multi-pattern DFA over
/// all non-external terminals.
#[derive(Debug)]
pub struct LexTable {
    dfa: dense::DFA<Vec<u32>>,
    /// DFA pattern index -> terminal symbol, in declaration (priority) order.
    pattern_symbols: Vec<SymbolId>,
}

impl LexTable {
    fn compile(patterns: &[(String, SymbolId)], grammar_name: &str) -> Result<Self, LanguageError> {
        let sources: Vec<&str> = patterns.iter().map(|(p, _)| p.as_str()).collect();
        let dfa = dense::Builder::new()
            .configure(
                dense::Config::new()
                    .match_kind(MatchKind::All)
                    .start_kind(StartKind::Anchored),
            )
            .build_many(&sources)
            .map_err(|e| LanguageError::InvalidPattern {
                name: grammar_name.to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            dfa,
            pattern_symbols: patterns.iter().map(|(_, s)| *s).collect(),
        })
    }

    /// Longest anchored match in `text[start..end]`, ties broken by
    /// declaration order. Returns `None` when no terminal matches (the lexer
    /// coalesces such bytes into a single garbage token).
    pub fn scan(&self, text: &[u8], start: usize, end: usize) -> Option<LexScan> {
        let input = Input::new(text).range(start..end).anchored(Anchored::Yes);
        let mut state: StateID = self.dfa.start_state_forward(&input).ok()?;
        let mut best: Option<LexScan> = None;

        for at in start..end {
            state = self.dfa.next_state(state, text[at]);
            if !self.dfa.is_special_state(state) {
                continue;
            }
            if self.dfa.is_dead_state(state) {
                return best;
            }
            if self.dfa.is_match_state(state) {
                best = Some(self.best_at(state, (at - start) as u32));
            }
        }
        state = self.dfa.next_eoi_state(state);
        if self.dfa.is_match_state(state) {
            best = Some(self.best_at(state, (end - start) as u32));
        }
        best
    }

    /// Among all patterns matching at this offset, pick the earliest declared.
    fn best_at(&self, state: StateID, len: u32) -> LexScan {
        let winner = (0..self.dfa.match_len(state))
            .map(|i| self.dfa.match_pattern(state, i).as_usize())
            .min()
            .expect("match state has at least one pattern");
        LexScan {
            symbol: self.pattern_symbols[winner],
            len,
        }
    }
}

#[derive(Debug)]
struct LanguageData {
    name: String,
    /// Indexed by `SymbolId`; entry 0 is the EOF sentinel.
    symbols: Vec<SymbolInfo>,
    /// Symbol lookup keyed by (name, named).
    by_name: IndexMap<(String, bool), SymbolId>,
    /// Indexed by `FieldId - 1`.
    fields: Vec<String>,
    lex: LexTable,
    table: ParseTable,
    error_symbol: SymbolId,
    root_symbol: SymbolId,
    externals: Vec<SymbolId>,
}

/// An immutable grammar shared by parsers, trees and queries.
///
/// Cloning is an `Arc` bump; a `Language` is never mutated after
/// construction and may be used from any number of threads.
#[derive(Debug, Clone)]
pub struct Language {
    data: Arc<LanguageData>,
}

impl Language {
    /// Compile a grammar description into parse and lex tables.
    pub fn compile(def: GrammarDef) -> Result<Language, LanguageError> {
        if def.productions.is_empty() {
            return Err(LanguageError::EmptyGrammar);
        }

        let mut symbols: Vec<SymbolInfo> = vec![SymbolInfo {
            name: "end".to_string(),
            kind: SymbolKind::Auxiliary,
            terminal: true,
            extra: false,
        }];
        let mut by_name: IndexMap<(String, bool), SymbolId> = IndexMap::new();
        let mut externals = Vec::new();

        fn add_symbol(
            symbols: &mut Vec<SymbolInfo>,
            by_name: &mut IndexMap<(String, bool), SymbolId>,
            info: SymbolInfo,
        ) -> Result<SymbolId, LanguageError> {
            if symbols.len() > u16::MAX as usize {
                return Err(LanguageError::TooManySymbols(symbols.len()));
            }
            let id = symbols.len() as SymbolId;
            let key = (info.name.clone(), info.is_named());
            if by_name.insert(key, id).is_some() {
                return Err(LanguageError::DuplicateSymbol(info.name.clone()));
            }
            symbols.push(info);
            Ok(id)
        }

        let mut patterns: Vec<(String, SymbolId)> = Vec::new();
        for t in &def.terminals {
            let id = add_symbol(
                &mut symbols,
                &mut by_name,
                SymbolInfo {
                    name: t.name.clone(),
                    kind: if t.named {
                        SymbolKind::Regular
                    } else {
                        SymbolKind::Anonymous
                    },
                    terminal: true,
                    extra: t.extra,
                },
            )?;
            match &t.pattern {
                TokenPattern::Literal(text) => patterns.push((regex_syntax::escape(text), id)),
                TokenPattern::Pattern(re) => patterns.push((re.clone(), id)),
                TokenPattern::External => externals.push(id),
            }
        }

        // Nonterminals: one symbol per distinct left-hand side. Underscore
        // names are hidden (auxiliary).
        for p in &def.productions {
            if by_name.contains_key(&(p.lhs.clone(), true))
                || by_name.contains_key(&(p.lhs.clone(), false))
            {
                continue;
            }
            let hidden = p.lhs.starts_with('_');
            add_symbol(
                &mut symbols,
                &mut by_name,
                SymbolInfo {
                    name: p.lhs.clone(),
                    kind: if hidden {
                        SymbolKind::Auxiliary
                    } else {
                        SymbolKind::Regular
                    },
                    terminal: false,
                    extra: false,
                },
            )?;
        }

        let error_symbol = add_symbol(
            &mut symbols,
            &mut by_name,
            SymbolInfo {
                name: "ERROR".to_string(),
                kind: SymbolKind::Regular,
                terminal: false,
                extra: false,
            },
        )?;

        // Fields, in first-mention order.
        let mut fields: Vec<String> = Vec::new();
        for p in &def.productions {
            for e in &p.rhs {
                if let Some(f) = &e.field
                    && !fields.iter().any(|known| known == f)
                {
                    fields.push(f.clone());
                }
            }
        }

        let resolve = |name: &str| -> Result<SymbolId, LanguageError> {
            by_name
                .get(&(name.to_string(), true))
                .or_else(|| by_name.get(&(name.to_string(), false)))
                .copied()
                .ok_or_else(|| LanguageError::UnknownSymbol(name.to_string()))
        };

        let mut prods: Vec<ProdRule> = Vec::with_capacity(def.productions.len());
        for p in &def.productions {
            let lhs = resolve(&p.lhs)?;
            let mut rhs = Vec::with_capacity(p.rhs.len());
            for e in &p.rhs {
                let sym = resolve(&e.symbol)?;
                let field = e
                    .field
                    .as_ref()
                    .map(|f| {
                        let idx = fields.iter().position(|known| known == f).expect("collected");
                        FieldId::new(idx as u16 + 1).expect("index + 1 is nonzero")
                    });
                rhs.push((sym, field));
            }
            prods.push(ProdRule {
                lhs,
                rhs,
                prec: p.prec,
                assoc: p.assoc,
                dynamic_prec: p.dynamic_prec,
            });
        }

        let root_symbol = prods[0].lhs;
        let lex = LexTable::compile(&patterns, &def.name)?;
        let table = build_parse_table(prods, root_symbol);

        Ok(Language {
            data: Arc::new(LanguageData {
                name: def.name,
                symbols,
                by_name,
                fields,
                lex,
                table,
                error_symbol,
                root_symbol,
                externals,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn symbol_count(&self) -> usize {
        self.data.symbols.len()
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.data.symbols[id as usize]
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.data.symbols[id as usize].name
    }

    /// Resolve a symbol by name and named-ness (queries distinguish
    /// `(identifier)` from `"identifier"`).
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        self.data
            .by_name
            .get(&(name.to_string(), named))
            .copied()
    }

    pub fn field_count(&self) -> usize {
        self.data.fields.len()
    }

    pub fn field_name(&self, id: FieldId) -> Option<&str> {
        self.data.fields.get(id.get() as usize - 1).map(String::as_str)
    }

    pub fn field_for_name(&self, name: &str) -> Option<FieldId> {
        self.data
            .fields
            .iter()
            .position(|f| f == name)
            .map(|idx| FieldId::new(idx as u16 + 1).expect("index + 1 is nonzero"))
    }

    pub fn is_extra(&self, id: SymbolId) -> bool {
        self.data.symbols[id as usize].extra
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.data.symbols[id as usize].terminal
    }

    pub fn error_symbol(&self) -> SymbolId {
        self.data.error_symbol
    }

    pub fn root_symbol(&self) -> SymbolId {
        self.data.root_symbol
    }

    /// Terminals expected from an external scanner, in declaration order.
    pub fn external_symbols(&self) -> &[SymbolId] {
        &self.data.externals
    }

    pub fn eof_symbol(&self) -> SymbolId {
        EOF_SYMBOL
    }

    /// The action/goto tables. Consumed by the parser runtime.
    pub fn parse_table(&self) -> &ParseTable {
        &self.data.table
    }

    /// The lex DFA. Consumed by the lexer runtime.
    pub fn lex_table(&self) -> &LexTable {
        &self.data.lex
    }

    /// Identity comparison: two `Language` values are the same language only
    /// if they share the same compiled tables.
    pub fn same(a: &Language, b: &Language) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }
}
