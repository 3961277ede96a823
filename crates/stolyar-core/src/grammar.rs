//! In-memory grammar descriptions.
//!
//! A [`GrammarDef`] is plain data: terminals with token patterns, BNF
//! productions with optional precedence, field names on production elements.
//! Hidden rules follow the underscore convention: a rule named `_expr`
//! produces no node of its own; its children are spliced into the parent.

use serde::{Deserialize, Serialize};

/// How a terminal's text is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenPattern {
    /// Exact text. Wins ties against patterns declared later.
    Literal(String),
    /// Regex, compiled into the language's lex DFA.
    Pattern(String),
    /// Supplied by an external scanner at parse time.
    External,
}

/// A terminal declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalDef {
    pub name: String,
    pub pattern: TokenPattern,
    /// Named terminals produce regular nodes; unnamed ones anonymous nodes.
    pub named: bool,
    /// Extras may appear between any two tokens (whitespace, comments).
    pub extra: bool,
}

/// Associativity for conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// One element on the right-hand side of a production.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Elem {
    pub symbol: String,
    pub field: Option<String>,
}

impl Elem {
    pub fn sym(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            field: None,
        }
    }

    pub fn field(field: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            field: Some(field.into()),
        }
    }
}

/// A single BNF production with optional precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<Elem>,
    pub prec: Option<i32>,
    pub assoc: Assoc,
    /// Runtime bias between surviving ambiguous forks.
    pub dynamic_prec: i32,
}

impl Production {
    pub fn new(lhs: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: Vec::new(),
            prec: None,
            assoc: Assoc::None,
            dynamic_prec: 0,
        }
    }

    pub fn elem(mut self, elem: Elem) -> Self {
        self.rhs.push(elem);
        self
    }

    pub fn sym(self, symbol: impl Into<String>) -> Self {
        self.elem(Elem::sym(symbol))
    }

    pub fn field(self, field: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.elem(Elem::field(field, symbol))
    }

    pub fn prec(mut self, prec: i32) -> Self {
        self.prec = Some(prec);
        self
    }

    pub fn prec_left(mut self, prec: i32) -> Self {
        self.prec = Some(prec);
        self.assoc = Assoc::Left;
        self
    }

    pub fn prec_right(mut self, prec: i32) -> Self {
        self.prec = Some(prec);
        self.assoc = Assoc::Right;
        self
    }

    pub fn dynamic_prec(mut self, prec: i32) -> Self {
        self.dynamic_prec = prec;
        self
    }
}

/// Complete grammar description. The first production's left-hand side is the
/// root symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarDef {
    pub name: String,
    pub terminals: Vec<TerminalDef>,
    pub productions: Vec<Production>,
}

/// Chained construction of a [`GrammarDef`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    def: GrammarDef,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: GrammarDef {
                name: name.into(),
                terminals: Vec::new(),
                productions: Vec::new(),
            },
        }
    }

    /// Named terminal recognized by a regex. Declaration order is match
    /// priority: declare keywords before broad tokens like identifiers.
    pub fn token(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.def.terminals.push(TerminalDef {
            name: name.into(),
            pattern: TokenPattern::Pattern(pattern.into()),
            named: true,
            extra: false,
        });
        self
    }

    /// Anonymous literal terminal, named by its own text (`"+"`, `"("`).
    pub fn literal(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.def.terminals.push(TerminalDef {
            name: text.clone(),
            pattern: TokenPattern::Literal(text),
            named: false,
            extra: false,
        });
        self
    }

    /// Named extra terminal (e.g. comments).
    pub fn extra_token(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.def.terminals.push(TerminalDef {
            name: name.into(),
            pattern: TokenPattern::Pattern(pattern.into()),
            named: true,
            extra: true,
        });
        self
    }

    /// Anonymous extra terminal (typically whitespace).
    pub fn extra_anon(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.def.terminals.push(TerminalDef {
            name: name.into(),
            pattern: TokenPattern::Pattern(pattern.into()),
            named: false,
            extra: true,
        });
        self
    }

    /// Terminal produced by an external scanner.
    pub fn external(mut self, name: impl Into<String>) -> Self {
        self.def.terminals.push(TerminalDef {
            name: name.into(),
            pattern: TokenPattern::External,
            named: true,
            extra: false,
        });
        self
    }

    pub fn production(mut self, production: Production) -> Self {
        self.def.productions.push(production);
        self
    }

    pub fn finish(self) -> GrammarDef {
        self.def
    }

    /// Compile directly into a [`Language`](crate::Language).
    pub fn build(self) -> Result<crate::Language, crate::LanguageError> {
        crate::Language::compile(self.def)
    }
}
