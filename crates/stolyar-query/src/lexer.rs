//! Lexer for the pattern language.
//!
//! Produces span-based tokens; text is sliced from the source only when
//! needed. Whitespace and `;` line comments are skipped.

use logos::Logos;

use crate::error::{QueryError, QueryErrorKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r";[^\n]*", allow_greedy = true))]
pub(crate) enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("_")]
    Underscore,

    /// Anchor between sibling patterns.
    #[token(".")]
    Dot,

    /// Negated field prefix: `!field`.
    #[token("!")]
    Bang,

    #[token(":")]
    Colon,

    /// Node kind or field name. No leading underscore, so `_` stays
    /// unambiguous.
    #[regex("[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,

    /// `@name` capture.
    #[regex(r"@[A-Za-z_][A-Za-z0-9_.]*")]
    Capture,

    /// `#name?` predicate head.
    #[regex(r"#[A-Za-z_][A-Za-z0-9_.\-]*[?!]?")]
    PredicateName,

    /// Double-quoted string with backslash escapes.
    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    String,
}

/// Zero-copy token: kind plus byte span into the pattern source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

/// Tokenize the whole pattern source up front. The first unrecognized byte
/// fails the compile with a [`QueryErrorKind::Syntax`] at its offset.
pub(crate) fn lex(source: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(next) = lexer.next() {
        let span = lexer.span();
        match next {
            Ok(kind) => tokens.push(Token {
                kind,
                start: span.start as u32,
                end: span.end as u32,
            }),
            Err(()) => return Err(QueryError::new(QueryErrorKind::Syntax, span.start as u32)),
        }
    }
    Ok(tokens)
}
