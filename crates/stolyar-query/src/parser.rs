//! Recursive-descent parser for the pattern language.
//!
//! Grammar, informally:
//!
//! ```text
//! query     := pattern*
//! pattern   := item
//! item      := node | string | "_" , capture*
//! node      := "(" (ident | "_") element* ")"
//! element   := "."? (field ":")? item | "!" ident | predicate
//! predicate := "(" "#"name (capture | string | ident)* ")"
//! ```
//!
//! A parenthesized group of one item plus predicates, `((number) @n
//! (#eq? @n "1"))`, attaches the predicates to the enclosing pattern.
//! Sibling groups with more than one item are not part of the language.

use indexmap::IndexSet;
use stolyar_core::{FieldId, Language, SymbolId};

use crate::error::{QueryError, QueryErrorKind};
use crate::lexer::{Token, TokenKind, lex};
use crate::pattern::{
    ChildPattern, Pattern, PatternStep, QueryPredicate, QueryPredicateStep, StepKind,
};

/// Parse `source` against `language`, producing the compiled patterns and
/// the ordered set of capture names.
pub(crate) fn parse(
    language: &Language,
    source: &str,
) -> Result<(Vec<Pattern>, IndexSet<String>), QueryError> {
    let tokens = lex(source)?;
    let mut parser = PatternParser {
        language,
        source,
        tokens,
        pos: 0,
        captures: IndexSet::new(),
    };
    let mut patterns = Vec::new();
    while parser.peek().is_some() {
        patterns.push(parser.top_level()?);
    }
    Ok((patterns, parser.captures))
}

struct PatternParser<'s> {
    language: &'s Language,
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    captures: IndexSet<String>,
}

impl PatternParser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    /// Offset of the current token, or the end of the source.
    fn offset(&self) -> u32 {
        self.peek().map_or(self.source.len() as u32, |t| t.start)
    }

    fn text(&self, token: &Token) -> &str {
        &self.source[token.start as usize..token.end as usize]
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, QueryError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            _ => Err(QueryError::new(QueryErrorKind::Syntax, self.offset())),
        }
    }

    fn at_predicate(&self) -> bool {
        self.peek().is_some_and(|t| t.kind == TokenKind::ParenOpen)
            && self.peek_second() == Some(TokenKind::PredicateName)
    }

    fn at_group(&self) -> bool {
        self.peek().is_some_and(|t| t.kind == TokenKind::ParenOpen)
            && matches!(
                self.peek_second(),
                Some(TokenKind::ParenOpen | TokenKind::String)
            )
    }

    fn top_level(&mut self) -> Result<Pattern, QueryError> {
        if self.at_predicate() {
            // A predicate needs a pattern to attach to.
            return Err(QueryError::new(QueryErrorKind::Structure, self.offset()));
        }
        let mut predicates = Vec::new();
        let root = self.item(&mut predicates)?;
        Ok(Pattern { root, predicates })
    }

    /// A node, anonymous token, wildcard or single-item group, with its
    /// trailing captures.
    fn item(&mut self, predicates: &mut Vec<QueryPredicate>) -> Result<PatternStep, QueryError> {
        let Some(token) = self.peek() else {
            return Err(QueryError::new(QueryErrorKind::Syntax, self.offset()));
        };
        let mut step = match token.kind {
            TokenKind::ParenOpen if self.at_group() => self.group(predicates)?,
            TokenKind::ParenOpen => self.node(predicates)?,
            TokenKind::String => {
                self.pos += 1;
                PatternStep::new(StepKind::Symbol(self.resolve_anonymous(&token)?))
            }
            TokenKind::Underscore => {
                self.pos += 1;
                PatternStep::new(StepKind::Any)
            }
            _ => return Err(QueryError::new(QueryErrorKind::Syntax, token.start)),
        };
        step.captures.extend(self.trailing_captures());
        Ok(step)
    }

    /// `((number) @n (#eq? @n "1"))` — one item with predicates attached.
    fn group(&mut self, predicates: &mut Vec<QueryPredicate>) -> Result<PatternStep, QueryError> {
        self.expect(TokenKind::ParenOpen)?;
        let inner = self.item(predicates)?;
        loop {
            let Some(token) = self.peek() else {
                return Err(QueryError::new(QueryErrorKind::Syntax, self.offset()));
            };
            match token.kind {
                TokenKind::ParenClose => {
                    self.pos += 1;
                    return Ok(inner);
                }
                TokenKind::ParenOpen if self.at_predicate() => {
                    let predicate = self.predicate()?;
                    predicates.push(predicate);
                }
                // Sibling groups are not supported.
                _ => return Err(QueryError::new(QueryErrorKind::Structure, token.start)),
            }
        }
    }

    fn node(&mut self, predicates: &mut Vec<QueryPredicate>) -> Result<PatternStep, QueryError> {
        self.expect(TokenKind::ParenOpen)?;
        let Some(head) = self.peek() else {
            return Err(QueryError::new(QueryErrorKind::Syntax, self.offset()));
        };
        let kind = match head.kind {
            TokenKind::Ident => {
                self.pos += 1;
                StepKind::Symbol(self.resolve_named(&head)?)
            }
            TokenKind::Underscore => {
                self.pos += 1;
                StepKind::AnyNamed
            }
            // `()` and other headless forms.
            _ => return Err(QueryError::new(QueryErrorKind::Structure, head.start)),
        };
        let mut step = PatternStep::new(kind);
        let mut pending_anchor = false;

        loop {
            let Some(token) = self.peek() else {
                return Err(QueryError::new(QueryErrorKind::Syntax, self.offset()));
            };
            match token.kind {
                TokenKind::ParenClose => {
                    self.pos += 1;
                    if pending_anchor {
                        match step.children.last_mut() {
                            Some(last) => last.anchored_after = true,
                            None => {
                                return Err(QueryError::new(
                                    QueryErrorKind::Structure,
                                    token.start,
                                ));
                            }
                        }
                    }
                    return Ok(step);
                }
                TokenKind::Dot => {
                    self.pos += 1;
                    pending_anchor = true;
                }
                TokenKind::Bang => {
                    self.pos += 1;
                    let name = self.expect(TokenKind::Ident)?;
                    step.negated_fields.push(self.resolve_field(&name)?);
                }
                TokenKind::ParenOpen if self.at_predicate() => {
                    let predicate = self.predicate()?;
                    predicates.push(predicate);
                }
                TokenKind::Ident => {
                    // Field constraint: `name: item`.
                    self.pos += 1;
                    self.expect(TokenKind::Colon)?;
                    let field = self.resolve_field(&token)?;
                    let child = self.item(predicates)?;
                    step.children.push(ChildPattern {
                        field: Some(field),
                        anchored_before: std::mem::take(&mut pending_anchor),
                        anchored_after: false,
                        step: child,
                    });
                }
                TokenKind::ParenOpen | TokenKind::String | TokenKind::Underscore => {
                    let child = self.item(predicates)?;
                    step.children.push(ChildPattern {
                        field: None,
                        anchored_before: std::mem::take(&mut pending_anchor),
                        anchored_after: false,
                        step: child,
                    });
                }
                _ => return Err(QueryError::new(QueryErrorKind::Syntax, token.start)),
            }
        }
    }

    fn predicate(&mut self) -> Result<QueryPredicate, QueryError> {
        self.expect(TokenKind::ParenOpen)?;
        let head = self.expect(TokenKind::PredicateName)?;
        let operator = self.text(&head)[1..].to_string();
        let mut args = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(QueryError::new(QueryErrorKind::Syntax, self.offset()));
            };
            match token.kind {
                TokenKind::ParenClose => {
                    self.pos += 1;
                    return Ok(QueryPredicate { operator, args });
                }
                TokenKind::Capture => {
                    self.pos += 1;
                    let name = &self.text(&token)[1..];
                    match self.captures.get_index_of(name) {
                        Some(index) => args.push(QueryPredicateStep::Capture(index as u32)),
                        None => {
                            return Err(QueryError::new(QueryErrorKind::Capture, token.start));
                        }
                    }
                }
                TokenKind::String => {
                    self.pos += 1;
                    let raw = self.text(&token);
                    args.push(QueryPredicateStep::Literal(unescape(
                        &raw[1..raw.len() - 1],
                    )));
                }
                TokenKind::Ident => {
                    self.pos += 1;
                    args.push(QueryPredicateStep::Literal(self.text(&token).to_string()));
                }
                _ => return Err(QueryError::new(QueryErrorKind::Syntax, token.start)),
            }
        }
    }

    fn trailing_captures(&mut self) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind != TokenKind::Capture {
                break;
            }
            self.pos += 1;
            let name = self.text(&token)[1..].to_string();
            let (index, _) = self.captures.insert_full(name);
            out.push(index as u32);
        }
        out
    }

    fn resolve_named(&self, token: &Token) -> Result<SymbolId, QueryError> {
        self.language
            .symbol_for_name(self.text(token), true)
            .ok_or(QueryError::new(QueryErrorKind::NodeType, token.start))
    }

    fn resolve_anonymous(&self, token: &Token) -> Result<SymbolId, QueryError> {
        let raw = self.text(token);
        let name = unescape(&raw[1..raw.len() - 1]);
        self.language
            .symbol_for_name(&name, false)
            .ok_or(QueryError::new(QueryErrorKind::NodeType, token.start))
    }

    fn resolve_field(&self, token: &Token) -> Result<FieldId, QueryError> {
        self.language
            .field_for_name(self.text(token))
            .ok_or(QueryError::new(QueryErrorKind::Field, token.start))
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
