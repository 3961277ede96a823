//! The incremental GLR parse driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use stolyar_core::{EOF_SYMBOL, Language, Point, Range};

use crate::glr::{self, ParseStack};
use crate::lexer::{ExternalScanner, Lexer, Token};
use crate::options::{IncludedRangesError, ParseOptions, validate_ranges};
use crate::recovery;
use crate::reuse::ReuseCursor;
use crate::subtree::{ChildSlot, Subtree, SubtreeData};
use crate::tree::Tree;

/// Tokens between checks of the cancellation flag and the timeout.
const POLL_INTERVAL: u64 = 64;

/// Result of [`Parser::parse`].
///
/// Cancellation and timeout are expected outcomes, not errors: the parser
/// keeps its progress and the next `parse` call with the same text resumes
/// where it stopped.
#[derive(Debug)]
pub enum ParseOutcome {
    Tree(Tree),
    Cancelled,
    TimedOut,
}

impl ParseOutcome {
    pub fn tree(self) -> Option<Tree> {
        match self {
            ParseOutcome::Tree(tree) => Some(tree),
            _ => None,
        }
    }
}

/// A parse in flight, stashed across cancellations.
struct Session {
    /// Fingerprint for resumption; filled in when the session is saved.
    text: String,
    stacks: Vec<ParseStack>,
    pos: u32,
    point: Point,
    /// Tokens skipped by recovery, pending their ERROR node.
    skipped: Vec<Subtree>,
    consecutive_skips: usize,
    next_serial: u64,
    tokens_seen: u64,
    reuse: Option<ReuseCursor>,
}

/// A stateful parser for one [`Language`].
///
/// The parser itself is cheap; the heavy state (tables) lives in the shared
/// language. A parser is not `Sync` when it carries an external scanner, but
/// distinct parsers for the same language work independently on any thread.
pub struct Parser {
    language: Language,
    options: ParseOptions,
    scanner: Option<Box<dyn ExternalScanner>>,
    session: Option<Session>,
}

impl Parser {
    pub fn new(language: Language) -> Parser {
        Parser::with_options(language, ParseOptions::new())
    }

    pub fn with_options(language: Language, options: ParseOptions) -> Parser {
        Parser {
            language,
            options,
            scanner: None,
            session: None,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// See [`ParseOptions::timeout_micros`].
    pub fn set_timeout_micros(&mut self, micros: u64) {
        self.options.timeout_micros = if micros == 0 { None } else { Some(micros) };
    }

    /// See [`ParseOptions::cancellation_flag`].
    pub fn set_cancellation_flag(&mut self, flag: Option<Arc<AtomicUsize>>) {
        self.options.cancellation_flag = flag;
    }

    /// See [`ParseOptions::max_forks`].
    pub fn set_max_forks(&mut self, max_forks: usize) {
        self.options.max_forks = max_forks.max(1);
    }

    /// Restrict parsing to `ranges`. Clears any suspended parse.
    pub fn set_included_ranges(&mut self, ranges: Vec<Range>) -> Result<(), IncludedRangesError> {
        validate_ranges(&ranges)?;
        self.options.included_ranges = ranges;
        self.session = None;
        Ok(())
    }

    pub fn set_external_scanner(&mut self, scanner: Box<dyn ExternalScanner>) {
        self.scanner = Some(scanner);
    }

    /// Discard a parse suspended by cancellation or timeout.
    pub fn reset(&mut self) {
        self.session = None;
    }

    /// Parse `text`, reusing unchanged tokens of `old_tree` when given.
    ///
    /// `old_tree` must be the previous parse of this document after
    /// [`Tree::edit`] was applied for every change since.
    pub fn parse(&mut self, text: &str, old_tree: Option<&Tree>) -> ParseOutcome {
        // A tree with no edits applied since reparses to itself.
        if let Some(old) = old_tree
            && Language::same(old.language(), &self.language)
            && old.included_ranges() == self.options.included_ranges
            && !old.root_subtree().has_changes
        {
            return ParseOutcome::Tree(old.clone());
        }

        let deadline = self
            .options
            .timeout_micros
            .map(|us| Instant::now() + Duration::from_micros(us));
        let language = self.language.clone();
        let table = language.parse_table();
        let mut lexer = Lexer::new(text, language.clone(), &self.options.included_ranges);

        let mut s = match self.session.take() {
            Some(session) if session.text == text => {
                lexer.set_position(session.pos, session.point);
                session
            }
            _ => {
                let (pos, point) = lexer.position();
                Session {
                    text: String::new(),
                    stacks: vec![ParseStack::start(table.start_state())],
                    pos,
                    point,
                    skipped: Vec::new(),
                    consecutive_skips: 0,
                    next_serial: 0,
                    tokens_seen: 0,
                    reuse: old_tree
                        .filter(|t| Language::same(t.language(), &language))
                        .filter(|t| t.included_ranges() == self.options.included_ranges)
                        .map(ReuseCursor::new),
                }
            }
        };

        loop {
            s.tokens_seen += 1;
            if s.tokens_seen % POLL_INTERVAL == 0 {
                if let Some(flag) = &self.options.cancellation_flag
                    && flag.load(Ordering::Relaxed) != 0
                {
                    self.save(&lexer, s, text);
                    return ParseOutcome::Cancelled;
                }
                if let Some(deadline) = deadline
                    && Instant::now() >= deadline
                {
                    self.save(&lexer, s, text);
                    return ParseOutcome::TimedOut;
                }
            }

            // Incremental fast path: take the next token from the previous
            // tree instead of the lexer. Reused tokens run through the
            // ordinary reduce/shift machinery below, so the parse is
            // token-for-token identical to one over fresh input while
            // unchanged leaves keep their identities. External tokens are
            // excluded: the scanner must see them again.
            let mut reused: Option<Subtree> = None;
            if let Some(cursor) = s.reuse.as_mut() {
                let (pos, point) = lexer.position();
                reused = cursor.reusable_at(pos, |sub| {
                    sub.is_leaf() && !language.external_symbols().contains(&sub.symbol)
                });
                if let Some(sub) = &reused {
                    let len = sub.total();
                    tracing::trace!(bytes = len.bytes, "reused token");
                    lexer.set_position(pos + len.bytes, point.advanced_by(len));
                }
            }

            let (lookahead, leaf) = match reused {
                Some(sub) if sub.extra => {
                    if s.skipped.is_empty() {
                        for st in &mut s.stacks {
                            st.push_extra(Arc::clone(&sub));
                        }
                    } else {
                        s.skipped.push(sub);
                    }
                    continue;
                }
                Some(sub) => (sub.symbol, Some(sub)),
                None => {
                    // Which external terminals any stack could act on right now.
                    let valid_externals: Vec<bool> = language
                        .external_symbols()
                        .iter()
                        .map(|&ext| {
                            s.stacks
                                .iter()
                                .any(|st| !table.state(st.top_state()).actions(ext).is_empty())
                        })
                        .collect();
                    let scanner = self
                        .scanner
                        .as_mut()
                        .map(|b| b.as_mut() as &mut dyn ExternalScanner);
                    match lexer.next_token(&valid_externals, scanner) {
                        None => (EOF_SYMBOL, None),
                        Some(tok) if tok.is_garbage => {
                            s.skipped.push(SubtreeData::garbage_leaf(
                                language.error_symbol(),
                                tok.padding,
                                tok.len,
                            ));
                            for st in &mut s.stacks {
                                st.error_cost += recovery::SKIPPED_TOKEN_COST;
                            }
                            continue;
                        }
                        Some(tok) if tok.is_extra => {
                            let leaf = token_leaf(&language, &tok);
                            if s.skipped.is_empty() {
                                for st in &mut s.stacks {
                                    st.push_extra(Arc::clone(&leaf));
                                }
                            } else {
                                // Keep document order inside the pending ERROR node.
                                s.skipped.push(leaf);
                            }
                            continue;
                        }
                        Some(tok) => (tok.symbol, Some(token_leaf(&language, &tok))),
                    }
                }
            };

            // Run the reductions this lookahead enables, forking on conflict.
            let stacks = std::mem::take(&mut s.stacks);
            let outcome = glr::reduce_for_lookahead(stacks, lookahead, &language, &mut s.next_serial);
            let mut ready = outcome.ready;
            let stuck = outcome.stuck;

            if ready.is_empty() && s.consecutive_skips <= recovery::MAX_SKIPPED_TOKENS {
                let repaired =
                    recovery::insert_missing(&stuck, lookahead, &language, &mut s.next_serial);
                if !repaired.is_empty() {
                    ready = glr::reduce_for_lookahead(repaired, lookahead, &language, &mut s.next_serial)
                        .ready;
                }
            }

            if ready.is_empty() {
                match leaf {
                    Some(leaf) => {
                        tracing::debug!(
                            token = language.symbol_name(lookahead),
                            "skipping token during recovery"
                        );
                        s.skipped.push(leaf);
                        s.consecutive_skips += 1;
                        s.stacks = stuck;
                        for st in &mut s.stacks {
                            st.error_cost += recovery::SKIPPED_TOKEN_COST;
                        }
                        continue;
                    }
                    None => {
                        // End of input and no repair: ERROR root.
                        let root =
                            error_root(&language, best_stack(stuck), std::mem::take(&mut s.skipped));
                        return ParseOutcome::Tree(self.make_tree(root));
                    }
                }
            }

            if lookahead == EOF_SYMBOL {
                let accepting: Vec<ParseStack> = ready
                    .into_iter()
                    .filter(|st| st.can_accept(&language, EOF_SYMBOL))
                    .collect();
                let root = match best_stack(accepting) {
                    Some(mut best) => {
                        if !s.skipped.is_empty() {
                            let error =
                                recovery::wrap_skipped(&language, std::mem::take(&mut s.skipped));
                            best.push_extra(error);
                        }
                        finish_root(&language, best)
                    }
                    None => error_root(&language, None, std::mem::take(&mut s.skipped)),
                };
                tracing::debug!(tokens = s.tokens_seen, "parse finished");
                return ParseOutcome::Tree(self.make_tree(root));
            }

            let leaf = match leaf {
                Some(leaf) => leaf,
                None => unreachable!("non-EOF lookahead always has a token"),
            };
            let error = if s.skipped.is_empty() {
                None
            } else {
                Some(recovery::wrap_skipped(
                    &language,
                    std::mem::take(&mut s.skipped),
                ))
            };
            let mut shifted = Vec::with_capacity(ready.len());
            for mut stack in ready {
                let Some(next) = stack.shift_action(&language, lookahead) else {
                    continue;
                };
                if let Some(error) = &error {
                    stack.push_extra(Arc::clone(error));
                }
                stack.push(Arc::clone(&leaf), next);
                shifted.push(stack);
            }
            s.consecutive_skips = 0;
            s.stacks = shifted;
            glr::dedupe_and_prune(&mut s.stacks, self.options.max_forks);
            debug_assert!(!s.stacks.is_empty(), "a ready stack always shifts");
        }
    }

    /// Parse UTF-16 text by transcoding. Positions in the resulting tree are
    /// expressed in the UTF-8 form of the text.
    pub fn parse_utf16(&mut self, text: &[u16], old_tree: Option<&Tree>) -> ParseOutcome {
        let text = String::from_utf16_lossy(text);
        self.parse(&text, old_tree)
    }

    fn save(&mut self, lexer: &Lexer<'_>, mut session: Session, text: &str) {
        let (pos, point) = lexer.position();
        session.pos = pos;
        session.point = point;
        session.text = text.to_string();
        self.session = Some(session);
    }

    fn make_tree(&self, root: Subtree) -> Tree {
        Tree::new(
            self.language.clone(),
            root,
            self.options.included_ranges.clone(),
        )
    }
}

fn token_leaf(language: &Language, token: &Token) -> Subtree {
    SubtreeData::leaf(
        token.symbol,
        token.padding,
        token.len,
        language.symbol(token.symbol).is_named(),
        token.is_extra,
    )
}

/// The cheapest stack: lowest error cost, then highest dynamic precedence,
/// then earliest created.
fn best_stack(stacks: Vec<ParseStack>) -> Option<ParseStack> {
    stacks
        .into_iter()
        .min_by_key(|s| (s.error_cost, std::cmp::Reverse(s.dynamic_prec), s.serial))
}

/// Assemble the root from an accepting stack. Extras above or below the
/// root nonterminal become children of the root so it spans the whole input.
fn finish_root(language: &Language, stack: ParseStack) -> Subtree {
    let mut leading: Vec<Subtree> = Vec::new();
    let mut trailing: Vec<Subtree> = Vec::new();
    let mut root: Option<Subtree> = None;
    for entry in stack.entries.into_iter().skip(1) {
        let Some(sub) = entry.subtree else { continue };
        if entry.is_extra {
            if root.is_none() {
                leading.push(sub);
            } else {
                trailing.push(sub);
            }
        } else {
            root = Some(sub);
        }
    }
    let Some(root) = root else {
        return error_root(language, None, leading);
    };
    if leading.is_empty() && trailing.is_empty() {
        return root;
    }
    let mut children: Vec<ChildSlot> = Vec::new();
    children.extend(leading.into_iter().map(|subtree| ChildSlot {
        field: None,
        subtree,
    }));
    children.extend(root.children.iter().cloned());
    children.extend(trailing.into_iter().map(|subtree| ChildSlot {
        field: None,
        subtree,
    }));
    SubtreeData::internal(root.symbol, children, root.named, false)
}

/// Last-resort root when the input never reached an accepting state.
fn error_root(language: &Language, stack: Option<ParseStack>, skipped: Vec<Subtree>) -> Subtree {
    let mut children: Vec<ChildSlot> = Vec::new();
    if let Some(stack) = stack {
        for entry in stack.entries.into_iter().skip(1) {
            if let Some(subtree) = entry.subtree {
                children.push(ChildSlot {
                    field: None,
                    subtree,
                });
            }
        }
    }
    children.extend(skipped.into_iter().map(|subtree| ChildSlot {
        field: None,
        subtree,
    }));
    SubtreeData::error_node(language.error_symbol(), children)
}
