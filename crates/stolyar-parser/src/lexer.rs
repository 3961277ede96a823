//! The lexer runtime: drives the language's lex DFA over the source text.

use stolyar_core::{Language, Length, Point, Range, SymbolId};

/// One token recognized at the current position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Token {
    pub symbol: SymbolId,
    /// Excluded-range gap crossed to reach this token.
    pub padding: Length,
    pub len: Length,
    pub is_extra: bool,
    /// Bytes no terminal matched, coalesced into a single token.
    pub is_garbage: bool,
}

/// A token produced by an [`ExternalScanner`].
#[derive(Debug, Clone, Copy)]
pub struct ExternalToken {
    /// Index into [`Language::external_symbols`].
    pub index: usize,
    /// Bytes consumed. Zero-width tokens are allowed (layout markers).
    pub len: u32,
}

/// Recognizes tokens the lex DFA cannot express, such as heredoc bodies or
/// indentation-sensitive layout.
///
/// The scanner is consulted before the DFA at every token position. `valid`
/// flags which of the language's external terminals the parser can currently
/// accept, indexed like [`Language::external_symbols`]; a scanner must only
/// return a token whose flag is set.
pub trait ExternalScanner: Send {
    fn scan(&mut self, text: &str, start: usize, valid: &[bool]) -> Option<ExternalToken>;
}

/// Tokenizes `text` within a set of included ranges.
///
/// Positions only ever move forward, except through [`set_position`], which
/// the parser uses after consuming a reused token.
///
/// [`set_position`]: Lexer::set_position
pub(crate) struct Lexer<'s> {
    text: &'s str,
    language: Language,
    /// Ordered, non-overlapping, non-empty. Tokens never cross a boundary.
    ranges: Vec<Range>,
    range_index: usize,
    pos: u32,
    point: Point,
}

impl<'s> Lexer<'s> {
    pub fn new(text: &'s str, language: Language, included_ranges: &[Range]) -> Lexer<'s> {
        let ranges = if included_ranges.is_empty() {
            let len = Length::of_text(text);
            vec![Range::new(0, len.bytes, Point::ZERO, Point::ZERO.advanced_by(len))]
        } else {
            included_ranges.to_vec()
        };
        // Start at the very beginning of the text: the jump into the first
        // included range becomes the first token's padding, so the root
        // still spans the included ranges.
        Lexer {
            text,
            language,
            ranges,
            range_index: 0,
            pos: 0,
            point: Point::ZERO,
        }
    }

    pub fn position(&self) -> (u32, Point) {
        (self.pos, self.point)
    }

    /// Jump to an absolute position. `point` must be the point form of
    /// `byte`; the parser derives both from reused token extents.
    pub fn set_position(&mut self, byte: u32, point: Point) {
        self.pos = byte;
        self.point = point;
        self.range_index = self.ranges.partition_point(|r| r.end_byte <= byte);
    }

    /// Advance into the next included range if the current one is exhausted.
    /// Returns false at the end of the final range.
    fn align_to_range(&mut self) -> bool {
        loop {
            let Some(range) = self.ranges.get(self.range_index) else {
                return false;
            };
            if self.pos < range.start_byte {
                self.pos = range.start_byte;
                self.point = range.start_point;
            }
            if self.pos < range.end_byte {
                return true;
            }
            self.range_index += 1;
        }
    }

    /// Produce the next token, or `None` at the end of input.
    pub fn next_token(
        &mut self,
        valid_externals: &[bool],
        scanner: Option<&mut dyn ExternalScanner>,
    ) -> Option<Token> {
        let (gap_byte, gap_point) = (self.pos, self.point);
        if !self.align_to_range() {
            return None;
        }
        // Any jump across an excluded region becomes the token's padding.
        let padding = Length::new(
            self.pos - gap_byte,
            crate::reuse::extent_between(gap_point, self.point),
        );
        let range_end = self.ranges[self.range_index].end_byte as usize;
        let start = self.pos as usize;

        if let Some(scanner) = scanner
            && valid_externals.iter().any(|&v| v)
            && let Some(external) = scanner.scan(self.text, start, valid_externals)
        {
            let symbol = self.language.external_symbols()[external.index];
            let end = (start + external.len as usize).min(range_end);
            return Some(self.emit(symbol, padding, start, end, false));
        }

        // Zero-length matches are rejected so the lexer always advances.
        let table = self.language.lex_table();
        if let Some(scan) = table.scan(self.text.as_bytes(), start, range_end)
            && scan.len > 0
        {
            let symbol = scan.symbol;
            return Some(self.emit(symbol, padding, start, start + scan.len as usize, false));
        }

        // No terminal matches here. Walk forward a character at a time until
        // one does (or the range ends) and hand back the skipped bytes as a
        // single garbage token.
        let mut end = start;
        while end < range_end {
            let step = self.text[end..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            end += step;
            if end < range_end
                && table
                    .scan(self.text.as_bytes(), end, range_end)
                    .is_some_and(|s| s.len > 0)
            {
                break;
            }
        }
        tracing::trace!(start, len = end - start, "coalesced unrecognized bytes");
        Some(self.emit(self.language.error_symbol(), padding, start, end, true))
    }

    fn emit(
        &mut self,
        symbol: SymbolId,
        padding: Length,
        start: usize,
        end: usize,
        garbage: bool,
    ) -> Token {
        let len = Length::of_text(&self.text[start..end]);
        let token = Token {
            symbol,
            padding,
            len,
            is_extra: !garbage && self.language.is_extra(symbol),
            is_garbage: garbage,
        };
        self.pos = end as u32;
        self.point = self.point.advanced_by(len);
        token
    }
}
