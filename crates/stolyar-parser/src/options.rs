//! Parser configuration.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use stolyar_core::Range;

/// Default cap on concurrent parse stacks.
pub const DEFAULT_MAX_FORKS: usize = 6;

/// Included ranges must be ordered, non-overlapping and non-empty.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("included ranges must be ordered, non-overlapping and non-empty")]
pub struct IncludedRangesError;

/// Knobs for a [`Parser`](crate::Parser), builder style.
///
/// ```
/// use stolyar_parser::ParseOptions;
///
/// let options = ParseOptions::new().timeout_micros(10_000).max_forks(4);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub(crate) timeout_micros: Option<u64>,
    pub(crate) cancellation_flag: Option<Arc<AtomicUsize>>,
    pub(crate) included_ranges: Vec<Range>,
    pub(crate) max_forks: usize,
}

impl ParseOptions {
    pub fn new() -> ParseOptions {
        ParseOptions {
            timeout_micros: None,
            cancellation_flag: None,
            included_ranges: Vec::new(),
            max_forks: DEFAULT_MAX_FORKS,
        }
    }

    /// Abort parsing after this many microseconds. Zero disables the limit.
    pub fn timeout_micros(mut self, micros: u64) -> ParseOptions {
        self.timeout_micros = if micros == 0 { None } else { Some(micros) };
        self
    }

    /// Abort parsing when the flag becomes non-zero. The flag is polled at
    /// token granularity, so cancellation is prompt but not instantaneous.
    pub fn cancellation_flag(mut self, flag: Arc<AtomicUsize>) -> ParseOptions {
        self.cancellation_flag = Some(flag);
        self
    }

    /// Cap on concurrent parse stacks during ambiguity.
    pub fn max_forks(mut self, max_forks: usize) -> ParseOptions {
        self.max_forks = max_forks.max(1);
        self
    }

    /// Restrict parsing to the given ranges of the document.
    pub fn included_ranges(mut self, ranges: Vec<Range>) -> Result<ParseOptions, IncludedRangesError> {
        validate_ranges(&ranges)?;
        self.included_ranges = ranges;
        Ok(self)
    }
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions::new()
    }
}

pub(crate) fn validate_ranges(ranges: &[Range]) -> Result<(), IncludedRangesError> {
    for pair in ranges.windows(2) {
        if pair[0].end_byte > pair[1].start_byte {
            return Err(IncludedRangesError);
        }
    }
    if ranges.iter().any(|r| r.start_byte >= r.end_byte) {
        return Err(IncludedRangesError);
    }
    Ok(())
}
