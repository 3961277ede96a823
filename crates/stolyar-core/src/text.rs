//! Source positions and spans.
//!
//! Subtrees store [`Length`]s (relative extents) rather than absolute
//! positions, so everything after an edit shifts implicitly. Absolute
//! [`Point`]s are accumulated during traversal.

use serde::{Deserialize, Serialize};

/// A row/column position. Rows and columns are zero-based; columns count bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Position after appending text with the given extent.
    pub fn advanced_by(self, len: Length) -> Point {
        if len.extent.row == 0 {
            Point::new(self.row, self.column + len.extent.column)
        } else {
            Point::new(self.row + len.extent.row, len.extent.column)
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// Byte count plus point extent of a span of text.
///
/// `extent.row` is the number of newlines in the span; `extent.column` is the
/// byte width of the last line (of the whole span when it has no newlines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Length {
    pub bytes: u32,
    pub extent: Point,
}

impl Length {
    pub const ZERO: Length = Length {
        bytes: 0,
        extent: Point::ZERO,
    };

    pub fn new(bytes: u32, extent: Point) -> Self {
        Self { bytes, extent }
    }

    /// Measure a text slice.
    pub fn of_text(text: &str) -> Length {
        let mut rows = 0u32;
        let mut last_line_start = 0usize;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                rows += 1;
                last_line_start = i + 1;
            }
        }
        Length {
            bytes: text.len() as u32,
            extent: Point::new(rows, (text.len() - last_line_start) as u32),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.bytes == 0
    }
}

impl std::ops::Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length {
            bytes: self.bytes + rhs.bytes,
            extent: if rhs.extent.row == 0 {
                Point::new(self.extent.row, self.extent.column + rhs.extent.column)
            } else {
                Point::new(self.extent.row + rhs.extent.row, rhs.extent.column)
            },
        }
    }
}

impl std::ops::AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        *self = *self + rhs;
    }
}

/// A contiguous region of source, in both byte and point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_byte: u32,
    pub end_byte: u32,
    pub start_point: Point,
    pub end_point: Point,
}

impl Range {
    pub fn new(start_byte: u32, end_byte: u32, start_point: Point, end_point: Point) -> Self {
        Self {
            start_byte,
            end_byte,
            start_point,
            end_point,
        }
    }

    /// Full-document range for text of the given length.
    pub fn covering(len: Length) -> Self {
        Self {
            start_byte: 0,
            end_byte: len.bytes,
            start_point: Point::ZERO,
            end_point: Point::ZERO.advanced_by(len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte >= self.end_byte
    }

    pub fn contains_byte(&self, byte: u32) -> bool {
        self.start_byte <= byte && byte < self.end_byte
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

/// A byte-range replacement applied to a syntax tree before reparsing.
///
/// Describes the edit `[start_byte, old_end_byte)` → `[start_byte, new_end_byte)`
/// with the corresponding point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEdit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Byte growth (may be negative) introduced by the edit.
    pub fn byte_delta(&self) -> i64 {
        self.new_end_byte as i64 - self.old_end_byte as i64
    }
}
