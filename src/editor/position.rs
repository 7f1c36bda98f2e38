//! Cursor positions and ranges
//!
//! Positions are 1-based `(line, column)` pairs, matching what text widgets
//! report. Columns count characters, not bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, character offset)
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open range `[start, end)` in the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Range covering `[left, right)` on a single line
    pub fn on_line(line: usize, left: usize, right: usize) -> Self {
        Self::new(Position::new(line, left), Position::new(line, right))
    }

    /// Empty range at a position
    pub fn caret(position: Position) -> Self {
        Self { start: position, end: position }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes_order() {
        let range = Range::new(Position::new(2, 5), Position::new(1, 3));
        assert_eq!(range.start, Position::new(1, 3));
        assert_eq!(range.end, Position::new(2, 5));
    }

    #[test]
    fn test_position_ordering_is_line_major() {
        assert!(Position::new(1, 40) < Position::new(2, 1));
        assert!(Position::new(3, 2) < Position::new(3, 7));
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let range = Range::on_line(1, 5, 8);
        assert!(range.contains(Position::new(1, 5)));
        assert!(range.contains(Position::new(1, 7)));
        assert!(!range.contains(Position::new(1, 8)));
    }
}
