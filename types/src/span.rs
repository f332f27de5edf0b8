//! Source coordinates.
//!
//! Front-ends report 1-based, inclusive-start spans ([`SourceSpan`]); the
//! rendering side speaks 0-based positions ([`Position`], [`Range`]).

use serde::{Deserialize, Serialize};

/// A span as reported by a front-end: 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceSpan {
    #[must_use]
    pub const fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Convert to a 0-based range. Every coordinate drops by one.
    ///
    /// A coordinate of 0 is out of contract for a 1-based reporter; it clamps
    /// to 0 rather than wrapping.
    #[must_use]
    pub const fn to_range(self) -> Range {
        Range::new(
            Position::new(
                self.start_line.saturating_sub(1),
                self.start_column.saturating_sub(1),
            ),
            Position::new(
                self.end_line.saturating_sub(1),
                self.end_column.saturating_sub(1),
            ),
        )
    }
}

/// A 0-based position. Serializes with LSP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A 0-based range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_range_subtracts_one_everywhere() {
        let range = SourceSpan::new(3, 7, 4, 2).to_range();
        assert_eq!(range.start, Position::new(2, 6));
        assert_eq!(range.end, Position::new(3, 1));
    }

    #[test]
    fn test_to_range_first_character() {
        let range = SourceSpan::new(1, 1, 1, 2).to_range();
        assert_eq!(range, Range::new(Position::new(0, 0), Position::new(0, 1)));
    }

    #[test]
    fn test_to_range_zero_coordinates_clamp() {
        let range = SourceSpan::new(0, 0, 0, 0).to_range();
        assert_eq!(range, Range::new(Position::new(0, 0), Position::new(0, 0)));
    }

    #[test]
    fn test_range_serializes_lsp_shape() {
        let range = Range::new(Position::new(0, 0), Position::new(0, 1));
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start": { "line": 0, "character": 0 },
                "end": { "line": 0, "character": 1 }
            })
        );
    }
}
