/// One-based line number and column.
///
/// Columns are counted in UTF-16 code units, so a position's column is one
/// more than the number of code units between the start of its line and
/// the position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// One-based line number
    pub line_number: usize,
    /// One-based column number
    pub column: usize,
}

impl Position {
    #[inline]
    pub const fn new(line_number: usize, column: usize) -> Self {
        Self {
            line_number,
            column,
        }
    }
}

impl From<(usize, usize)> for Position {
    fn from((line_number, column): (usize, usize)) -> Self {
        Self {
            line_number,
            column,
        }
    }
}

/// A range of text between two positions, `start` inclusive and `end`
/// exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Builds a range from `(start_line, start_column, end_line, end_column)`.
    #[inline]
    pub const fn from_coords(
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_column),
            end: Position::new(end_line, end_column),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
