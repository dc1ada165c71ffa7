//! Source locations

use serde::{Deserialize, Serialize};

/// A range of characters in descriptor source
///
/// Offsets are character indices (not bytes). `line` and `column` are
/// 1-based and describe the start of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span used for synthesized nodes
    pub fn dummy() -> Self {
        Self::new(0, 0, 1, 1)
    }

    /// Combine two spans, keeping the start location of `self`
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_first_location() {
        let a = Span::new(4, 8, 2, 5);
        let b = Span::new(10, 14, 3, 1);
        let merged = a.merge(b);
        assert_eq!(merged.start, 4);
        assert_eq!(merged.end, 14);
        assert_eq!(merged.line, 2);
        assert_eq!(merged.column, 5);
        assert_eq!(merged.len(), 10);
    }
}
