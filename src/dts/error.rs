//! Parse error type with source positions
//!
//! Every decoding failure in this crate carries the span of the syntax node
//! that caused it, so callers can highlight the offending text.

use std::fmt;

use thiserror::Error;
use tree_sitter::{Node, Point};

/// A 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl From<Point> for Position {
    fn from(point: Point) -> Self {
        // tree-sitter points are 0-based
        Self {
            line: point.row + 1,
            column: point.column + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span between two positions in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn of(node: &Node) -> Self {
        Self {
            start: node.start_position().into(),
            end: node.end_position().into(),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            if self.start.column + 1 >= self.end.column {
                return write!(f, "{}", self.start);
            }

            return write!(f, "{}-{}", self.start, self.end.column);
        }

        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Indicates a failure to parse part of the code and where the error occurred.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at {range}")]
pub struct ParseError {
    pub message: String,
    pub range: Range,
}

impl ParseError {
    /// An error spanning the given syntax node.
    pub fn new(node: &Node, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            range: Range::of(node),
        }
    }

    /// An error with an explicit span, for failures not tied to a node.
    pub fn with_range(range: Range, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}
