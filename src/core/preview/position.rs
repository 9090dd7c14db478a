//! Coordinate systems used by the cursor renderer
//!
//! Three kinds of positions meet here:
//! - [`Position`] / [`Range`]: 0-based host-document coordinates, as the
//!   editor reports them.
//! - [`LocalPosition`]: 0-based coordinates relative to a math snippet's text.
//! - [`SourcePos`] / [`Location`]: 1-based line/column spans produced by the
//!   parser over the snippet text.
//!
//! Host and local coordinates are only ever converted through [`to_local`]
//! and [`to_host`].

use serde::{Deserialize, Serialize};

/// 0-based position in the host document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// Range in the host document, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Inclusive containment, as editors define it
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Containment excluding both boundaries
    pub fn strictly_contains(&self, pos: Position) -> bool {
        self.start < pos && pos < self.end
    }
}

/// 0-based position relative to a snippet's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct LocalPosition {
    pub line: usize,
    pub character: usize,
}

impl LocalPosition {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    /// Same point in the parser's 1-based line/column space
    pub fn to_source(self) -> SourcePos {
        SourcePos {
            line: self.line + 1,
            column: self.character + 1,
        }
    }
}

/// 1-based line/column, as reported by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Normalize to 0-based snippet coordinates
    pub fn to_local(self) -> LocalPosition {
        LocalPosition {
            line: self.line.saturating_sub(1),
            character: self.column.saturating_sub(1),
        }
    }
}

/// A node's span. `end` points one column past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl Location {
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        Self { start, end }
    }

    /// Single-line span, 1-based columns
    pub fn on_line(line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            start: SourcePos::new(line, start_column),
            end: SourcePos::new(line, end_column),
        }
    }

    /// Both ends inclusive, so a position just past the last character still
    /// belongs to the node.
    pub fn contains(&self, pos: SourcePos) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// Map a host cursor into the snippet starting at `snippet_range.start`.
///
/// Only the snippet's first line is shifted horizontally. `None` when the
/// cursor lies before the snippet start; positions past its end are kept and
/// simply match no node downstream.
pub fn to_local(host_cursor: Position, snippet_range: &Range) -> Option<LocalPosition> {
    let line = host_cursor.line.checked_sub(snippet_range.start.line)?;
    let character = if line == 0 {
        host_cursor
            .character
            .checked_sub(snippet_range.start.character)?
    } else {
        host_cursor.character
    };
    Some(LocalPosition { line, character })
}

/// Inverse of [`to_local`]
pub fn to_host(local: LocalPosition, snippet_range: &Range) -> Position {
    let line = snippet_range.start.line + local.line;
    let character = if local.line == 0 {
        snippet_range.start.character + local.character
    } else {
        local.character
    };
    Position { line, character }
}
