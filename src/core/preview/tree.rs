//! Owned syntax tree over a math snippet
//!
//! The parser adapter lowers `mitex-parser`'s lossless tree into this shape:
//! only nodes the cursor renderer cares about, each with a 1-based span.

use super::position::Location;

/// Delimiters of a bracketed group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `{ ... }`
    Brace,
    /// `[ ... ]`
    Bracket,
    /// `( ... )`
    Paren,
    /// `\left ... \right`
    LeftRight,
}

/// What a node is, as far as cursor placement is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A control sequence such as `\frac`, without the backslash
    Command { name: String },
    /// A command whose argument is prose (`\text`, `\mbox`, ...)
    TextCommand { name: String },
    /// `_` with its script argument
    Subscript,
    /// `^` with its script argument
    Superscript,
    /// Bracketed group
    Group(Delimiter),
    /// `\begin{name} ... \end{name}`
    Environment { name: String },
    /// `$...$`, `$$...$$`, `\(...\)` or `\[...\]`
    Formula { display: bool },
    /// Alignment tab `&` or row break `\\`
    Separator,
    /// A math character, or a whole word when character locations are off
    Leaf { text: String },
}

impl NodeKind {
    pub fn is_command(&self) -> bool {
        matches!(self, NodeKind::Command { .. })
    }

    pub fn is_text_command(&self) -> bool {
        matches!(self, NodeKind::TextCommand { .. })
    }
}

/// A node of the snippet tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathNode {
    pub kind: NodeKind,
    pub location: Option<Location>,
    pub content: Vec<MathNode>,
}

impl MathNode {
    pub fn new(kind: NodeKind, location: Option<Location>, content: Vec<MathNode>) -> Self {
        Self {
            kind,
            location,
            content,
        }
    }

    pub fn leaf(text: impl Into<String>, location: Location) -> Self {
        Self::new(
            NodeKind::Leaf { text: text.into() },
            Some(location),
            Vec::new(),
        )
    }

    pub fn command(name: impl Into<String>, location: Location, args: Vec<MathNode>) -> Self {
        Self::new(
            NodeKind::Command { name: name.into() },
            Some(location),
            args,
        )
    }

    pub fn text_command(
        name: impl Into<String>,
        location: Location,
        args: Vec<MathNode>,
    ) -> Self {
        Self::new(
            NodeKind::TextCommand { name: name.into() },
            Some(location),
            args,
        )
    }

    pub fn group(delimiter: Delimiter, location: Location, content: Vec<MathNode>) -> Self {
        Self::new(NodeKind::Group(delimiter), Some(location), content)
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Parse result for one snippet. The root itself has no span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    pub content: Vec<MathNode>,
}

impl SyntaxTree {
    pub fn new(content: Vec<MathNode>) -> Self {
        Self { content }
    }

    /// Number of nodes in the tree, root excluded
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[MathNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.content)).sum()
        }
        count(&self.content)
    }
}
