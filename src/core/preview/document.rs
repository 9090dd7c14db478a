//! Host document access and the command-token check

use lazy_static::lazy_static;
use regex::Regex;

use super::position::{Position, Range};

lazy_static! {
    /// `\begin{..}`, `\end{..}`, `\label{..}`, `\cmd{`, `\(`, `\)`, `\[`, `\]`, `\\`
    static ref COMMAND_TOKEN: Regex =
        Regex::new(r"\\(?:begin|end|label)\{.*?\}|\\[a-zA-Z]+\{?|\\[()\[\]]|\\\\")
            .expect("command token pattern is valid");
}

/// The slice of an editor's document API the renderer needs
pub trait HostDocument {
    /// Range of the `pattern` match on `position`'s line that touches
    /// `position` (boundaries included), if any.
    fn word_range_at(&self, position: Position, pattern: &Regex) -> Option<Range>;
}

/// Plain in-memory document
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    lines: Vec<String>,
}

impl TextDocument {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(String::as_str)
    }
}

impl HostDocument for TextDocument {
    fn word_range_at(&self, position: Position, pattern: &Regex) -> Option<Range> {
        let line = self.line(position.line)?;
        pattern.find_iter(line).find_map(|m| {
            let start = line[..m.start()].chars().count();
            let end = start + m.as_str().chars().count();
            (start <= position.character && position.character <= end).then(|| {
                Range::new(
                    Position::new(position.line, start),
                    Position::new(position.line, end),
                )
            })
        })
    }
}

/// Whether `cursor` sits strictly inside a command-like token such as
/// `\begin{...}`, `\frac{` or `\\`.
pub fn is_cursor_in_tex_command(document: &dyn HostDocument, cursor: Position) -> bool {
    document
        .word_range_at(cursor, &COMMAND_TOKEN)
        .map_or(false, |r| r.start < cursor && cursor < r.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_command(line: &str, character: usize) -> bool {
        is_cursor_in_tex_command(&TextDocument::new(line), Position::new(0, character))
    }

    #[test]
    fn test_inside_command_name() {
        assert!(in_command(r"a + \alpha + b", 6));
        assert!(in_command(r"\frac{a}{b}", 3));
        // The opening brace belongs to the token.
        assert!(in_command(r"\frac{a}{b}", 5));
    }

    #[test]
    fn test_token_boundaries_do_not_count() {
        assert!(!in_command(r"a + \alpha + b", 4));
        assert!(!in_command(r"a + \alpha + b", 10));
    }

    #[test]
    fn test_environment_and_delimiters() {
        assert!(in_command(r"\begin{align}", 8));
        assert!(in_command(r"\[ x \]", 1));
        assert!(in_command(r"a \\ b", 3));
        assert!(!in_command(r"x^{2}", 3));
    }

    #[test]
    fn test_word_range_reports_char_columns() {
        let doc = TextDocument::new("αβ \\beta");
        let range = doc
            .word_range_at(Position::new(0, 5), &COMMAND_TOKEN)
            .unwrap();
        assert_eq!(range.start, Position::new(0, 3));
        assert_eq!(range.end, Position::new(0, 8));
    }
}
