//! Which argument slot of a command the cursor is in

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Command name, then the argument groups typed so far ending in an
    /// open `[` or `{` that runs to the end of the text.
    static ref INVOCATION: Regex = Regex::new(
        r"\\([a-zA-Z]+)\*?((?:\[[^\[\]]*\]|\{[^{}]*\})*[\[{][^\[\]{}]*)$"
    )
    .expect("invocation pattern is valid");
    static ref ENVIRONMENT_NAME: Regex =
        Regex::new(r"\{(.*?)\}").expect("environment name pattern is valid");
}

/// Argument text with more closing than opening delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArgumentScanError {
    #[error("unbalanced '{delimiter}' at character {position}")]
    Unbalanced { position: usize, delimiter: char },
}

/// Depth counters carried through one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgumentScanState {
    pub argument_index: usize,
    pub curly_depth: i32,
    pub square_depth: i32,
}

impl ArgumentScanState {
    /// Depths seeded from the first character of the argument text
    fn seeded(first: Option<char>) -> Self {
        Self {
            argument_index: 0,
            curly_depth: i32::from(first == Some('{')),
            square_depth: i32::from(first == Some('[')),
        }
    }

    fn at_top_level(&self) -> bool {
        self.curly_depth == 0 && self.square_depth == 0
    }
}

/// 0-based index of the argument group open at the end of `argument_text`.
///
/// The first character only seeds the depth. A character right after a
/// backslash is never a delimiter. Each `}` or `]` that brings both depths
/// back to zero closes one group.
pub fn argument_index(argument_text: &str) -> Result<usize, ArgumentScanError> {
    let chars: Vec<char> = argument_text.chars().collect();
    let mut state = ArgumentScanState::seeded(chars.first().copied());

    for index in 1..chars.len() {
        if chars[index - 1] == '\\' {
            continue;
        }
        let ch = chars[index];
        match ch {
            '{' => state.curly_depth += 1,
            '[' => state.square_depth += 1,
            '}' | ']' => {
                if ch == '}' {
                    state.curly_depth -= 1;
                } else {
                    state.square_depth -= 1;
                }
                if state.curly_depth < 0 || state.square_depth < 0 {
                    return Err(ArgumentScanError::Unbalanced {
                        position: index,
                        delimiter: ch,
                    });
                }
                if state.at_top_level() {
                    state.argument_index += 1;
                }
            }
            _ => {}
        }
    }
    Ok(state.argument_index)
}

/// A command or environment invocation being typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentInvocation {
    /// Command name without backslash (`begin` for environments)
    pub command: String,
    /// Everything from the first argument delimiter to the cursor
    pub arguments: String,
}

impl ArgumentInvocation {
    pub fn new(command: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments: arguments.into(),
        }
    }

    /// Pull the invocation out of the text before the cursor, if the cursor
    /// sits inside an argument group.
    pub fn from_line_prefix(prefix: &str) -> Option<Self> {
        let caps = INVOCATION.captures(prefix)?;
        Some(Self::new(&caps[1], &caps[2]))
    }

    /// Environment name for a `\begin{name}...` invocation
    pub fn environment(&self) -> Option<&str> {
        if self.command != "begin" {
            return None;
        }
        ENVIRONMENT_NAME
            .captures(&self.arguments)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_groups_are_counted() {
        assert_eq!(argument_index("{a}{b}"), Ok(2));
        assert_eq!(argument_index("{a}{b"), Ok(1));
        assert_eq!(argument_index("{"), Ok(0));
        assert_eq!(argument_index(""), Ok(0));
    }

    #[test]
    fn test_optional_and_mandatory_mix() {
        assert_eq!(argument_index("[width=2cm]{"), Ok(1));
        assert_eq!(argument_index("{tabular}[t]{"), Ok(2));
        assert_eq!(argument_index("[a]["), Ok(1));
    }

    #[test]
    fn test_nested_groups_close_once() {
        assert_eq!(argument_index("{a{b}c}{"), Ok(1));
        assert_eq!(argument_index("[a={x}]{"), Ok(1));
    }

    #[test]
    fn test_escaped_delimiters_are_ignored() {
        assert_eq!(argument_index(r"{a\}b}{"), Ok(1));
        assert_eq!(argument_index(r"{\{}{"), Ok(1));
    }

    #[test]
    fn test_unbalanced_input_is_an_error() {
        assert_eq!(
            argument_index("{a}}"),
            Err(ArgumentScanError::Unbalanced {
                position: 3,
                delimiter: '}'
            })
        );
        assert!(argument_index("a]").is_err());
    }

    #[test]
    fn test_invocation_from_line_prefix() {
        let inv = ArgumentInvocation::from_line_prefix(r"see \includegraphics[wid").unwrap();
        assert_eq!(inv, ArgumentInvocation::new("includegraphics", "[wid"));

        let inv = ArgumentInvocation::from_line_prefix(r"\begin{tabular}{").unwrap();
        assert_eq!(inv.command, "begin");
        assert_eq!(inv.arguments, "{tabular}{");
        assert_eq!(inv.environment(), Some("tabular"));

        assert!(ArgumentInvocation::from_line_prefix(r"\alpha + b").is_none());
        assert!(ArgumentInvocation::from_line_prefix(r"\frac{a}{b} + c").is_none());
    }

    #[test]
    fn test_environment_only_for_begin() {
        let inv = ArgumentInvocation::new("usepackage", "{tikz}");
        assert_eq!(inv.environment(), None);
    }
}
