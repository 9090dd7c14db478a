//! Error handling for texassist
//!
//! Absent results (no cursor, no containing node, no candidate) are modelled
//! as `Option`s at the call sites. This type covers the cases that really
//! are failures: the parser service erroring out, bad configuration, or a
//! catalog that cannot be read.

use thiserror::Error;

/// Error type shared by the preview and completion paths
#[derive(Debug, Clone, Error)]
pub enum AssistError {
    /// The parser service failed on a snippet
    #[error("{}", format_parse(.message, .line, .column))]
    Parse {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
    /// Package/class data could not be loaded
    #[error("Catalog error for '{package}': {message}")]
    Catalog { package: String, message: String },
    /// Configuration could not be read or decoded
    #[error("Configuration error: {message}")]
    Config { message: String },
    /// IO error (for file operations)
    #[error("IO error: {message}")]
    Io { message: String },
    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_parse(message: &str, line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!("Parse error at line {}, column {}: {}", l, c, message),
        (Some(l), None) => format!("Parse error at line {}: {}", l, message),
        _ => format!("Parse error: {}", message),
    }
}

impl From<std::io::Error> for AssistError {
    fn from(err: std::io::Error) -> Self {
        AssistError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AssistError {
    fn from(err: serde_json::Error) -> Self {
        AssistError::Config {
            message: err.to_string(),
        }
    }
}

/// Result type for texassist operations
pub type AssistResult<T> = Result<T, AssistError>;

// Convenience constructors for errors
impl AssistError {
    pub fn parse(message: impl Into<String>) -> Self {
        AssistError::Parse {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, line: usize, column: usize) -> Self {
        AssistError::Parse {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn catalog(package: impl Into<String>, message: impl Into<String>) -> Self {
        AssistError::Catalog {
            package: package.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AssistError::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = AssistError::parse("unexpected token");
        assert!(err.to_string().contains("Parse error"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_parse_error_with_location() {
        let err = AssistError::parse_at("unexpected token", 10, 5);
        let msg = err.to_string();
        assert!(msg.contains("line 10"));
        assert!(msg.contains("column 5"));
    }

    #[test]
    fn test_catalog_error_names_package() {
        let err = AssistError::catalog("tikz", "missing options");
        let msg = err.to_string();
        assert!(msg.contains("tikz"));
        assert!(msg.contains("missing options"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AssistError = io.into();
        assert!(matches!(err, AssistError::Io { .. }));
        assert!(err.to_string().contains("gone"));
    }
}
