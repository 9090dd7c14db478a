//! Configuration for the preview cursor and argument completion
//!
//! Mirrors the editor settings the host would otherwise hand us one key at
//! a time (`hover.preview.cursor.*`, `intellisense.argumentHint.enabled`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::AssistResult;

/// Marker color value meaning "use the caller's theme color"
pub const AUTO_COLOR: &str = "auto";

/// Settings for the math-preview cursor marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreviewConfig {
    /// Render a cursor marker at all
    /// Default: true
    pub cursor_enabled: bool,

    /// TeX source of the marker glyph
    /// Default: `\ddagger`
    pub cursor_symbol: String,

    /// Marker color, or `"auto"` to follow the hover's text color
    /// Default: `"auto"`
    pub cursor_color: String,

    /// Neutral character placed next to reused or inserted braces
    /// Default: `~`
    pub filler: String,

    /// Extra commands whose argument is prose rather than math
    /// (added to the built-in `\text`, `\mbox`, ... set)
    pub text_commands: Vec<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cursor_enabled: true,
            cursor_symbol: "\\ddagger".to_string(),
            cursor_color: AUTO_COLOR.to_string(),
            filler: "~".to_string(),
            text_commands: Vec::new(),
        }
    }
}

impl PreviewConfig {
    /// Create new settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with the cursor marker switched off
    pub fn disabled() -> Self {
        Self {
            cursor_enabled: false,
            ..Self::default()
        }
    }

    /// Build the marker string spliced into the snippet.
    ///
    /// `theme_color` is used when the configured color is `"auto"`.
    pub fn marker(&self, theme_color: &str) -> String {
        let color = if self.cursor_color == AUTO_COLOR {
            theme_color
        } else {
            self.cursor_color.as_str()
        };
        format!("{{\\color{{{}}}{}}}", color, self.cursor_symbol)
    }
}

/// Settings for argument completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionConfig {
    /// Keep `${n:hint}` placeholders in inserted snippets
    /// Default: true
    pub argument_hint: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            argument_hint: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub preview: PreviewConfig,
    pub completion: CompletionConfig,
}

impl AssistConfig {
    /// Decode a JSON configuration document. Missing keys take their defaults.
    pub fn from_json_str(input: &str) -> AssistResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and decode a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> AssistResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_uses_theme_color_when_auto() {
        let config = PreviewConfig::default();
        assert_eq!(config.marker("#ff0000"), "{\\color{#ff0000}\\ddagger}");
    }

    #[test]
    fn test_marker_uses_configured_color() {
        let config = PreviewConfig {
            cursor_color: "blue".to_string(),
            cursor_symbol: "|".to_string(),
            ..PreviewConfig::default()
        };
        assert_eq!(config.marker("#ff0000"), "{\\color{blue}|}");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AssistConfig::from_json_str(r#"{"preview": {"cursorSymbol": "|"}}"#).unwrap();
        assert_eq!(config.preview.cursor_symbol, "|");
        assert!(config.preview.cursor_enabled);
        assert_eq!(config.preview.filler, "~");
        assert!(config.completion.argument_hint);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = AssistConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }
}
