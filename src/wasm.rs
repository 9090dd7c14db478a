//! WASM bindings for texassist
//!
//! JavaScript-accessible entry points for the preview cursor and argument
//! completion. Parsing runs synchronously on the calling thread.

#[cfg(feature = "wasm")]
use std::sync::Arc;

#[cfg(feature = "wasm")]
use indexmap::IndexMap;
#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::core::completion::{
    argument_index, ArgumentCompleter, CompletionContext, CompletionItem, CompletionSource,
    PackageCatalog, PackageData,
};
#[cfg(feature = "wasm")]
use crate::core::preview::document::{is_cursor_in_tex_command, TextDocument};
#[cfg(feature = "wasm")]
use crate::core::preview::parser::MitexMathParser;
#[cfg(feature = "wasm")]
use crate::core::preview::position::{Position, Range};
#[cfg(feature = "wasm")]
use crate::core::preview::{insert_cursor_blocking, is_cursor_inside_tex_math, TexMath};
#[cfg(feature = "wasm")]
use crate::utils::config::{CompletionConfig, PreviewConfig};

/// Cursor render request (exposed to WASM)
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorRequest {
    /// TeX source of the math snippet
    pub tex_string: String,
    /// Snippet range in the host document
    pub range: Range,
    /// Host cursor, if the editor has one
    #[serde(default)]
    pub cursor: Option<Position>,
    /// Text of the cursor's line, for the command-token check
    #[serde(default)]
    pub cursor_line: Option<String>,
    /// Color used when the configured color is `"auto"`
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default)]
    pub config: PreviewConfig,
}

/// Key-value completion request (exposed to WASM)
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// Full text of the cursor's line
    pub line: String,
    /// Cursor column, in chars
    pub character: usize,
    #[serde(default = "default_lang_id")]
    pub lang_id: String,
    /// Package data keyed by package name
    #[serde(default)]
    pub packages: IndexMap<String, PackageData>,
    /// Packages the document loads, in order
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub config: CompletionConfig,
}

/// Render result with error metadata
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct RenderResult {
    pub output: String,
    pub success: bool,
    pub error: Option<String>,
}

#[cfg(feature = "wasm")]
fn default_theme_color() -> String {
    "#000000".to_string()
}

#[cfg(feature = "wasm")]
fn default_lang_id() -> String {
    "latex".to_string()
}

/// Serialize a value to JsValue, returning an error object on failure.
#[cfg(feature = "wasm")]
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let error_obj = RenderResult {
            output: String::new(),
            success: false,
            error: Some(format!("Serialization error: {}", e)),
        };
        serde_wasm_bindgen::to_value(&error_obj).unwrap_or(JsValue::NULL)
    })
}

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Insert the cursor marker into a math snippet
///
/// # Arguments
/// * `request` - a `CursorRequest` object
///
/// # Returns
/// A `RenderResult`; `output` is the snippet, with the marker when one fits
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "insertCursor")]
pub fn insert_cursor_wasm(request: JsValue) -> JsValue {
    let request: CursorRequest = match serde_wasm_bindgen::from_value(request) {
        Ok(request) => request,
        Err(e) => {
            return to_js_value(&RenderResult {
                output: String::new(),
                success: false,
                error: Some(format!("Invalid request: {}", e)),
            })
        }
    };
    let tex_math = TexMath::new(request.tex_string, request.range);
    let unchanged = |tex_math: TexMath| RenderResult {
        output: tex_math.tex_string,
        success: true,
        error: None,
    };

    let config = &request.config;
    let Some(cursor) = request.cursor.filter(|_| config.cursor_enabled) else {
        return to_js_value(&unchanged(tex_math));
    };
    if !is_cursor_inside_tex_math(&tex_math.range, cursor) {
        return to_js_value(&unchanged(tex_math));
    }
    if let Some(line) = &request.cursor_line {
        let document = TextDocument::new(line);
        if is_cursor_in_tex_command(&document, Position::new(0, cursor.character)) {
            return to_js_value(&unchanged(tex_math));
        }
    }

    let parser = MitexMathParser::new().with_text_commands(config.text_commands.clone());
    let output = insert_cursor_blocking(
        &parser,
        &tex_math,
        cursor,
        &config.marker(&request.theme_color),
        &config.filler,
    );
    to_js_value(&RenderResult {
        output,
        success: true,
        error: None,
    })
}

/// 0-based argument index at the end of `arguments`, or -1 when the
/// delimiters do not balance
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "argumentIndex")]
pub fn argument_index_wasm(arguments: &str) -> i32 {
    argument_index(arguments)
        .ok()
        .and_then(|index| i32::try_from(index).ok())
        .unwrap_or(-1)
}

/// Key-value candidates for the argument slot at the cursor
///
/// # Arguments
/// * `request` - a `CompletionRequest` object
///
/// # Returns
/// An array of `{label, kind, insertText}` items (empty on bad input)
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "keyvalCandidates")]
pub fn keyval_candidates_wasm(request: JsValue) -> JsValue {
    let request: CompletionRequest = match serde_wasm_bindgen::from_value(request) {
        Ok(request) => request,
        Err(_) => return to_js_value(&Vec::<CompletionItem>::new()),
    };
    let catalog = PackageCatalog::in_memory();
    for (name, data) in request.packages {
        catalog.insert_package(name, data);
    }
    for name in request.included {
        catalog.include(name, Vec::new());
    }
    let completer = ArgumentCompleter::new(Arc::new(catalog), request.config);
    let items = completer.complete(&CompletionContext::new(
        request.line,
        request.character,
        request.lang_id,
    ));
    to_js_value(&items)
}

/// Get version information
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
