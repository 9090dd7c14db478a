//! # texassist
//!
//! Editing assistance for LaTeX documents:
//!
//! - **Preview cursor**: splices a colored marker into the TeX source of a
//!   math environment so the rendered hover preview shows where the editor
//!   cursor is ([`CursorRenderer`]).
//! - **Argument completion**: finds the argument slot the cursor is in and
//!   offers the key-value options a package defines for it
//!   ([`ArgumentCompleter`]).
//!
//! ## Example
//!
//! ```no_run
//! use texassist::{CursorRenderer, PreviewConfig, Position, Range, TexMath, TextDocument};
//!
//! # async fn demo() -> texassist::AssistResult<()> {
//! let source = "$x^{2}$";
//! let renderer = CursorRenderer::with_mitex(PreviewConfig::default());
//! let math = TexMath::new("x^{2}", Range::new(Position::new(0, 1), Position::new(0, 6)));
//! let rendered = renderer
//!     .render_cursor(&TextDocument::new(source), &math, Some(Position::new(0, 5)), "#000000")
//!     .await?;
//! assert_eq!(rendered, "x^{~2{\\color{#000000}\\ddagger}~}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod utils;

pub mod wasm;

pub use crate::core::completion::{
    argument_index, ArgumentCompleter, ArgumentInvocation, ArgumentScanError, Catalog,
    CompletionContext, CompletionItem, CompletionSource, PackageCatalog,
};
pub use crate::core::preview::document::{HostDocument, TextDocument};
pub use crate::core::preview::parser::{MathParser, MitexMathParser};
pub use crate::core::preview::position::{Position, Range};
pub use crate::core::preview::{CursorRenderer, TexMath};
pub use utils::{AssistConfig, AssistError, AssistResult, CompletionConfig, PreviewConfig};
