//! Math-preview cursor rendering
//!
//! Given the TeX source of one math environment and the editor cursor, the
//! renderer splices a colored marker into the source so the hover preview
//! shows where the cursor is. The pipeline is:
//!
//! host cursor → [`position::to_local`] → [`cache::SnippetTreeCache`] →
//! [`locate::find_node_at`] → [`placement::decide`] → [`splice::apply`]
//!
//! Every failure to find a safe spot degrades to returning the snippet
//! unchanged.

pub mod cache;
pub mod document;
pub mod locate;
pub mod parser;
pub mod placement;
pub mod position;
pub mod splice;
pub mod tree;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use self::cache::SnippetTreeCache;
use self::document::{is_cursor_in_tex_command, HostDocument};
use self::locate::find_node_at;
use self::parser::{MathParser, MitexMathParser, ParseOptions};
use self::placement::{decide, PlacementDecision};
use self::position::{to_local, Position, Range};
use crate::utils::config::PreviewConfig;
use crate::utils::error::AssistResult;

pub use self::locate::NodeLookup;
pub use self::position::LocalPosition;
pub use self::tree::{MathNode, NodeKind, SyntaxTree};

/// TeX source of one math environment and where it sits in the host document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexMath {
    pub tex_string: String,
    pub range: Range,
}

impl TexMath {
    pub fn new(tex_string: impl Into<String>, range: Range) -> Self {
        Self {
            tex_string: tex_string.into(),
            range,
        }
    }
}

/// Identifies one render request for [`CursorRenderer::render_latest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

/// Renders cursor markers into math snippets.
///
/// Owns the parse cache, so one renderer per editor session keeps the cache
/// shared between all of that session's requests.
pub struct CursorRenderer {
    cache: SnippetTreeCache,
    config: PreviewConfig,
    latest: AtomicU64,
}

impl CursorRenderer {
    pub fn new(parser: Arc<dyn MathParser>, config: PreviewConfig) -> Self {
        Self {
            cache: SnippetTreeCache::with_options(
                parser,
                ParseOptions {
                    math_character_location: true,
                },
            ),
            config,
            latest: AtomicU64::new(0),
        }
    }

    /// Renderer over `mitex-parser`, honoring the configured text commands
    pub fn with_mitex(config: PreviewConfig) -> Self {
        let parser = MitexMathParser::new().with_text_commands(config.text_commands.clone());
        Self::new(Arc::new(parser), config)
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn cache(&self) -> &SnippetTreeCache {
        &self.cache
    }

    /// Full render flow: settings, cursor presence, range and token checks,
    /// then marker insertion. `theme_color` replaces an `"auto"` color.
    pub async fn render_cursor(
        &self,
        document: &dyn HostDocument,
        tex_math: &TexMath,
        cursor: Option<Position>,
        theme_color: &str,
    ) -> AssistResult<String> {
        if !self.config.cursor_enabled {
            return Ok(tex_math.tex_string.clone());
        }
        let Some(cursor) = cursor else {
            return Ok(tex_math.tex_string.clone());
        };
        if !is_cursor_inside_tex_math(&tex_math.range, cursor) {
            return Ok(tex_math.tex_string.clone());
        }
        if is_cursor_in_tex_command(document, cursor) {
            tracing::trace!(?cursor, "cursor inside a command token");
            return Ok(tex_math.tex_string.clone());
        }
        let marker = self.config.marker(theme_color);
        self.insert_cursor(tex_math, cursor, &marker).await
    }

    /// Start a request; any ticket issued earlier becomes stale
    pub fn begin_render(&self) -> RenderTicket {
        RenderTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether no newer request started after `ticket`
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// [`Self::render_cursor`], returning `None` if a newer request began
    /// while this one was parsing.
    pub async fn render_latest(
        &self,
        document: &dyn HostDocument,
        tex_math: &TexMath,
        cursor: Option<Position>,
        theme_color: &str,
    ) -> AssistResult<Option<String>> {
        let ticket = self.begin_render();
        let rendered = self
            .render_cursor(document, tex_math, cursor, theme_color)
            .await?;
        if self.is_current(ticket) {
            Ok(Some(rendered))
        } else {
            tracing::debug!(?ticket, "discarding superseded cursor render");
            Ok(None)
        }
    }

    /// Place `marker` at the host `cursor` inside `tex_math`. A cursor before
    /// the snippet start leaves the text unchanged.
    pub async fn insert_cursor(
        &self,
        tex_math: &TexMath,
        cursor: Position,
        marker: &str,
    ) -> AssistResult<String> {
        let Some(local) = to_local(cursor, &tex_math.range) else {
            tracing::trace!(?cursor, "cursor before the snippet");
            return Ok(tex_math.tex_string.clone());
        };
        let Some(tree) = self.cache.get(&tex_math.tex_string).await? else {
            return Ok(tex_math.tex_string.clone());
        };
        let lookup = find_node_at(&tree, local);
        let decision = decide(lookup.as_ref(), local);
        tracing::debug!(?local, ?decision, "cursor placement");
        Ok(splice::apply(
            &tex_math.tex_string,
            &decision,
            marker,
            &self.config.filler,
        ))
    }

    /// Placement decision for the host `cursor`, without splicing. `None`
    /// for a cursor before the snippet or a snippet that did not parse.
    pub async fn placement(
        &self,
        tex_math: &TexMath,
        cursor: Position,
    ) -> AssistResult<Option<PlacementDecision>> {
        let Some(local) = to_local(cursor, &tex_math.range) else {
            return Ok(None);
        };
        let Some(tree) = self.cache.get(&tex_math.tex_string).await? else {
            return Ok(None);
        };
        let lookup = find_node_at(&tree, local);
        Ok(Some(decide(lookup.as_ref(), local)))
    }
}

/// Inside the range but not on either of its ends
pub fn is_cursor_inside_tex_math(range: &Range, cursor: Position) -> bool {
    range.contains(cursor) && range.start != cursor && range.end != cursor
}

/// Synchronous one-shot render with a fresh `mitex` parse, for hosts without
/// an async runtime.
pub fn insert_cursor_blocking(
    parser: &MitexMathParser,
    tex_math: &TexMath,
    cursor: Position,
    marker: &str,
    filler: &str,
) -> String {
    let Some(local) = to_local(cursor, &tex_math.range) else {
        return tex_math.tex_string.clone();
    };
    let tree = parser.parse_blocking(&tex_math.tex_string, ParseOptions::default());
    let lookup = find_node_at(&tree, local);
    let decision = decide(lookup.as_ref(), local);
    splice::apply(&tex_math.tex_string, &decision, marker, filler)
}
