//! Parser service for math snippets
//!
//! [`MathParser`] is the seam the renderer parses through. The production
//! implementation, [`MitexMathParser`], runs `mitex-parser` and lowers its
//! lossless `rowan` tree into the renderer's [`SyntaxTree`]:
//! - trivia (whitespace, comments) and delimiter tokens produce no nodes
//! - every node carries a trimmed 1-based span, measured in the snippet text
//! - a script's base is lowered next to the script, which starts at `^`/`_`
//! - words are split into one leaf per character when
//!   [`ParseOptions::math_character_location`] is set

use std::sync::Arc;

use async_trait::async_trait;
use mitex_parser::syntax::{
    CmdItem, EnvItem, FormulaItem, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken,
};
use mitex_spec::CommandSpec;
use mitex_spec_gen::DEFAULT_SPEC;
use phf::phf_set;
use rowan::ast::AstNode;

use super::position::{Location, SourcePos};
use super::tree::{Delimiter, MathNode, NodeKind, SyntaxTree};
use crate::utils::error::{AssistError, AssistResult};

/// Commands whose argument is typeset as prose inside math
static TEXT_MODE_COMMANDS: phf::Set<&'static str> = phf_set! {
    "text",
    "mbox",
    "textrm",
    "textit",
    "textbf",
    "textsf",
    "texttt",
    "textnormal",
    "textup",
    "textmd",
    "textsl",
    "intertext",
    "shortintertext",
};

/// Options for a single parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Give every math character its own node and span
    pub math_character_location: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            math_character_location: true,
        }
    }
}

/// Parser service. `Ok(None)` means the parser produced nothing usable.
#[async_trait]
pub trait MathParser: Send + Sync {
    async fn parse(&self, text: &str, options: ParseOptions) -> AssistResult<Option<SyntaxTree>>;
}

/// [`MathParser`] backed by `mitex-parser`
#[derive(Clone)]
pub struct MitexMathParser {
    spec: CommandSpec,
    extra_text_commands: Arc<Vec<String>>,
}

impl Default for MitexMathParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MitexMathParser {
    /// Parser using the default mitex command specification
    pub fn new() -> Self {
        Self::with_spec((*DEFAULT_SPEC).clone())
    }

    pub fn with_spec(spec: CommandSpec) -> Self {
        Self {
            spec,
            extra_text_commands: Arc::new(Vec::new()),
        }
    }

    /// Treat these command names (without backslash) as text-mode as well
    pub fn with_text_commands<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extra: Vec<String> = names
            .into_iter()
            .map(|n| n.into().trim_start_matches('\\').to_string())
            .collect();
        self.extra_text_commands = Arc::new(extra);
        self
    }

    pub fn is_text_command(&self, name: &str) -> bool {
        TEXT_MODE_COMMANDS.contains(name) || self.extra_text_commands.iter().any(|n| n == name)
    }

    /// Parse synchronously on the calling thread
    pub fn parse_blocking(&self, text: &str, options: ParseOptions) -> SyntaxTree {
        let root = mitex_parser::parse(text, self.spec.clone());
        let lowering = Lowering {
            index: LineIndex::new(text),
            source: SourceMap::new(&root, text),
            options,
            parser: self,
        };
        SyntaxTree::new(lowering.lower_children(&root))
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn run_parse(&self, text: String, options: ParseOptions) -> AssistResult<SyntaxTree> {
        let parser = self.clone();
        tokio::task::spawn_blocking(move || parser.parse_blocking(&text, options))
            .await
            .map_err(|e| AssistError::internal(format!("parse task failed: {}", e)))
    }

    #[cfg(target_arch = "wasm32")]
    async fn run_parse(&self, text: String, options: ParseOptions) -> AssistResult<SyntaxTree> {
        Ok(self.parse_blocking(&text, options))
    }
}

#[async_trait]
impl MathParser for MitexMathParser {
    async fn parse(&self, text: &str, options: ParseOptions) -> AssistResult<Option<SyntaxTree>> {
        let tree = self.run_parse(text.to_owned(), options).await?;
        tracing::trace!(nodes = tree.node_count(), "lowered mitex tree");
        Ok(Some(tree))
    }
}

/// Byte offset to 1-based line/column (columns count chars)
struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    fn pos(&self, offset: usize) -> SourcePos {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&s| s <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(0, |s| s.chars().count());
        SourcePos::new(line + 1, column + 1)
    }

    fn location(&self, start: usize, end: usize) -> Location {
        Location::new(self.pos(start), self.pos(end))
    }
}

fn is_trivia(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::TokenWhiteSpace | SyntaxKind::TokenLineBreak | SyntaxKind::TokenComment
    )
}

/// Snippet-text offsets of the tokens in a mitex tree.
///
/// mitex drops some trivia, such as the whitespace between a command and its
/// argument, so rowan offsets drift from offsets into the snippet. Each token
/// is matched forward through the text to recover its real start.
struct SourceMap {
    /// `(rowan offset, text offset)` of each token start, ascending
    starts: Vec<(usize, usize)>,
}

impl SourceMap {
    fn new(root: &SyntaxNode, text: &str) -> Self {
        let mut starts = Vec::new();
        let mut cursor = 0;
        for elem in root.descendants_with_tokens() {
            let SyntaxElement::Token(tok) = elem else {
                continue;
            };
            let found = text.get(cursor..).and_then(|rest| rest.find(tok.text()));
            let start = match found {
                Some(skip) => {
                    let start = cursor + skip;
                    cursor = start + tok.text().len();
                    start
                }
                None => cursor,
            };
            starts.push((usize::from(tok.text_range().start()), start));
        }
        Self { starts }
    }

    fn offset(&self, rowan: usize) -> usize {
        match self.starts.partition_point(|&(r, _)| r <= rowan) {
            0 => rowan,
            i => {
                let (r, start) = self.starts[i - 1];
                start + (rowan - r)
            }
        }
    }

    /// Text byte range of `tok`
    fn token_range(&self, tok: &SyntaxToken) -> (usize, usize) {
        let start = self.offset(usize::from(tok.text_range().start()));
        (start, start + tok.text().len())
    }
}

/// First and last non-trivia tokens below `node`
fn boundary_tokens(node: &SyntaxNode) -> Option<(SyntaxToken, SyntaxToken)> {
    let mut tokens = node.descendants_with_tokens().filter_map(|e| match e {
        SyntaxElement::Token(t) if !is_trivia(t.kind()) => Some(t),
        _ => None,
    });
    let first = tokens.next()?;
    let last = tokens.last().unwrap_or_else(|| first.clone());
    Some((first, last))
}

fn is_script_operator(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::TokenCaret | SyntaxKind::TokenUnderscore)
}

fn command_name(raw: &str) -> String {
    raw.strip_prefix('\\').unwrap_or(raw).to_string()
}

struct Lowering<'a> {
    index: LineIndex<'a>,
    source: SourceMap,
    options: ParseOptions,
    parser: &'a MitexMathParser,
}

impl Lowering<'_> {
    fn location_of(&self, node: &SyntaxNode) -> Location {
        match boundary_tokens(node) {
            Some((first, last)) => self.span(&first, &last),
            None => {
                let at = self.source.offset(usize::from(node.text_range().start()));
                self.index.location(at, at)
            }
        }
    }

    /// From the start of `first` to the end of `last`
    fn span(&self, first: &SyntaxToken, last: &SyntaxToken) -> Location {
        let (start, _) = self.source.token_range(first);
        let (_, end) = self.source.token_range(last);
        self.index.location(start, end.max(start))
    }

    fn lower_children(&self, node: &SyntaxNode) -> Vec<MathNode> {
        let mut out = Vec::new();
        for child in node.children_with_tokens() {
            self.lower_element(child, &mut out);
        }
        absorb_text_arguments(&mut out);
        out
    }

    fn lower_element(&self, elem: SyntaxElement, out: &mut Vec<MathNode>) {
        use SyntaxKind::*;

        let node = match elem {
            SyntaxElement::Token(tok) => {
                let (start, _) = self.source.token_range(&tok);
                self.lower_token(tok.kind(), tok.text(), start, out);
                return;
            }
            SyntaxElement::Node(n) => n,
        };

        match node.kind() {
            ItemCmd => out.push(self.lower_command(&node)),
            ItemAttachComponent => self.lower_attachment(&node, out),
            ItemCurly => out.push(self.lower_group(&node, Delimiter::Brace)),
            ItemBracket => out.push(self.lower_group(&node, Delimiter::Bracket)),
            ItemParen => out.push(self.lower_group(&node, Delimiter::Paren)),
            ItemLR => out.push(self.lower_group(&node, Delimiter::LeftRight)),
            ItemFormula => {
                let display = FormulaItem::cast(node.clone()).map_or(false, |f| !f.is_inline());
                out.push(MathNode::new(
                    NodeKind::Formula { display },
                    Some(self.location_of(&node)),
                    self.lower_children(&node),
                ));
            }
            ItemEnv => {
                let name = EnvItem::cast(node.clone())
                    .and_then(|env| env.name_tok())
                    .map(|tok| tok.text().to_string())
                    .unwrap_or_default();
                out.push(MathNode::new(
                    NodeKind::Environment { name },
                    Some(self.location_of(&node)),
                    self.lower_children(&node),
                ));
            }
            ItemBegin => out.push(MathNode::command("begin", self.location_of(&node), Vec::new())),
            ItemEnd => out.push(MathNode::command("end", self.location_of(&node), Vec::new())),
            ItemNewLine => out.push(MathNode::new(
                NodeKind::Separator,
                Some(self.location_of(&node)),
                Vec::new(),
            )),
            ItemBlockComment | ClauseLR | ClauseCommandName => {}
            // ClauseArgument, ItemText, ScopeRoot and anything newer: transparent
            _ => out.extend(self.lower_children(&node)),
        }
    }

    fn lower_token(&self, kind: SyntaxKind, text: &str, start: usize, out: &mut Vec<MathNode>) {
        use SyntaxKind::*;

        match kind {
            TokenWhiteSpace | TokenLineBreak | TokenComment | TokenLBrace | TokenRBrace
            | TokenLBracket | TokenRBracket | TokenLParen | TokenRParen | TokenDollar
            | TokenBeginMath | TokenEndMath | TokenCaret | TokenUnderscore | TokenError => {}
            TokenAmpersand => out.push(MathNode::new(
                NodeKind::Separator,
                Some(self.index.location(start, start + text.len())),
                Vec::new(),
            )),
            TokenCommandSym => {
                let location = self.index.location(start, start + text.len());
                let name = command_name(text);
                if name == "\\" {
                    out.push(MathNode::new(NodeKind::Separator, Some(location), Vec::new()));
                } else {
                    out.push(MathNode::command(name, location, Vec::new()));
                }
            }
            _ => self.lower_word(text, start, out),
        }
    }

    fn lower_word(&self, text: &str, start: usize, out: &mut Vec<MathNode>) {
        if !self.options.math_character_location {
            out.push(MathNode::leaf(
                text,
                self.index.location(start, start + text.len()),
            ));
            return;
        }
        for (i, ch) in text.char_indices() {
            let begin = start + i;
            out.push(MathNode::leaf(
                ch.to_string(),
                self.index.location(begin, begin + ch.len_utf8()),
            ));
        }
    }

    fn lower_command(&self, node: &SyntaxNode) -> MathNode {
        let name = CmdItem::cast(node.clone())
            .and_then(|cmd| cmd.name_tok())
            .map(|tok| command_name(tok.text()))
            .unwrap_or_default();
        let location = self.location_of(node);

        if name == "\\" {
            return MathNode::new(NodeKind::Separator, Some(location), Vec::new());
        }

        let mut args = Vec::new();
        for child in node.children() {
            if child.kind() == SyntaxKind::ClauseArgument {
                args.extend(self.lower_children(&child));
            }
        }

        if self.parser.is_text_command(&name) {
            MathNode::text_command(name, location, args)
        } else {
            MathNode::command(name, location, args)
        }
    }

    /// The base (a `ClauseArgument` inside the attachment) becomes siblings
    /// of the script node, whose span starts at the `^`/`_`.
    fn lower_attachment(&self, node: &SyntaxNode, out: &mut Vec<MathNode>) {
        let mut operator = None;
        let mut script = Vec::new();
        for child in node.children_with_tokens() {
            match child {
                SyntaxElement::Node(n) if n.kind() == SyntaxKind::ClauseArgument => {
                    out.extend(self.lower_children(&n));
                }
                SyntaxElement::Token(tok) if operator.is_none() && is_script_operator(tok.kind()) => {
                    operator = Some(tok);
                }
                other => self.lower_element(other, &mut script),
            }
        }
        absorb_text_arguments(&mut script);

        // A prime has no script operator; its pieces stay inline.
        let Some(operator) = operator else {
            out.extend(script);
            return;
        };
        let kind = if operator.kind() == SyntaxKind::TokenUnderscore {
            NodeKind::Subscript
        } else {
            NodeKind::Superscript
        };
        let last = boundary_tokens(node).map_or_else(|| operator.clone(), |(_, last)| last);
        out.push(MathNode::new(
            kind,
            Some(self.span(&operator, &last)),
            script,
        ));
    }

    fn lower_group(&self, node: &SyntaxNode, delimiter: Delimiter) -> MathNode {
        MathNode::group(delimiter, self.location_of(node), self.lower_children(node))
    }
}

/// A text-mode command missing from the mitex command table parses without
/// arguments; it takes the brace group right after it.
fn absorb_text_arguments(nodes: &mut Vec<MathNode>) {
    let mut i = 0;
    while i + 1 < nodes.len() {
        let takes_next = nodes[i].kind.is_text_command()
            && nodes[i].content.is_empty()
            && nodes[i + 1].kind == NodeKind::Group(Delimiter::Brace);
        if takes_next {
            let arg = nodes.remove(i + 1);
            let cmd = &mut nodes[i];
            if let (Some(loc), Some(arg_loc)) = (cmd.location.as_mut(), arg.location) {
                loc.end = arg_loc.end;
            }
            cmd.content.push(arg);
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(nodes: &'a [MathNode], pred: &dyn Fn(&MathNode) -> bool) -> Option<&'a MathNode> {
        for node in nodes {
            if pred(node) {
                return Some(node);
            }
            if let Some(found) = find(&node.content, pred) {
                return Some(found);
            }
        }
        None
    }

    fn leaf(text: &str) -> impl Fn(&MathNode) -> bool + '_ {
        move |n: &MathNode| matches!(&n.kind, NodeKind::Leaf { text: t } if t == text)
    }

    #[test]
    fn test_line_index_columns_count_chars() {
        let index = LineIndex::new("ab\nαβc");
        assert_eq!(index.pos(0), SourcePos::new(1, 1));
        assert_eq!(index.pos(2), SourcePos::new(1, 3));
        assert_eq!(index.pos(3), SourcePos::new(2, 1));
        // 'c' starts after two 2-byte chars
        assert_eq!(index.pos(7), SourcePos::new(2, 3));
    }

    #[test]
    fn test_character_leaves_have_single_column_spans() {
        let parser = MitexMathParser::new();
        let tree = parser.parse_blocking("x^{2}", ParseOptions::default());
        let two = find(&tree.content, &leaf("2")).expect("leaf for 2");
        assert_eq!(two.location, Some(Location::on_line(1, 4, 5)));
        assert!(find(&tree.content, &|n| n.kind == NodeKind::Superscript).is_some());
    }

    #[test]
    fn test_spans_survive_dropped_whitespace() {
        let parser = MitexMathParser::new();
        let tree = parser.parse_blocking("\\hat x", ParseOptions::default());
        let x = find(&tree.content, &leaf("x")).expect("leaf for x");
        assert_eq!(x.location, Some(Location::on_line(1, 6, 7)));

        let tree = parser.parse_blocking("\\frac 1 2 + y^{2}", ParseOptions::default());
        let plus = find(&tree.content, &leaf("+")).expect("leaf for +");
        assert_eq!(plus.location, Some(Location::on_line(1, 11, 12)));
        let script = find(&tree.content, &|n| n.kind == NodeKind::Superscript).expect("superscript");
        assert_eq!(script.location, Some(Location::on_line(1, 14, 18)));
    }

    #[test]
    fn test_script_base_is_a_sibling() {
        let parser = MitexMathParser::new();
        let tree = parser.parse_blocking("ab ^{2}", ParseOptions::default());
        let script = find(&tree.content, &|n| n.kind == NodeKind::Superscript).expect("superscript");
        assert_eq!(script.location, Some(Location::on_line(1, 4, 8)));
        assert!(find(&script.content, &leaf("a")).is_none());
        assert!(find(&script.content, &leaf("b")).is_none());
        assert!(find(&script.content, &leaf("2")).is_some());

        let tree = parser.parse_blocking("x_1", ParseOptions::default());
        let script = find(&tree.content, &|n| n.kind == NodeKind::Subscript).expect("subscript");
        assert_eq!(script.location, Some(Location::on_line(1, 2, 4)));
        assert!(find(&script.content, &leaf("x")).is_none());
    }

    #[test]
    fn test_text_command_wraps_its_argument() {
        let parser = MitexMathParser::new();
        let tree = parser.parse_blocking("\\text{hi}", ParseOptions::default());
        let text_cmd = find(&tree.content, &|n| n.kind.is_text_command()).expect("text command");
        assert!(find(&text_cmd.content, &leaf("h")).is_some());
    }

    #[test]
    fn test_configured_text_command() {
        let parser = MitexMathParser::new().with_text_commands(["\\mytext"]);
        assert!(parser.is_text_command("mytext"));
        assert!(parser.is_text_command("mbox"));
        assert!(!parser.is_text_command("frac"));
    }

    #[test]
    fn test_absorb_text_arguments() {
        let mut nodes = vec![
            MathNode::text_command("mbox", Location::on_line(1, 1, 6), Vec::new()),
            MathNode::group(
                Delimiter::Brace,
                Location::on_line(1, 6, 10),
                vec![MathNode::leaf("a", Location::on_line(1, 7, 8))],
            ),
            MathNode::leaf("x", Location::on_line(1, 10, 11)),
        ];
        absorb_text_arguments(&mut nodes);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].location, Some(Location::on_line(1, 1, 10)));
        assert_eq!(nodes[0].content.len(), 1);
    }
}
