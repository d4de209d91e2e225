//! Structural dump of a parsed syntax tree.
//!
//! The printer works against the [`SyntaxNode`] trait so any frontend can
//! feed it; [`SourceNode`] adapts tree-sitter nodes.

use std::io::{self, Write};
use tree_sitter::Node;

use crate::span::Span;

/// Read-only view of a node produced by an external parser.
pub trait SyntaxNode: Sized {
    fn kind(&self) -> &str;

    fn span(&self) -> Span;

    /// Source text covered by the node, when the frontend keeps it.
    fn text(&self) -> Option<&str> {
        None
    }

    /// Anonymous nodes are punctuation and keywords.
    fn is_named(&self) -> bool {
        true
    }

    /// Children in source order.
    fn children(&self) -> Vec<Self>;
}

/// A tree-sitter node paired with the source it was parsed from.
#[derive(Debug, Clone, Copy)]
pub struct SourceNode<'a> {
    node: Node<'a>,
    source: &'a str,
}

impl<'a> SourceNode<'a> {
    pub fn new(node: Node<'a>, source: &'a str) -> Self {
        Self { node, source }
    }
}

impl SyntaxNode for SourceNode<'_> {
    fn kind(&self) -> &str {
        self.node.kind()
    }

    fn span(&self) -> Span {
        Span::from_range(self.node.range())
    }

    fn text(&self) -> Option<&str> {
        // Byte offsets that do not land on char boundaries yield no preview.
        self.source.get(self.node.byte_range())
    }

    fn is_named(&self) -> bool {
        self.node.is_named()
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|child| SourceNode::new(child, self.source))
            .collect()
    }
}

pub const DEFAULT_MAX_TEXT_LEN: usize = 50;

const INDENT_UNIT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxOptions {
    pub show_text: bool,
    pub max_text_len: usize,
    pub named_only: bool,
}

impl Default for SyntaxOptions {
    fn default() -> Self {
        Self {
            show_text: true,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            named_only: false,
        }
    }
}

/// Lazy pre-order iterator over the dump lines of a syntax tree.
pub struct SyntaxLines<N: SyntaxNode> {
    stack: Vec<(N, usize)>,
    options: SyntaxOptions,
}

impl<N: SyntaxNode> Iterator for SyntaxLines<N> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let (node, depth) = self.stack.pop()?;
        let line = format_node(&node, depth, &self.options);

        let children = node.children();
        for child in children.into_iter().rev() {
            if self.options.named_only && !child.is_named() {
                continue;
            }
            self.stack.push((child, depth + 1));
        }

        Some(line)
    }
}

/// Dump lines for `root` and all of its descendants.
pub fn render_syntax_tree<N: SyntaxNode>(root: N, options: SyntaxOptions) -> SyntaxLines<N> {
    SyntaxLines {
        stack: vec![(root, 0)],
        options,
    }
}

pub fn write_syntax_tree<N: SyntaxNode>(
    root: N,
    options: SyntaxOptions,
    out: &mut impl Write,
) -> io::Result<()> {
    for line in render_syntax_tree(root, options) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn format_node<N: SyntaxNode>(node: &N, depth: usize, options: &SyntaxOptions) -> String {
    let indent = INDENT_UNIT.repeat(depth);
    let mut line = format!("{indent}{} [{}]", node.kind(), node.span());

    if options.show_text
        && let Some(text) = node.text()
    {
        line.push_str(&format!("  \"{}\"", preview(text, options.max_text_len)));
    }

    line
}

/// Truncate to `max` characters and escape newlines.
fn preview(text: &str, max: usize) -> String {
    let shown: String = text.chars().take(max).collect();
    let mut escaped = shown.escape_debug().to_string();
    if text.chars().nth(max).is_some() {
        escaped.push_str("...");
    }
    escaped
}
