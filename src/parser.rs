use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{InspectError, InspectResult};
use crate::span::Span;

fn move_language() -> Language {
    tree_sitter_move::language()
}

/// Parse Move source into a tree-sitter tree.
///
/// tree-sitter recovers from malformed input, so a returned tree may still
/// contain ERROR or MISSING nodes. Use [`ensure_well_formed`] or
/// [`parse_well_formed`] when the caller needs a clean tree.
pub fn parse_source(source: &str) -> InspectResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(move_language())
        .map_err(|e| InspectError::parse(format!("failed to load Move grammar: {e}")))?;

    parser
        .parse(source, None)
        .ok_or_else(|| InspectError::parse("tree-sitter failed to parse source"))
}

/// Parse and reject any source the grammar could not fully accept.
pub fn parse_well_formed(source: &str) -> InspectResult<Tree> {
    let tree = parse_source(source)?;
    ensure_well_formed(&tree)?;
    Ok(tree)
}

pub fn ensure_well_formed(tree: &Tree) -> InspectResult<()> {
    match first_error_node(tree.root_node()) {
        Some(node) => Err(InspectError::Syntax {
            span: Span::from_range(node.range()),
        }),
        None => Ok(()),
    }
}

/// First ERROR or MISSING node in pre-order.
pub fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}
