//! Diagnostic printers for Move sources.
//!
//! Two independent printers live here: a structural dump of tree-sitter
//! syntax trees ([`syntax`]) and a tree-drawn listing of resolved scopes
//! ([`scope_printer`]). Scope trees come from a [`resolver::ScopeResolver`].

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod scope;
pub mod scope_printer;
pub mod span;
pub mod syntax;
pub mod telemetry;

pub use error::{InspectError, InspectResult};
pub use scope::{Binding, Member, ScopeNode, TypeDescriptor};
pub use scope_printer::{ScopePrinter, render_scope};
pub use syntax::{SourceNode, SyntaxNode, SyntaxOptions, render_syntax_tree};

use resolver::{MoveScopeResolver, ScopeResolver};

/// Dump the syntax tree of Move `source`, rejecting malformed input.
pub fn dump_source(source: &str, options: SyntaxOptions) -> InspectResult<Vec<String>> {
    let tree = parser::parse_well_formed(source)?;
    Ok(render_syntax_tree(SourceNode::new(tree.root_node(), source), options).collect())
}

/// Resolve Move `source` and render its scope tree from depth 0.
pub fn scope_source(source: &str) -> InspectResult<Vec<String>> {
    let scope = MoveScopeResolver::new().resolve(source)?;
    Ok(render_scope(Some(&scope), 0))
}
