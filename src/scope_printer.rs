use std::io::{self, Write};

use crate::scope::{Binding, ScopeNode};

pub const INDENT_UNIT: &str = "│   ";
pub const BRANCH: &str = "├── ";
pub const LAST_BRANCH: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK: &str = "    ";

/// Placeholder shown for a binding whose type could not be resolved.
pub const UNRESOLVED: &str = "nil";

type BindingFilter = Box<dyn Fn(&Binding) -> bool + Send + Sync>;

/// Renders a scope tree as indented, tree-drawn lines.
///
/// Bindings are printed in the order the resolver supplied them and a scope's
/// own bindings always come before any of its child scopes.
#[derive(Default)]
pub struct ScopePrinter {
    filter: Option<BindingFilter>,
}

impl ScopePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only bindings for which `keep` returns true are printed, at every depth.
    pub fn with_filter(mut self, keep: impl Fn(&Binding) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(keep));
        self
    }

    /// Hide bindings by exact name.
    pub fn skipping<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return self;
        }
        self.with_filter(move |b| !names.iter().any(|n| *n == b.name))
    }

    pub fn render(&self, scope: Option<&ScopeNode>, depth: usize) -> Vec<String> {
        let mut out = Vec::new();
        self.render_into(scope, depth, &mut out);
        out
    }

    pub fn write_to(
        &self,
        scope: Option<&ScopeNode>,
        depth: usize,
        out: &mut impl Write,
    ) -> io::Result<()> {
        for line in self.render(scope, depth) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn keep(&self, binding: &Binding) -> bool {
        self.filter.as_ref().is_none_or(|keep| keep(binding))
    }

    fn render_into(&self, scope: Option<&ScopeNode>, depth: usize, out: &mut Vec<String>) {
        let Some(scope) = scope else {
            return;
        };

        let indent = INDENT_UNIT.repeat(depth);
        out.push(format!("{indent}{}", header(scope, depth)));

        let visible: Vec<&Binding> = scope.bindings.iter().filter(|b| self.keep(b)).collect();
        for (i, binding) in visible.iter().enumerate() {
            let last = i + 1 == visible.len();
            let (branch, continuation) = if last {
                (LAST_BRANCH, BLANK)
            } else {
                (BRANCH, CONTINUATION)
            };

            let summary = binding
                .ty
                .as_ref()
                .map_or_else(|| UNRESOLVED.to_string(), |ty| ty.summary());
            out.push(format!("{indent}{branch}{}: {summary}", binding.name));

            let details = binding.ty.as_ref().map(|ty| ty.details()).unwrap_or_default();
            for (j, detail) in details.iter().enumerate() {
                let detail_branch = if j + 1 == details.len() {
                    LAST_BRANCH
                } else {
                    BRANCH
                };
                out.push(format!("{indent}{continuation}{detail_branch}{detail}"));
            }
        }

        for child in &scope.children {
            self.render_into(Some(child), depth + 1, out);
        }
    }
}

fn header(scope: &ScopeNode, depth: usize) -> String {
    let title = if depth == 0 {
        "Global Scope".to_string()
    } else {
        format!("Scope (level {depth})")
    };
    match &scope.label {
        Some(label) => format!("{title}: {label}"),
        None => title,
    }
}

/// Render with no filtering.
pub fn render_scope(scope: Option<&ScopeNode>, depth: usize) -> Vec<String> {
    ScopePrinter::new().render(scope, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Member, TypeDescriptor};

    fn int() -> TypeDescriptor {
        TypeDescriptor::basic("int")
    }

    fn point_and_add() -> ScopeNode {
        let point = TypeDescriptor::Struct {
            fields: vec![Member::new("X", int()), Member::new("Y", int())],
        };
        let add = TypeDescriptor::function(vec![int(), int()], vec![int()]);

        ScopeNode::new()
            .with_binding(Binding::new("Point", point))
            .with_child(ScopeNode::new().with_binding(Binding::new("Add", add)))
    }

    #[test]
    fn renders_struct_and_nested_function_scope() {
        let lines = render_scope(Some(&point_and_add()), 0);
        assert_eq!(
            lines,
            vec![
                "Global Scope",
                "└── Point: struct with 2 field(s)",
                "    ├── X: int",
                "    └── Y: int",
                "│   Scope (level 1)",
                "│   └── Add: fun(int, int): int",
                "│       ├── params: [int, int]",
                "│       └── returns: [int]",
            ]
        );
    }

    #[test]
    fn absent_scope_renders_nothing() {
        for depth in [0, 1, 7] {
            assert!(render_scope(None, depth).is_empty());
        }
    }

    #[test]
    fn unresolved_binding_renders_nil() {
        let scope = ScopeNode::new().with_binding(Binding::unresolved("x"));
        assert_eq!(render_scope(Some(&scope), 0), vec!["Global Scope", "└── x: nil"]);
    }

    #[test]
    fn starting_depth_indents_header() {
        let scope = ScopeNode::labeled("fun f").with_binding(Binding::new("n", int()));
        assert_eq!(
            render_scope(Some(&scope), 2),
            vec!["│   │   Scope (level 2): fun f", "│   │   └── n: int"]
        );
    }

    #[test]
    fn filter_hides_bindings_at_every_depth() {
        let scope = ScopeNode::labeled("package main")
            .with_binding(Binding::new("fmt", TypeDescriptor::other("package fmt")))
            .with_binding(Binding::new("main", TypeDescriptor::function(vec![], vec![])))
            .with_child(
                ScopeNode::new()
                    .with_binding(Binding::new("fmt", TypeDescriptor::other("package fmt"))),
            );

        let lines = ScopePrinter::new().skipping(["fmt"]).render(Some(&scope), 0);
        assert_eq!(
            lines,
            vec![
                "Global Scope: package main",
                "└── main: fun()",
                "    ├── params: []",
                "    └── returns: []",
                "│   Scope (level 1)",
            ]
        );
    }

    #[test]
    fn middle_binding_details_use_continuation_bar() {
        let scope = ScopeNode::new()
            .with_binding(Binding::new(
                "P",
                TypeDescriptor::Struct {
                    fields: vec![Member::new("a", int())],
                },
            ))
            .with_binding(Binding::new("n", int()));
        assert_eq!(
            render_scope(Some(&scope), 0),
            vec![
                "Global Scope",
                "├── P: struct with 1 field(s)",
                "│   └── a: int",
                "└── n: int",
            ]
        );
    }

    #[test]
    fn write_to_matches_render() {
        let tree = point_and_add();
        let mut out = Vec::new();
        ScopePrinter::new().write_to(Some(&tree), 0, &mut out).unwrap();
        let expected = render_scope(Some(&tree), 0).join("\n") + "\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
