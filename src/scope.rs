//! Resolved scope tree handed to the scope printer.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lexical scope: bindings in declaration order plus nested scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub children: Vec<ScopeNode>,
}

impl ScopeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn with_child(mut self, child: ScopeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Bindings of this scope and every descendant.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
            + self
                .children
                .iter()
                .map(ScopeNode::binding_count)
                .sum::<usize>()
    }
}

/// A name bound to a resolved entity. `ty` is `None` when the resolver could
/// not determine a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeDescriptor>,
}

impl Binding {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
        }
    }
}

/// Named member of a struct, interface or method set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Function {
        #[serde(default)]
        params: Vec<TypeDescriptor>,
        #[serde(default)]
        results: Vec<TypeDescriptor>,
    },
    Struct {
        #[serde(default)]
        fields: Vec<Member>,
    },
    Interface {
        #[serde(default)]
        methods: Vec<Member>,
    },
    Named {
        name: String,
        underlying: Box<TypeDescriptor>,
        #[serde(default)]
        methods: Vec<Member>,
    },
    Array {
        elem: Box<TypeDescriptor>,
        len: u64,
    },
    Slice {
        elem: Box<TypeDescriptor>,
    },
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    Basic {
        name: String,
    },
    Other {
        display: String,
    },
}

impl TypeDescriptor {
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic { name: name.into() }
    }

    pub fn other(display: impl Into<String>) -> Self {
        Self::Other {
            display: display.into(),
        }
    }

    pub fn function(params: Vec<TypeDescriptor>, results: Vec<TypeDescriptor>) -> Self {
        Self::Function { params, results }
    }

    pub fn slice(elem: TypeDescriptor) -> Self {
        Self::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn array(elem: TypeDescriptor, len: u64) -> Self {
        Self::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn named(name: impl Into<String>, underlying: TypeDescriptor) -> Self {
        Self::Named {
            name: name.into(),
            underlying: Box::new(underlying),
            methods: Vec::new(),
        }
    }

    /// One-line description used on a binding's own line.
    pub fn summary(&self) -> String {
        match self {
            Self::Function { .. } => self.to_string(),
            Self::Struct { fields } => format!("struct with {} field(s)", fields.len()),
            Self::Interface { methods } => format!("interface with {} method(s)", methods.len()),
            Self::Named {
                name, underlying, ..
            } => format!("{name} ({})", underlying.summary()),
            Self::Array { elem, len } => format!("array of {elem} with length {len}"),
            Self::Slice { elem } => format!("slice of {elem}"),
            Self::Map { key, value } => {
                format!("map with key type {key} and value type {value}")
            }
            Self::Basic { name } => name.clone(),
            Self::Other { display } => display.clone(),
        }
    }

    /// Lines nested under the binding line, in declaration order.
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::Function { params, results } => vec![
                format!("params: [{}]", params.iter().join(", ")),
                format!("returns: [{}]", results.iter().join(", ")),
            ],
            Self::Struct { fields } => member_lines(fields),
            Self::Interface { methods } => member_lines(methods),
            Self::Named {
                underlying,
                methods,
                ..
            } => {
                let mut lines = match underlying.as_ref() {
                    Self::Struct { fields } => member_lines(fields),
                    Self::Interface { methods } => member_lines(methods),
                    _ => Vec::new(),
                };
                lines.extend(
                    methods
                        .iter()
                        .map(|m| format!("method {}: {}", m.name, m.ty)),
                );
                lines
            }
            Self::Array { .. }
            | Self::Slice { .. }
            | Self::Map { .. }
            | Self::Basic { .. }
            | Self::Other { .. } => Vec::new(),
        }
    }
}

fn member_lines(members: &[Member]) -> Vec<String> {
    members
        .iter()
        .map(|m| format!("{}: {}", m.name, m.ty))
        .collect()
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Compact type notation used wherever a type is referenced.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function { params, results } => {
                write!(f, "fun({})", params.iter().join(", "))?;
                match results.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, ": {single}"),
                    many => write!(f, ": ({})", many.iter().join(", ")),
                }
            }
            Self::Struct { fields } if fields.is_empty() => f.write_str("struct {}"),
            Self::Struct { fields } => write!(f, "struct {{ {} }}", fields.iter().join(", ")),
            Self::Interface { methods } if methods.is_empty() => f.write_str("interface {}"),
            Self::Interface { methods } => {
                write!(f, "interface {{ {} }}", methods.iter().join(", "))
            }
            Self::Named { name, .. } => f.write_str(name),
            Self::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            Self::Slice { elem } => write!(f, "[{elem}]"),
            Self::Map { key, value } => write!(f, "map<{key}, {value}>"),
            Self::Basic { name } => f.write_str(name),
            Self::Other { display } => f.write_str(display),
        }
    }
}
