use super::ScopeResolver;
use crate::error::{InspectError, InspectResult};
use crate::scope::ScopeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Json,
    Toml,
}

/// Loads a scope tree serialized by an external semantic tool.
#[derive(Debug, Clone, Copy)]
pub struct ScopeDump {
    format: DumpFormat,
}

impl ScopeDump {
    pub fn new(format: DumpFormat) -> Self {
        Self { format }
    }
}

impl ScopeResolver for ScopeDump {
    fn resolve(&self, source: &str) -> InspectResult<ScopeNode> {
        match self.format {
            DumpFormat::Json => {
                serde_json::from_str(source).map_err(|e| InspectError::dump(e.to_string()))
            }
            DumpFormat::Toml => toml::from_str(source).map_err(|e| InspectError::dump(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Binding, Member, TypeDescriptor};

    #[test]
    fn json_dump_with_all_variant_shapes() {
        let src = r#"{
            "label": "package main",
            "bindings": [
                {"name": "Nums", "type": {"kind": "array", "elem": {"kind": "basic", "name": "int"}, "len": 5}},
                {"name": "Stringer", "type": {"kind": "named", "name": "Stringer", "underlying": {
                    "kind": "interface",
                    "methods": [{"name": "String", "type": {"kind": "function", "results": [{"kind": "basic", "name": "string"}]}}]
                }}},
                {"name": "x"}
            ],
            "children": [{"bindings": [{"name": "n", "type": {"kind": "other", "display": "untyped nil"}}]}]
        }"#;

        let scope = ScopeDump::new(DumpFormat::Json).resolve(src).unwrap();
        assert_eq!(scope.bindings.len(), 3);
        assert_eq!(
            scope.bindings[0].ty,
            Some(TypeDescriptor::array(TypeDescriptor::basic("int"), 5))
        );
        assert_eq!(
            scope.bindings[1].ty,
            Some(TypeDescriptor::named(
                "Stringer",
                TypeDescriptor::Interface {
                    methods: vec![Member::new(
                        "String",
                        TypeDescriptor::function(vec![], vec![TypeDescriptor::basic("string")]),
                    )],
                },
            ))
        );
        assert_eq!(scope.bindings[2], Binding::unresolved("x"));
        assert_eq!(scope.children.len(), 1);
    }

    #[test]
    fn toml_dump_with_nested_tables() {
        let src = r#"
label = "package main"

[[bindings]]
name = "ids"
type = { kind = "map", key = { kind = "basic", name = "string" }, value = { kind = "basic", name = "int" } }

[[children]]
label = "function main"

[[children.bindings]]
name = "v"
type = { kind = "slice", elem = { kind = "basic", name = "byte" } }
"#;

        let scope = ScopeDump::new(DumpFormat::Toml).resolve(src).unwrap();
        assert_eq!(
            scope.bindings[0].ty,
            Some(TypeDescriptor::map(
                TypeDescriptor::basic("string"),
                TypeDescriptor::basic("int")
            ))
        );
        assert_eq!(scope.children[0].label.as_deref(), Some("function main"));
        assert_eq!(
            scope.children[0].bindings[0].ty,
            Some(TypeDescriptor::slice(TypeDescriptor::basic("byte")))
        );
    }

    #[test]
    fn malformed_dump_is_reported() {
        let err = ScopeDump::new(DumpFormat::Json)
            .resolve(r#"{"bindings": [{"name": "x", "type": {"kind": "tuple"}}]}"#)
            .unwrap_err();
        assert!(matches!(err, InspectError::Dump(_)));
    }
}
